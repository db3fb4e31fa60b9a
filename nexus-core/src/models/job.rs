use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkJobStatus {
    #[default]
    Queued,
    Running,
    Completed,
    Failed,
}

impl BulkJobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BulkJobStatus::Completed | BulkJobStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkJobError {
    pub index: usize,
    pub message: String,
}

/// Progress of a bulk invoice upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BulkJob {
    #[serde(rename = "_id")]
    pub id: String,
    pub seller_id: String,
    pub status: BulkJobStatus,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<BulkJobError>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_completed_and_failed_are_terminal() {
        assert!(!BulkJobStatus::Queued.is_terminal());
        assert!(!BulkJobStatus::Running.is_terminal());
        assert!(BulkJobStatus::Completed.is_terminal());
        assert!(BulkJobStatus::Failed.is_terminal());
    }
}
