//! Background processing of bulk invoice uploads.
//!
//! Jobs live only in memory; the client polls them by id until they reach a
//! terminal status.

use super::invoicing::create_invoice;
use super::store::Store;
use crate::dtos::invoices::CreateInvoiceRequest;
use chrono::Utc;
use dashmap::DashMap;
use nexus_core::error::AppError;
use nexus_core::models::{BulkJob, BulkJobError, BulkJobStatus};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Clone)]
pub struct BulkJobRegistry {
    jobs: Arc<DashMap<String, BulkJob>>,
    shutdown_token: CancellationToken,
}

impl Default for BulkJobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BulkJobRegistry {
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(DashMap::new()),
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Cancelling this token stops every running job after its current item.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    pub fn get(&self, seller_id: &str, job_id: &str) -> Option<BulkJob> {
        self.jobs
            .get(job_id)
            .filter(|job| job.seller_id == seller_id)
            .map(|job| job.clone())
    }

    /// Queue the upload and start processing it in the background.
    pub fn submit(
        &self,
        store: Store,
        seller_id: &str,
        requests: Vec<CreateInvoiceRequest>,
    ) -> BulkJob {
        let now = Utc::now();
        let job = BulkJob {
            id: Uuid::new_v4().to_string(),
            seller_id: seller_id.to_string(),
            status: BulkJobStatus::Queued,
            total: requests.len(),
            created_at: now,
            updated_at: now,
            ..Default::default()
        };
        self.jobs.insert(job.id.clone(), job.clone());

        tracing::info!(job_id = %job.id, total = job.total, "Bulk invoice job queued");

        let registry = self.clone();
        let job_id = job.id.clone();
        let seller_id = seller_id.to_string();
        tokio::spawn(async move {
            registry.process(store, seller_id, job_id, requests).await;
        });

        job
    }

    fn update<F>(&self, job_id: &str, change: F)
    where
        F: FnOnce(&mut BulkJob),
    {
        if let Some(mut job) = self.jobs.get_mut(job_id) {
            change(&mut job);
            job.updated_at = Utc::now();
        }
    }

    async fn process(
        &self,
        store: Store,
        seller_id: String,
        job_id: String,
        requests: Vec<CreateInvoiceRequest>,
    ) {
        let start = Instant::now();
        self.update(&job_id, |job| job.status = BulkJobStatus::Running);

        let total = requests.len();
        for (index, request) in requests.into_iter().enumerate() {
            // Cancellation only lands between items; an invoice in progress
            // is finished together with its FBR record.
            let result = if self.shutdown_token.is_cancelled() {
                None
            } else {
                Some(create_invoice(&store, &seller_id, request, "bulk").await)
            };

            match result {
                Some(Ok(_)) => self.update(&job_id, |job| job.succeeded += 1),
                Some(Err(e)) => {
                    tracing::warn!(job_id = %job_id, index, error = %e, "Bulk item failed");
                    let message = item_message(&e);
                    self.update(&job_id, |job| {
                        job.failed += 1;
                        job.errors.push(BulkJobError { index, message });
                    });
                }
                None => {
                    tracing::warn!(job_id = %job_id, remaining = total - index, "Bulk job cancelled");
                    self.update(&job_id, |job| {
                        for skipped in index..total {
                            job.failed += 1;
                            job.errors.push(BulkJobError {
                                index: skipped,
                                message: "cancelled".to_string(),
                            });
                        }
                    });
                    break;
                }
            }
        }

        self.update(&job_id, |job| {
            job.status = if job.succeeded == 0 && job.failed > 0 {
                BulkJobStatus::Failed
            } else {
                BulkJobStatus::Completed
            };
        });

        if let Some(job) = self.jobs.get(&job_id) {
            tracing::info!(
                job_id = %job_id,
                succeeded = job.succeeded,
                failed = job.failed,
                duration_ms = start.elapsed().as_millis() as u64,
                "Bulk invoice job finished"
            );
        }
    }
}

/// Client errors are reported as-is; server errors get a generic message.
fn item_message(err: &AppError) -> String {
    if err.status().is_server_error() {
        "Internal server error".to_string()
    } else {
        err.to_string()
    }
}
