use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    /// Any drawing failure. The message stays generic; the cause is kept as
    /// the error source for logging.
    #[error("Failed to generate PDF")]
    Render(#[source] anyhow::Error),

    #[error("QR encoding failed: {0}")]
    QrEncoding(String),
}

impl DocumentError {
    pub(crate) fn render(err: impl Into<anyhow::Error>) -> Self {
        DocumentError::Render(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_message_hides_cause() {
        let err = DocumentError::render(anyhow::anyhow!("font table corrupt"));
        assert_eq!(err.to_string(), "Failed to generate PDF");
        assert!(std::error::Error::source(&err).is_some());
    }
}
