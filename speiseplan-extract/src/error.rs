use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("{strategy} extraction failed: {reason}")]
    ExtractionFailed {
        strategy: &'static str,
        reason: String,
    },

    #[error("unrecognized format: {0}")]
    FormatMismatch(String),

    #[error("menu document unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON write error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to load PDF: {0}")]
    PdfLoad(#[from] lopdf::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("weekday {0} is on the weekend, no dishes to extract")]
    Weekend(u32),
}

impl ExtractError {
    pub(crate) fn failed(strategy: &'static str, reason: impl Into<String>) -> Self {
        Self::ExtractionFailed {
            strategy,
            reason: reason.into(),
        }
    }

    /// Whether the pipeline may recover by trying the next strategy.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ExtractionFailed { .. })
    }
}
