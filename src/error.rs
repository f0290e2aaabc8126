use std::time::Duration;
use thiserror::Error;

/// Errors surfaced at pipeline stage boundaries.
///
/// None of these poison the session: the controller keeps its cached state
/// and the next call starts clean.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid image: {0}")]
    Decode(String),

    #[error("background removal cancelled")]
    Cancelled,

    #[error("background removal took too long ({:.1}s). Try a smaller image.", .elapsed.as_secs_f64())]
    Timeout { elapsed: Duration },

    #[error("model failure: {0}")]
    Model(String),

    #[error("invalid output settings: {0}")]
    InvalidSettings(String),

    #[error("processing failed: {0}")]
    Processing(String),
}

impl PipelineError {
    /// Message for the user, or `None` when nothing should be shown.
    ///
    /// Cancellation is user-initiated and stays silent. Unexpected failures
    /// get a generic message; the detail belongs in the logs.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Cancelled => None,
            Self::Decode(_) => Some(
                "An error occurred while processing the image. Please ensure the image is valid and try again."
                    .to_string(),
            ),
            Self::Timeout { .. } | Self::Model(_) => Some(format!(
                "Error during processing. Try a smaller image or lower resolution. Error details: {self}"
            )),
            Self::InvalidSettings(_) => Some(self.to_string()),
            Self::Processing(_) => Some("An error occurred while processing the image.".to_string()),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<image::ImageError> for PipelineError {
    fn from(err: image::ImageError) -> Self {
        Self::Processing(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_silent() {
        assert!(PipelineError::Cancelled.user_message().is_none());
        assert!(PipelineError::Cancelled.is_cancelled());
    }

    #[test]
    fn timeout_suggests_smaller_image() {
        let err = PipelineError::Timeout {
            elapsed: Duration::from_secs(31),
        };
        let msg = err.user_message().unwrap();
        assert!(msg.contains("smaller image"));
        assert!(err.to_string().contains("31.0s"));
    }

    #[test]
    fn model_failure_carries_detail() {
        let err = PipelineError::Model("out of memory".into());
        assert!(err.user_message().unwrap().contains("out of memory"));
    }

    #[test]
    fn processing_failure_hides_detail() {
        let err = PipelineError::Processing("index out of bounds".into());
        assert!(!err.user_message().unwrap().contains("index"));
    }
}
