//! Error types for the calorie_scan library

use thiserror::Error;

/// Result type alias for calorie_scan operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Error types for food image analysis
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Image file could not be loaded or decoded
    #[error("Failed to load image: {message}")]
    ImageLoadError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Pipeline configuration could not be read or written
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Image has a shape or pixel type the pipeline cannot handle
    #[error("Unsupported image: {reason}")]
    UnsupportedImage { reason: String },

    /// Generic processing error
    #[error("Processing error: {0}")]
    ProcessingError(String),

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}")]
    InvalidParameter { parameter: String, value: String },

    /// OpenCV operation failed
    #[error("OpenCV error: {operation}")]
    OpenCvError {
        operation: String,
        #[source]
        source: Option<opencv::Error>,
    },
}

impl AnalysisError {
    /// Create an image load error with context
    pub fn image_load<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ImageLoadError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error with context
    pub fn config<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ConfigError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an OpenCV error with context
    pub fn opencv(operation: impl Into<String>, source: opencv::Error) -> Self {
        Self::OpenCvError {
            operation: operation.into(),
            source: Some(source),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.to_string(),
        }
    }

    /// Check if this error indicates a condition the pipeline can fall back from
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AnalysisError::OpenCvError { .. }
                | AnalysisError::ProcessingError(_)
                | AnalysisError::InvalidParameter { .. }
        )
    }

    /// Get user-friendly error description for application display
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::ImageLoadError { .. } => {
                "Could not load the image. Please use a PNG, JPEG, GIF or WebP photo.".to_string()
            }
            AnalysisError::UnsupportedImage { .. } => {
                "This image cannot be analyzed. Please upload a regular color photo.".to_string()
            }
            AnalysisError::ConfigError { .. } => {
                "The configuration file could not be used. Please check its contents.".to_string()
            }
            _ => "Failed to process image. Please try again.".to_string(),
        }
    }
}

/// Attach an operation name to OpenCV failures
pub(crate) trait OpenCvResultExt<T> {
    fn cv_context(self, operation: &str) -> Result<T>;
}

impl<T> OpenCvResultExt<T> for opencv::Result<T> {
    fn cv_context(self, operation: &str) -> Result<T> {
        self.map_err(|e| AnalysisError::opencv(operation, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(AnalysisError::ProcessingError("x".into()).is_recoverable());
        assert!(AnalysisError::invalid_parameter("confidence", f32::NAN).is_recoverable());
        assert!(!AnalysisError::UnsupportedImage { reason: "empty".into() }.is_recoverable());
    }

    #[test]
    fn test_invalid_parameter_display() {
        let err = AnalysisError::invalid_parameter("portion_size", "huge");
        assert_eq!(err.to_string(), "Invalid parameter: portion_size = huge");
    }

    #[test]
    fn test_user_message_for_load_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = AnalysisError::image_load("Failed to open image file", io);
        assert!(err.user_message().contains("PNG"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
