use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Capture Error: {0}")]
    Capture(String),
    #[error("Publish Error: {0}")]
    Publish(String),
    #[error("Configuration Error: {0}")]
    Configuration(String),
    #[error("Failed to load configuration: {0}")]
    ConfigLoad(#[from] config::ConfigError),
    #[error("Image Error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Serialization Error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Pipeline Error: {0}")]
    Pipeline(String),
}

impl AppError {
    /// Configuration problems halt startup; everything else is survivable by
    /// the sampling loop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::Configuration(_) | AppError::ConfigLoad(_))
    }
}
