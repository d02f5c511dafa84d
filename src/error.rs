use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("Failed to read device {device}: {reason}")]
    DeviceRead { device: String, reason: String },

    #[error("Attribute {attribute} has a non-numeric {field}: {value:?}")]
    AttributeValue {
        attribute: String,
        field: &'static str,
        value: String,
    },

    #[error("smartctl error: {0}")]
    Smartctl(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP server error: {0}")]
    Server(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

impl ExporterError {
    /// Device the error is attributed to, if any
    pub fn device(&self) -> Option<&str> {
        match self {
            ExporterError::DeviceRead { device, .. } => Some(device),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExporterError>;
