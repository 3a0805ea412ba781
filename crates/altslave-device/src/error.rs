/// Errors that can occur in device operations.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] altslave_transport::TransportError),

    /// The device configuration is unusable.
    #[error("invalid device config: {0}")]
    InvalidConfig(String),

    /// A device is already attached for this connection.
    #[error("device already attached at {0}")]
    AlreadyAttached(String),

    /// No device is attached for this connection.
    #[error("no device attached at {0}")]
    NotAttached(String),

    /// The device was detached while a caller was waiting on it.
    #[error("device {0} detached")]
    Detached(String),

    /// No complete session arrived in time.
    #[error("no message within {0:?}")]
    Timeout(std::time::Duration),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DeviceError>;
