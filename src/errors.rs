use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("JavaScript execution failed: {0}")]
    JavaScriptFailed(String),

    #[error("Timed out waiting for {0}")]
    WaitTimeout(String),

    #[error("DOM extraction failed: {0}")]
    DomExtractionFailed(String),

    #[error("Unsupported selector: {0}")]
    UnsupportedSelector(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Driver is closed")]
    Closed,

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DriverError>;

// Convert anyhow::Error to DriverError
impl From<anyhow::Error> for DriverError {
    fn from(err: anyhow::Error) -> Self {
        DriverError::Engine(err.to_string())
    }
}
