/// Errors that can occur during bridge and time-service operations.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("protocol error: {0}")]
    ProtocolError(String),

    #[error("home directory not set")]
    HomeNotSet,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
