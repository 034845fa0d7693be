use thiserror::Error;

/// Errors raised by the serial bridge.
///
/// Per the handling policy, none of these propagate past the bridge: connect
/// and read-loop failures end the bridge task with a logged error, write
/// failures abort only the current send.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Opening or configuring the serial port failed
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Low-level I/O failure on the open port
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Outbound frame could not be encoded
    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// A blocking helper task panicked or was cancelled
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// The shared writer lock was poisoned by a panicking writer
    #[error("Serial writer lock poisoned")]
    WriterPoisoned,
}

/// Specialized result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;
