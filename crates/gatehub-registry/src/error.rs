use thiserror::Error;

/// Registry-specific error types.
///
/// Most registry outcomes the rest of the system cares about (duplicate add,
/// missing card on remove) are boolean returns, not errors; this enum covers
/// the failures that genuinely abort an operation.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Database connection or query execution failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration execution failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// An image was uploaded for a card that is not registered
    #[error("Card not found: {card_type} {uid}")]
    CardNotFound { card_type: String, uid: String },

    /// Image file could not be written
    #[error("Media I/O error: {0}")]
    MediaIo(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Specialized result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;
