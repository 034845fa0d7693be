//! Card registry for the gatehub access control bridge.
//!
//! SQLite-backed persistence for registered cards and their optional image
//! attachments, plus the access evaluator that turns a scanned UID into a
//! grant/deny decision.
//!
//! # Architecture
//!
//! - [`Database`]: connection pool manager with embedded migrations
//! - [`CardRegistry`] / [`SqliteCardRegistry`]: card and media operations,
//!   all keyed through the UID normalizer
//! - [`AccessEvaluator`]: fixed-priority card type probe producing an
//!   [`AccessDecision`]
//!
//! Every registry method is one transaction; composite behaviors (the
//! delete-then-insert on image re-upload, the media-then-card delete on
//! removal) are sequenced inside the method body, never by callers. The
//! serial bridge and the realtime hub call into this crate concurrently
//! without any extra locking.
//!
//! # Example
//!
//! ```no_run
//! use gatehub_registry::{AccessEvaluator, Database, DatabaseConfig, SqliteCardRegistry};
//! use gatehub_registry::CardRegistry;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("gatehub.db")).await?;
//! let registry = SqliteCardRegistry::new(db.pool().clone(), "media");
//!
//! registry.add("KEY", &"09:25:0C:05".into()).await?;
//!
//! let evaluator = AccessEvaluator::new(registry, "http://localhost:8080/media");
//! let decision = evaluator.evaluate(&"09250C05".into()).await?;
//! assert!(decision.granted);
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod evaluator;
pub mod models;
pub mod store;

pub use connection::{Database, DatabaseConfig};
pub use error::{RegistryError, RegistryResult};
pub use evaluator::{AccessDecision, AccessEvaluator};
pub use models::CardRecord;
pub use store::{CardRegistry, SqliteCardRegistry};
