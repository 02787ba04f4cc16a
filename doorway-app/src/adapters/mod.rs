//! Storage adapters for the doorway daemon.

#[cfg(feature = "sqlite-store")]
mod sqlite;

#[cfg(feature = "sqlite-store")]
pub use sqlite::SqliteStore;
