//! Storage and notification adapters for the daemon.

#[cfg(feature = "sqlite-store")]
mod sqlite;
mod telegram;

#[cfg(feature = "sqlite-store")]
pub use sqlite::SqliteStore;
pub use telegram::{TelegramConfig, TelegramNotifier};
