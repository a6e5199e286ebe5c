//! Durable record of channels, their pairwise connections, and lock flags.
//!
//! The trait lives in [`store`]; [`sqlite`] is the production backend and
//! [`memory`] backs tests and ephemeral runs.

pub mod error;
pub mod memory;
pub mod sqlite;
pub mod store;

pub use {
    error::{Error, Result},
    memory::InMemoryStore,
    sqlite::SqliteStore,
    store::{ChannelRetention, ConnectionStore},
};

/// Run the schema migrations for the relay database.
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .set_ignore_missing(true)
        .run(pool)
        .await?;
    Ok(())
}
