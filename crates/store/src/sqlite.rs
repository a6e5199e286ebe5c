//! SQLite-backed connection store using sqlx.

use {
    async_trait::async_trait,
    sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    tracing::warn,
};

use crate::{
    Error, Result,
    store::{ChannelRetention, ConnectionStore},
};

/// SQLite-backed persistence for channels and connections.
pub struct SqliteStore {
    pool: SqlitePool,
    retention: ChannelRetention,
}

impl SqliteStore {
    /// Open (or create) the database at `path`, run migrations, and return
    /// a store with its own connection pool.
    pub async fn new(path: &str, retention: ChannelRetention) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        crate::run_migrations(&pool).await?;
        Ok(Self { pool, retention })
    }

    /// Create a store using an existing pool. Migrations must already have
    /// been run via [`crate::run_migrations`].
    pub fn with_pool(pool: SqlitePool, retention: ChannelRetention) -> Self {
        Self { pool, retention }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl ConnectionStore for SqliteStore {
    async fn create_connection(&self, a: &str, b: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        // The UNIQUE constraints cover same-column collisions; this check
        // also catches an id sitting in the opposite column.
        for id in [a, b] {
            let (count,): (i64,) = sqlx::query_as(
                "SELECT COUNT(*) FROM connection
                 WHERE first_channel_id = ?1 OR second_channel_id = ?1",
            )
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
            if count > 0 {
                return Err(Error::already_connected(id));
            }
        }
        for id in [a, b] {
            sqlx::query(
                "INSERT INTO channel (channel_id) VALUES (?)
                 ON CONFLICT(channel_id) DO NOTHING",
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }
        let inserted = sqlx::query(
            "INSERT INTO connection (first_channel_id, second_channel_id) VALUES (?, ?)",
        )
        .bind(a)
        .bind(b)
        .execute(&mut *tx)
        .await;
        match inserted {
            Ok(_) => {},
            Err(err) if is_unique_violation(&err) => return Err(Error::already_connected(a)),
            Err(err) => return Err(err.into()),
        }
        tx.commit().await?;
        Ok(())
    }

    async fn paired_channel(&self, channel_id: &str) -> Result<String> {
        let row: Option<(String, String)> = sqlx::query_as(
            "SELECT first_channel_id, second_channel_id FROM connection
             WHERE first_channel_id = ?1 OR second_channel_id = ?1",
        )
        .bind(channel_id)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            None => Err(Error::NotFound),
            Some((first, second)) => {
                if first == channel_id {
                    Ok(second)
                } else {
                    Ok(first)
                }
            },
        }
    }

    async fn delete_connection_by_channel(&self, channel_id: &str) -> Result<()> {
        let other = self.paired_channel(channel_id).await?;
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "DELETE FROM connection
             WHERE first_channel_id IN (?1, ?2) AND second_channel_id IN (?1, ?2)",
        )
        .bind(channel_id)
        .bind(&other)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            // Lost a race with a concurrent unbind.
            return Err(Error::NotFound);
        }
        if self.retention == ChannelRetention::Delete {
            sqlx::query("DELETE FROM channel WHERE channel_id IN (?1, ?2)")
                .bind(channel_id)
                .bind(&other)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn set_locked(&self, channel_id: &str, locked: bool) -> Result<()> {
        sqlx::query(
            "INSERT INTO channel (channel_id, locked) VALUES (?, ?)
             ON CONFLICT(channel_id) DO UPDATE SET locked = excluded.locked",
        )
        .bind(channel_id)
        .bind(locked)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn is_locked(&self, channel_id: &str) -> bool {
        let row: std::result::Result<Option<(bool,)>, sqlx::Error> =
            sqlx::query_as("SELECT locked FROM channel WHERE channel_id = ?")
                .bind(channel_id)
                .fetch_optional(&self.pool)
                .await;
        match row {
            Ok(Some((locked,))) => locked,
            Ok(None) => false,
            Err(err) => {
                warn!(channel_id, error = %err, "failed to read lock flag, treating as unlocked");
                false
            },
        }
    }
}
