use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use subscope_core::{CoreError, DatabaseError, Subreddit};
use tracing::{debug, info};

/// Subreddits every fresh install starts with.
pub const DEFAULT_SUBREDDITS: [(&str, &str); 2] = [
    ("ollama", "https://www.reddit.com/r/ollama/"),
    ("openai", "https://www.reddit.com/r/openai/"),
];

/// SQLite-backed store for the tracked subreddit list.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(path: &Path) -> Result<Self, CoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(DatabaseError::from)?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// In-memory database for tests.
    pub async fn in_memory() -> Result<Self, CoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(DatabaseError::from)?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), CoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS subreddits (
                name TEXT PRIMARY KEY,
                url TEXT NOT NULL,
                added_at INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        debug!("Database migrations complete");
        Ok(())
    }

    /// Insert the default subreddits, skipping any that already exist.
    pub async fn seed_defaults(&self) -> Result<(), CoreError> {
        for (name, url) in DEFAULT_SUBREDDITS {
            sqlx::query("INSERT OR IGNORE INTO subreddits (name, url, added_at) VALUES (?1, ?2, ?3)")
                .bind(name)
                .bind(url)
                .bind(chrono::Utc::now().timestamp())
                .execute(&self.pool)
                .await
                .map_err(DatabaseError::from)?;
        }
        info!("Seeded default subreddits");
        Ok(())
    }

    pub async fn list_subreddits(&self) -> Result<Vec<Subreddit>, CoreError> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT name, url FROM subreddits ORDER BY added_at, name")
                .fetch_all(&self.pool)
                .await
                .map_err(DatabaseError::from)?;

        Ok(rows
            .into_iter()
            .map(|(name, url)| Subreddit { name, url })
            .collect())
    }

    pub async fn add_subreddit(&self, subreddit: &Subreddit) -> Result<(), CoreError> {
        let result = sqlx::query("INSERT INTO subreddits (name, url, added_at) VALUES (?1, ?2, ?3)")
            .bind(&subreddit.name)
            .bind(&subreddit.url)
            .bind(chrono::Utc::now().timestamp())
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => {
                info!(name = %subreddit.name, "Subreddit added");
                Ok(())
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(DatabaseError::AlreadyExists {
                    name: subreddit.name.clone(),
                }
                .into())
            }
            Err(e) => Err(DatabaseError::from(e).into()),
        }
    }

    /// Remove a subreddit by name. Returns whether a row was deleted.
    pub async fn remove_subreddit(&self, name: &str) -> Result<bool, CoreError> {
        let result = sqlx::query("DELETE FROM subreddits WHERE name = ?1")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from)?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests;
