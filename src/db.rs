// Database related types and functions

use anyhow::Result;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};

pub mod credentials;
pub mod database;

pub use credentials::{CredentialKind, Credentials};
pub use database::Database;

pub fn prepare_sqlite_url(url: &str) -> String {
    if url.starts_with("sqlite:") && !url.contains("mode=") && !url.contains(":memory:") {
        if url.contains('?') {
            format!("{url}&mode=rwc")
        } else {
            format!("{url}?mode=rwc")
        }
    } else {
        url.to_string()
    }
}

pub async fn connect_db(db_url: &str, max_connections: u32) -> Result<Pool<Sqlite>> {
    tracing::debug!(db_url = %db_url, max_connections, "Connecting to database");
    Ok(SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(db_url)
        .await?)
}

/// Connect and bring the schema up to date.
pub async fn open(db_url: &str) -> Result<Database> {
    let url = prepare_sqlite_url(db_url);
    tracing::info!("Opening credential store at: {}", &url);
    // Every in-memory connection is its own database.
    let max_connections = if url.contains(":memory:") { 1 } else { 5 };
    let pool = connect_db(&url, max_connections).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(Database::new(pool))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_sqlite_url_basic() {
        assert_eq!(
            prepare_sqlite_url("sqlite:voidweaver.db"),
            "sqlite:voidweaver.db?mode=rwc"
        );
    }

    #[test]
    fn prepare_sqlite_url_with_query() {
        assert_eq!(
            prepare_sqlite_url("sqlite:voidweaver.db?cache=shared"),
            "sqlite:voidweaver.db?cache=shared&mode=rwc"
        );
    }

    #[test]
    fn prepare_sqlite_url_existing_mode() {
        assert_eq!(
            prepare_sqlite_url("sqlite:voidweaver.db?mode=ro"),
            "sqlite:voidweaver.db?mode=ro"
        );
    }

    #[test]
    fn prepare_sqlite_url_memory() {
        assert_eq!(prepare_sqlite_url("sqlite::memory:"), "sqlite::memory:");
    }

    #[tokio::test]
    async fn open_runs_migrations() {
        let db = open("sqlite::memory:").await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM credentials")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
