use crate::db::{connect_db, Database};

pub async fn init_test_db() -> Database {
    let pool = connect_db("sqlite::memory:", 1)
        .await
        .expect("failed to create in-memory database");

    sqlx::query(
        "CREATE TABLE credentials(\n    key TEXT PRIMARY KEY,\n    value TEXT NOT NULL,\n    updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))\n)"
    )
    .execute(&pool)
    .await
    .unwrap();

    Database::new(pool)
}
