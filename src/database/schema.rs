//! SQLite schema
//!
//! Migrations are idempotent and run on every open.

use sqlx::SqlitePool;

pub async fn run_migrations(pool: &SqlitePool) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_lists (
            user_id INTEGER PRIMARY KEY,
            username TEXT NOT NULL,
            username_lower TEXT NOT NULL,
            entries TEXT NOT NULL,
            entry_count INTEGER NOT NULL DEFAULT 0,
            fetched_at INTEGER NOT NULL,
            expires_at INTEGER NOT NULL,
            access_count INTEGER NOT NULL DEFAULT 0,
            last_accessed_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_user_lists_username_lower ON user_lists (username_lower)",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_user_lists_expires_at ON user_lists (expires_at)")
        .execute(pool)
        .await?;

    Ok(())
}
