//! Queries against the `user_lists` table

use sqlx::SqlitePool;

use crate::database::models::DbListRow;

pub async fn upsert(
    pool: &SqlitePool,
    user_id: i64,
    username: &str,
    entries_json: &str,
    entry_count: i64,
    fetched_at: i64,
    expires_at: i64,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO user_lists
            (user_id, username, username_lower, entries, entry_count,
             fetched_at, expires_at, access_count, last_accessed_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            username = excluded.username,
            username_lower = excluded.username_lower,
            entries = excluded.entries,
            entry_count = excluded.entry_count,
            fetched_at = excluded.fetched_at,
            expires_at = excluded.expires_at,
            access_count = 1,
            last_accessed_at = excluded.last_accessed_at
        "#,
    )
    .bind(user_id)
    .bind(username)
    .bind(username.to_lowercase())
    .bind(entries_json)
    .bind(entry_count)
    .bind(fetched_at)
    .bind(expires_at)
    .bind(fetched_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get(pool: &SqlitePool, user_id: i64) -> sqlx::Result<Option<DbListRow>> {
    sqlx::query_as::<_, DbListRow>(
        "SELECT user_id, username, entries, entry_count, fetched_at, expires_at,
                access_count, last_accessed_at
         FROM user_lists WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Exact username match first, then case-insensitive.
pub async fn find_by_username(pool: &SqlitePool, username: &str) -> sqlx::Result<Option<DbListRow>> {
    let exact = sqlx::query_as::<_, DbListRow>(
        "SELECT user_id, username, entries, entry_count, fetched_at, expires_at,
                access_count, last_accessed_at
         FROM user_lists WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;
    if exact.is_some() {
        return Ok(exact);
    }

    sqlx::query_as::<_, DbListRow>(
        "SELECT user_id, username, entries, entry_count, fetched_at, expires_at,
                access_count, last_accessed_at
         FROM user_lists WHERE username_lower = ?",
    )
    .bind(username.to_lowercase())
    .fetch_optional(pool)
    .await
}

/// Bump the access counter after a read.
pub async fn touch_access(pool: &SqlitePool, user_id: i64, now: i64) -> sqlx::Result<()> {
    sqlx::query(
        "UPDATE user_lists SET access_count = access_count + 1, last_accessed_at = ?
         WHERE user_id = ?",
    )
    .bind(now)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete(pool: &SqlitePool, user_id: i64) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM user_lists WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn clear(pool: &SqlitePool) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM user_lists").execute(pool).await?;
    Ok(())
}

pub async fn count(pool: &SqlitePool) -> sqlx::Result<u64> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_lists")
        .fetch_one(pool)
        .await?;
    Ok(n as u64)
}

/// Metadata of every record, for the eviction pass.
pub async fn all_rows(pool: &SqlitePool) -> sqlx::Result<Vec<DbListRow>> {
    sqlx::query_as::<_, DbListRow>(
        "SELECT user_id, username, entries, entry_count, fetched_at, expires_at,
                access_count, last_accessed_at
         FROM user_lists",
    )
    .fetch_all(pool)
    .await
}
