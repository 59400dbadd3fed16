//! Admin state blob access
//!
//! Each admin surface persists its whole working state as one JSON string
//! under a well-known key in the `admin_state` table. Saves are whole-blob
//! upserts; there is no partial update path.

use crate::Result;
use sqlx::{Pool, Sqlite};

/// Load a state blob by key. `None` when the key was never saved.
pub async fn load_state_blob(db: &Pool<Sqlite>, key: &str) -> Result<Option<String>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM admin_state WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await?;

    Ok(value)
}

/// Insert or replace a state blob.
pub async fn save_state_blob(db: &Pool<Sqlite>, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO admin_state (key, value, updated_at)
        VALUES (?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(db)
    .await?;

    Ok(())
}

/// Remove a state blob, returning to the never-saved condition.
pub async fn delete_state_blob(db: &Pool<Sqlite>, key: &str) -> Result<()> {
    sqlx::query("DELETE FROM admin_state WHERE key = ?")
        .bind(key)
        .execute(db)
        .await?;

    Ok(())
}
