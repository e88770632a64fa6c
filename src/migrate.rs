//! Database schema migrations (idempotent).

use anyhow::Result;
use sqlx::SqlitePool;

/// Create every table and index if missing.
pub async fn apply(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS items (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            complex INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    // One edge per (result, ingredient).
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS recipes (
            result_id TEXT NOT NULL,
            ingredient_id TEXT NOT NULL,
            quantity_req INTEGER NOT NULL CHECK (quantity_req > 0),
            PRIMARY KEY (result_id, ingredient_id),
            FOREIGN KEY (result_id) REFERENCES items(id),
            FOREIGN KEY (ingredient_id) REFERENCES items(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY,
            first_name TEXT NOT NULL,
            is_bot INTEGER NOT NULL DEFAULT 0,
            last_name TEXT,
            username TEXT,
            language_code TEXT,
            last_seen INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_recipes_ingredient ON recipes(ingredient_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_items_name ON items(name)")
        .execute(pool)
        .await?;

    Ok(())
}
