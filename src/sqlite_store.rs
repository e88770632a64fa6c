//! SQLite-backed [`Store`] implementation.
//!
//! Maps each [`Store`] operation onto the `items`, `recipes`, and `users`
//! tables created by [`migrate`](crate::migrate). Mutations that touch
//! more than one row run inside a single `BEGIN IMMEDIATE` transaction;
//! dropping the transaction on an early `?` return rolls it back.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use craftbook_core::error::{CraftError, Result};
use craftbook_core::filter::ItemFilter;
use craftbook_core::models::{Item, LinkedItem, User};
use craftbook_core::store::{check_parts, normalize_keywords, Store};

/// SQLite implementation of the [`Store`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Number of stored recipe edges.
    pub async fn edge_count(&self) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(n as u64)
    }
}

fn db_err(err: sqlx::Error) -> CraftError {
    CraftError::Store(err.into())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn item_from_row(row: &SqliteRow) -> Item {
    Item {
        id: row.get("id"),
        name: row.get("name"),
        complex: row.get::<bool, _>("complex"),
    }
}

fn linked_from_row(row: &SqliteRow) -> Result<LinkedItem> {
    let qty: i64 = row.get("quantity_req");
    let quantity = u32::try_from(qty)
        .map_err(|_| CraftError::Store(anyhow::anyhow!("corrupt quantity_req: {}", qty)))?;
    Ok(LinkedItem {
        item: item_from_row(row),
        quantity,
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn get_item(&self, id: &str) -> Result<Option<Item>> {
        let row = sqlx::query("SELECT id, name, complex FROM items WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.as_ref().map(item_from_row))
    }

    async fn find_item_by_name(&self, name: &str) -> Result<Option<Item>> {
        let exact = sqlx::query("SELECT id, name, complex FROM items WHERE name = ? ORDER BY id LIMIT 1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        if let Some(row) = exact {
            return Ok(Some(item_from_row(&row)));
        }

        let folded = sqlx::query(
            "SELECT id, name, complex FROM items WHERE lower(name) = lower(?) ORDER BY id LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(folded.as_ref().map(item_from_row))
    }

    async fn search_items(&self, keywords: &[String]) -> Result<Vec<Item>> {
        let terms = normalize_keywords(keywords);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let conditions = vec!["instr(lower(name), ?) > 0"; terms.len()].join(" AND ");
        let sql = format!(
            "SELECT id, name, complex FROM items WHERE {} ORDER BY id ASC",
            conditions
        );
        let mut query = sqlx::query(&sql);
        for term in &terms {
            query = query.bind(term);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(db_err)?;
        Ok(rows.iter().map(item_from_row).collect())
    }

    async fn list_items(&self, filter: ItemFilter) -> Result<Vec<Item>> {
        let cond = filter.sql_condition();
        let sql = format!(
            "SELECT id, name, complex FROM items WHERE {} ORDER BY id ASC",
            cond.clause
        );
        let mut query = sqlx::query(&sql);
        if let Some(param) = &cond.param {
            query = query.bind(param);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(db_err)?;
        Ok(rows.iter().map(item_from_row).collect())
    }

    async fn recipe_of(&self, result_id: &str) -> Result<Vec<LinkedItem>> {
        let rows = sqlx::query(
            r#"
            SELECT i.id, i.name, i.complex, r.quantity_req
            FROM recipes r
            JOIN items i ON i.id = r.ingredient_id
            WHERE r.result_id = ?
            ORDER BY i.id ASC
            "#,
        )
        .bind(result_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(linked_from_row).collect()
    }

    async fn used_in(&self, ingredient_id: &str) -> Result<Vec<LinkedItem>> {
        let rows = sqlx::query(
            r#"
            SELECT i.id, i.name, i.complex, r.quantity_req
            FROM recipes r
            JOIN items i ON i.id = r.result_id
            WHERE r.ingredient_id = ?
            ORDER BY i.id ASC
            "#,
        )
        .bind(ingredient_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(linked_from_row).collect()
    }

    async fn insert_item(&self, item: &Item) -> Result<bool> {
        let done = sqlx::query(
            "INSERT INTO items (id, name, complex) VALUES (?, ?, ?) ON CONFLICT(id) DO NOTHING",
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(item.complex)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(done.rows_affected() == 1)
    }

    async fn add_recipe(&self, result_id: &str, parts: &[(String, u32)]) -> Result<()> {
        check_parts(result_id, parts)?;

        // Take the write lock before the existence checks so a racing
        // submission waits for this one and then sees its rows.
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await.map_err(db_err)?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM items WHERE id = ?")
            .bind(result_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?;
        if exists.is_none() {
            return Err(CraftError::NotFound(result_id.to_string()));
        }

        for (ingredient_id, qty) in parts {
            let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM items WHERE id = ?")
                .bind(ingredient_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_err)?;
            if exists.is_none() {
                return Err(CraftError::NotFound(ingredient_id.clone()));
            }

            let existing: Option<i64> = sqlx::query_scalar(
                "SELECT 1 FROM recipes WHERE result_id = ? AND ingredient_id = ?",
            )
            .bind(result_id)
            .bind(ingredient_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?;
            if existing.is_some() {
                return Err(CraftError::DuplicateEdge {
                    result: result_id.to_string(),
                    ingredient: ingredient_id.clone(),
                });
            }

            // Also guards writers that bypass this method.
            let inserted = sqlx::query(
                "INSERT INTO recipes (result_id, ingredient_id, quantity_req) VALUES (?, ?, ?)",
            )
            .bind(result_id)
            .bind(ingredient_id)
            .bind(i64::from(*qty))
            .execute(&mut *tx)
            .await;

            match inserted {
                Ok(_) => {}
                Err(err) if is_unique_violation(&err) => {
                    return Err(CraftError::DuplicateEdge {
                        result: result_id.to_string(),
                        ingredient: ingredient_id.clone(),
                    });
                }
                Err(err) => return Err(db_err(err)),
            }
        }

        if !parts.is_empty() {
            sqlx::query("UPDATE items SET complex = 1 WHERE id = ?")
                .bind(result_id)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn upsert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, first_name, is_bot, last_name, username, language_code, last_seen)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                first_name = excluded.first_name,
                is_bot = excluded.is_bot,
                last_name = excluded.last_name,
                username = excluded.username,
                language_code = excluded.language_code,
                last_seen = excluded.last_seen
            "#,
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(user.is_bot)
        .bind(&user.last_name)
        .bind(&user.username)
        .bind(&user.language_code)
        .bind(user.last_seen)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, first_name, is_bot, last_name, username, language_code, last_seen FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(|r| User {
            id: r.get("id"),
            first_name: r.get("first_name"),
            is_bot: r.get::<bool, _>("is_bot"),
            last_name: r.get("last_name"),
            username: r.get("username"),
            language_code: r.get("language_code"),
            last_seen: r.get("last_seen"),
        }))
    }

    async fn item_count(&self) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(n as u64)
    }
}
