//! Storage abstraction for Craftbook.
//!
//! The [`Store`] trait defines every read and write the bot performs on
//! items, recipe edges, and users, so the core workflows can run against
//! SQLite in production and [`memory::InMemoryStore`] in tests.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.
//! Every mutating method is one unit of work: it either applies fully or
//! leaves the store unchanged.

pub mod memory;

use async_trait::async_trait;

use crate::error::{CraftError, Result};
use crate::filter::ItemFilter;
use crate::models::{Item, LinkedItem, User};

/// Abstract storage backend.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get_item`](Store::get_item) | Item by code |
/// | [`find_item_by_name`](Store::find_item_by_name) | Item by display name |
/// | [`search_items`](Store::search_items) | All-keywords name search |
/// | [`list_items`](Store::list_items) | Items selected by an [`ItemFilter`] |
/// | [`recipe_of`](Store::recipe_of) | Direct ingredients of a result |
/// | [`used_in`](Store::used_in) | Results that consume an ingredient |
/// | [`insert_item`](Store::insert_item) | Create an item if absent |
/// | [`add_recipe`](Store::add_recipe) | Append recipe edges atomically |
/// | [`upsert_user`](Store::upsert_user) | Record a chat user |
#[async_trait]
pub trait Store: Send + Sync {
    async fn get_item(&self, id: &str) -> Result<Option<Item>>;

    /// Item whose name equals `name`, falling back to a case-insensitive
    /// comparison. Ties resolve to the lowest id.
    async fn find_item_by_name(&self, name: &str) -> Result<Option<Item>>;

    /// Items whose name contains every keyword (case-insensitive), by id.
    async fn search_items(&self, keywords: &[String]) -> Result<Vec<Item>>;

    /// Items matching `filter`, ordered by ascending id.
    async fn list_items(&self, filter: ItemFilter) -> Result<Vec<Item>>;

    /// Direct ingredients of `result_id`, ordered by ascending ingredient id.
    async fn recipe_of(&self, result_id: &str) -> Result<Vec<LinkedItem>>;

    /// Results that list `ingredient_id` as an ingredient, by result id.
    async fn used_in(&self, ingredient_id: &str) -> Result<Vec<LinkedItem>>;

    /// Insert `item` unless its id exists. Returns whether it was inserted.
    async fn insert_item(&self, item: &Item) -> Result<bool>;

    /// Add one edge per `(ingredient_id, quantity)` to `result_id` and mark
    /// the result complex.
    ///
    /// Fails with [`CraftError::NotFound`] for unknown ids,
    /// [`CraftError::DuplicateEdge`] when any pair already exists (or
    /// repeats within `parts`), and [`CraftError::CycleDetected`] for a
    /// self-edge. On failure nothing is written.
    async fn add_recipe(&self, result_id: &str, parts: &[(String, u32)]) -> Result<()>;

    async fn upsert_user(&self, user: &User) -> Result<()>;

    async fn get_user(&self, id: i64) -> Result<Option<User>>;

    async fn item_count(&self) -> Result<u64>;

    /// Like [`get_item`](Store::get_item) but absent ids are an error.
    async fn require_item(&self, id: &str) -> Result<Item> {
        self.get_item(id)
            .await?
            .ok_or_else(|| CraftError::NotFound(id.to_string()))
    }
}

/// Lower-cased, non-empty search keywords.
pub fn normalize_keywords(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

/// Reject self-edges, zero quantities and pairs repeated inside one
/// submission.
pub fn check_parts(result_id: &str, parts: &[(String, u32)]) -> Result<()> {
    let mut seen = std::collections::BTreeSet::new();
    for (ingredient_id, qty) in parts {
        if *qty == 0 {
            return Err(CraftError::ZeroQuantity {
                result: result_id.to_string(),
                ingredient: ingredient_id.clone(),
            });
        }
        if ingredient_id == result_id {
            return Err(CraftError::CycleDetected {
                path: vec![result_id.to_string(), ingredient_id.clone()],
            });
        }
        if !seen.insert(ingredient_id.as_str()) {
            return Err(CraftError::DuplicateEdge {
                result: result_id.to_string(),
                ingredient: ingredient_id.clone(),
            });
        }
    }
    Ok(())
}
