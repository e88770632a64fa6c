//! In-memory [`Store`] implementation for tests and offline tooling.
//!
//! Uses `BTreeMap`s behind `std::sync::RwLock`, so iteration order is the
//! ascending key order the trait promises. Lock order is always items,
//! then edges; [`add_recipe`](Store::add_recipe) holds both write locks
//! for its whole check-then-insert sequence.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::error::{CraftError, Result};
use crate::filter::ItemFilter;
use crate::models::{Item, LinkedItem, User};

use super::{check_parts, normalize_keywords, Store};

/// Edge key: `(result_id, ingredient_id)`.
type EdgeKey = (String, String);

pub struct InMemoryStore {
    items: RwLock<BTreeMap<String, Item>>,
    edges: RwLock<BTreeMap<EdgeKey, u32>>,
    users: RwLock<BTreeMap<i64, User>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(BTreeMap::new()),
            edges: RwLock::new(BTreeMap::new()),
            users: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of stored recipe edges.
    pub fn edge_count(&self) -> Result<usize> {
        Ok(read(&self.edges)?.len())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> CraftError {
    CraftError::Store(anyhow::anyhow!("in-memory store lock poisoned"))
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| poisoned())
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| poisoned())
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get_item(&self, id: &str) -> Result<Option<Item>> {
        Ok(read(&self.items)?.get(id).cloned())
    }

    async fn find_item_by_name(&self, name: &str) -> Result<Option<Item>> {
        let items = read(&self.items)?;
        if let Some(item) = items.values().find(|i| i.name == name) {
            return Ok(Some(item.clone()));
        }
        let lowered = name.to_lowercase();
        Ok(items
            .values()
            .find(|i| i.name.to_lowercase() == lowered)
            .cloned())
    }

    async fn search_items(&self, keywords: &[String]) -> Result<Vec<Item>> {
        let terms = normalize_keywords(keywords);
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let items = read(&self.items)?;
        Ok(items
            .values()
            .filter(|i| {
                let name = i.name.to_lowercase();
                terms.iter().all(|t| name.contains(t.as_str()))
            })
            .cloned()
            .collect())
    }

    async fn list_items(&self, filter: ItemFilter) -> Result<Vec<Item>> {
        let items = read(&self.items)?;
        Ok(items.values().filter(|i| filter.matches(i)).cloned().collect())
    }

    async fn recipe_of(&self, result_id: &str) -> Result<Vec<LinkedItem>> {
        let items = read(&self.items)?;
        let edges = read(&self.edges)?;
        // BTreeMap order on (result, ingredient) already sorts by ingredient id.
        Ok(edges
            .iter()
            .filter(|((result, _), _)| result == result_id)
            .filter_map(|((_, ingredient), qty)| {
                items.get(ingredient).map(|item| LinkedItem {
                    item: item.clone(),
                    quantity: *qty,
                })
            })
            .collect())
    }

    async fn used_in(&self, ingredient_id: &str) -> Result<Vec<LinkedItem>> {
        let items = read(&self.items)?;
        let edges = read(&self.edges)?;
        Ok(edges
            .iter()
            .filter(|((_, ingredient), _)| ingredient == ingredient_id)
            .filter_map(|((result, _), qty)| {
                items.get(result).map(|item| LinkedItem {
                    item: item.clone(),
                    quantity: *qty,
                })
            })
            .collect())
    }

    async fn insert_item(&self, item: &Item) -> Result<bool> {
        let mut items = write(&self.items)?;
        if items.contains_key(&item.id) {
            return Ok(false);
        }
        items.insert(item.id.clone(), item.clone());
        Ok(true)
    }

    async fn add_recipe(&self, result_id: &str, parts: &[(String, u32)]) -> Result<()> {
        check_parts(result_id, parts)?;

        let mut items = write(&self.items)?;
        let mut edges = write(&self.edges)?;

        if !items.contains_key(result_id) {
            return Err(CraftError::NotFound(result_id.to_string()));
        }
        for (ingredient_id, _) in parts {
            if !items.contains_key(ingredient_id) {
                return Err(CraftError::NotFound(ingredient_id.clone()));
            }
            if edges.contains_key(&(result_id.to_string(), ingredient_id.clone())) {
                return Err(CraftError::DuplicateEdge {
                    result: result_id.to_string(),
                    ingredient: ingredient_id.clone(),
                });
            }
        }

        for (ingredient_id, qty) in parts {
            edges.insert((result_id.to_string(), ingredient_id.clone()), *qty);
        }
        if !parts.is_empty() {
            if let Some(result) = items.get_mut(result_id) {
                result.complex = true;
            }
        }
        Ok(())
    }

    async fn upsert_user(&self, user: &User) -> Result<()> {
        write(&self.users)?.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        Ok(read(&self.users)?.get(&id).cloned())
    }

    async fn item_count(&self) -> Result<u64> {
        Ok(read(&self.items)?.len() as u64)
    }
}
