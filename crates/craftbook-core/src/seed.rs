//! Static item/recipe dataset.
//!
//! The dataset is a JSON document:
//!
//! ```json
//! {
//!   "items":   [{ "id": "01", "name": "Thread", "complex": false }],
//!   "recipes": [{ "id": "a01", "ingredients": [[3, "01"], [1, "02"]] }]
//! }
//! ```
//!
//! Each recipe lists `(quantity, ingredient_id)` pairs for one result.
//! An item's `complex` flag is never taken from the file: it is set when
//! the first edge for that item lands. Seeding is idempotent: existing items are kept and edges that already
//! exist are skipped.

use anyhow::Context;
use serde::Deserialize;

use crate::error::{CraftError, Result};
use crate::models::Item;
use crate::store::Store;

#[derive(Debug, Clone, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub recipes: Vec<DatasetRecipe>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetRecipe {
    /// Result item id.
    pub id: String,
    pub ingredients: Vec<(u32, String)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub items_inserted: usize,
    pub edges_inserted: usize,
    pub edges_skipped: usize,
}

impl Dataset {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .context("invalid seed dataset")
            .map_err(CraftError::from)
    }
}

/// Load `dataset` into `store`.
///
/// Duplicate edges and edges naming unknown items are skipped with a
/// warning so one bad row does not block the rest of the file.
pub async fn seed_store(store: &dyn Store, dataset: &Dataset) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    for item in &dataset.items {
        let plain = Item {
            complex: false,
            ..item.clone()
        };
        if store.insert_item(&plain).await? {
            report.items_inserted += 1;
        }
    }

    for recipe in &dataset.recipes {
        for (qty, ingredient_id) in &recipe.ingredients {
            match store
                .add_recipe(&recipe.id, &[(ingredient_id.clone(), *qty)])
                .await
            {
                Ok(()) => report.edges_inserted += 1,
                Err(err) if err.is_recoverable() => {
                    tracing::warn!(result = %recipe.id, ingredient = %ingredient_id, error = %err, "skipping seed edge");
                    report.edges_skipped += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    for item in dataset.items.iter().filter(|i| i.complex) {
        if store.recipe_of(&item.id).await?.is_empty() {
            tracing::warn!(id = %item.id, "item marked complex has no recipe edges; stored as base item");
        }
    }

    tracing::info!(
        items = report.items_inserted,
        edges = report.edges_inserted,
        skipped = report.edges_skipped,
        "seed dataset applied"
    );
    Ok(report)
}

/// Seed only when the store holds no items. Returns `None` if skipped.
pub async fn seed_if_empty(store: &dyn Store, dataset: &Dataset) -> Result<Option<SeedReport>> {
    if store.item_count().await? > 0 {
        return Ok(None);
    }
    seed_store(store, dataset).await.map(Some)
}
