//! Store-backed operations behind each chat interaction.
//!
//! These functions glue the parsers, the store, and the expander together
//! and return plain data; rendering and transport live elsewhere.

use crate::error::{CraftError, Result};
use crate::expand::{expand_scaled, RecipeGraph, Totals, TreeLine};
use crate::models::{Item, LinkedItem};
use crate::parse::{StockLine, Submission};
use crate::store::Store;

/// Everything shown for a `/craft_<id>` lookup.
#[derive(Debug, Clone)]
pub struct CraftView {
    pub item: Item,
    pub direct: Vec<LinkedItem>,
    pub used_in: Vec<LinkedItem>,
    /// Present only for complex items.
    pub expansion: Option<Expansion>,
}

#[derive(Debug, Clone)]
pub struct Expansion {
    pub lines: Vec<TreeLine>,
    pub totals: Totals,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub result: Item,
    pub edges_added: usize,
}

pub async fn craft_view(store: &dyn Store, id: &str) -> Result<CraftView> {
    craft_view_scaled(store, id, 1).await
}

/// Like [`craft_view`], with the expansion scaled to `count` units.
pub async fn craft_view_scaled(store: &dyn Store, id: &str, count: u64) -> Result<CraftView> {
    let item = store.require_item(id).await?;
    let direct = store.recipe_of(id).await?;
    let used_in = store.used_in(id).await?;
    let expansion = if item.complex {
        Some(expand_item(store, &item, count).await?)
    } else {
        None
    };
    Ok(CraftView {
        item,
        direct,
        used_in,
        expansion,
    })
}

/// Expand `count` units of a complex item from the current store state.
pub async fn expand_item(store: &dyn Store, item: &Item, count: u64) -> Result<Expansion> {
    let graph = RecipeGraph::load(store, &item.id).await?;
    let mut totals = Totals::new();
    let lines = expand_scaled(&graph, &item.id, count, &mut totals)?;
    Ok(Expansion { lines, totals })
}

async fn resolve_name(store: &dyn Store, name: &str) -> Result<Item> {
    store
        .find_item_by_name(name)
        .await?
        .ok_or_else(|| CraftError::UnknownItem(name.to_string()))
}

/// Record a parsed recipe submission.
///
/// Every name is resolved before anything is written, and the edges go in
/// through one [`Store::add_recipe`] call, so a submission is applied
/// entirely or not at all.
pub async fn submit_recipe(store: &dyn Store, submission: &Submission) -> Result<SubmitOutcome> {
    let result = resolve_name(store, submission.result_name()).await?;

    let mut parts = Vec::new();
    for (name, qty) in submission.parts() {
        let ingredient = resolve_name(store, &name).await?;
        parts.push((ingredient.id, qty));
    }

    store.add_recipe(&result.id, &parts).await?;
    tracing::info!(result = %result.id, edges = parts.len(), "recipe submitted");

    Ok(SubmitOutcome {
        edges_added: parts.len(),
        result: Item {
            complex: true,
            ..result
        },
    })
}

/// Validate a stock report against the store. Returns the number of lines.
pub async fn apply_stock(store: &dyn Store, lines: &[StockLine]) -> Result<usize> {
    for line in lines {
        store.require_item(&line.id).await?;
    }
    Ok(lines.len())
}
