//! Recipe-tree expansion.
//!
//! Turns a craftable item into the full, depth-first list of everything it
//! takes to build it, plus the total of each base (non-craftable)
//! ingredient.
//!
//! # Algorithm
//!
//! 1. Snapshot the reachable part of the store into a [`RecipeGraph`].
//! 2. Push the root's edges onto a stack (depth 0, multiplier = edge
//!    quantity) so the lowest ingredient id is popped first.
//! 3. Pop one frame and emit a [`TreeLine`].
//! 4. A complex ingredient pushes its own edges at `depth + 1` with the
//!    multiplier scaled by each child quantity. Those frames sit on top of
//!    the pending siblings, which gives pre-order traversal.
//! 5. A base ingredient adds its multiplier to the totals instead.
//!
//! The ancestor chain of the current frame is tracked explicitly; meeting
//! an item already on it fails with [`CraftError::CycleDetected`] instead
//! of looping forever.
//!
//! # Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use craftbook_core::expand::{expand, RecipeGraph};
//! use craftbook_core::models::{Item, RecipeEdge};
//!
//! let mut graph = RecipeGraph::new();
//! graph.insert_item(Item::new("w01", "Sword", true));
//! graph.insert_item(Item::new("01", "Iron", false));
//! graph.insert_edge(RecipeEdge::new("w01", "01", 3));
//!
//! let mut totals = BTreeMap::new();
//! let lines = expand(&graph, "w01", &mut totals).unwrap();
//! assert_eq!(lines[0].quantity, 3);
//! assert_eq!(totals["Iron"], 3);
//! ```

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::error::{CraftError, Result};
use crate::models::{Item, RecipeEdge};
use crate::store::Store;

/// Deepest nesting accepted before the expansion is treated as runaway.
pub const MAX_DEPTH: usize = 64;

/// Base-ingredient name → total quantity.
pub type Totals = BTreeMap<String, u64>;

/// Store-independent snapshot of the items and edges reachable from a root.
#[derive(Debug, Clone, Default)]
pub struct RecipeGraph {
    items: BTreeMap<String, Item>,
    /// Result id → edges, kept sorted by ingredient id.
    recipes: BTreeMap<String, Vec<RecipeEdge>>,
}

impl RecipeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_item(&mut self, item: Item) {
        self.items.insert(item.id.clone(), item);
    }

    pub fn insert_edge(&mut self, edge: RecipeEdge) {
        let edges = self.recipes.entry(edge.result_id.clone()).or_default();
        match edges.binary_search_by(|e| e.ingredient_id.cmp(&edge.ingredient_id)) {
            Ok(pos) => edges[pos] = edge,
            Err(pos) => edges.insert(pos, edge),
        }
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    /// Direct recipe edges of `result_id`, ordered by ingredient id.
    pub fn edges_of(&self, result_id: &str) -> &[RecipeEdge] {
        self.recipes
            .get(result_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Load every item and edge reachable from `root_id`.
    ///
    /// Each complex item is fetched once, so loading terminates even when
    /// the stored recipes contain a cycle; [`expand`] reports the cycle.
    pub async fn load(store: &dyn Store, root_id: &str) -> Result<Self> {
        let root = store.require_item(root_id).await?;
        let mut graph = RecipeGraph::new();
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::new();

        if root.complex {
            queue.push_back(root.id.clone());
        }
        graph.insert_item(root);

        while let Some(result_id) = queue.pop_front() {
            if !visited.insert(result_id.clone()) {
                continue;
            }
            for linked in store.recipe_of(&result_id).await? {
                graph.insert_edge(RecipeEdge::new(
                    result_id.clone(),
                    linked.item.id.clone(),
                    linked.quantity,
                ));
                if linked.item.complex && !visited.contains(&linked.item.id) {
                    queue.push_back(linked.item.id.clone());
                }
                graph.insert_item(linked.item);
            }
        }

        Ok(graph)
    }
}

/// One emitted line of an expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeLine {
    pub depth: usize,
    /// Product of edge quantities from the root down to this ingredient.
    pub quantity: u64,
    pub item_id: String,
    pub name: String,
    pub complex: bool,
}

struct Frame<'g> {
    edge: &'g RecipeEdge,
    depth: usize,
    multiplier: u64,
}

fn push_children<'g>(
    stack: &mut Vec<Frame<'g>>,
    edges: &'g [RecipeEdge],
    depth: usize,
    multiplier: u64,
) -> Result<()> {
    // Reverse so the lowest ingredient id ends up on top.
    for edge in edges.iter().rev() {
        let scaled = multiplier
            .checked_mul(u64::from(edge.quantity))
            .ok_or_else(|| CraftError::QuantityOverflow(edge.ingredient_id.clone()))?;
        stack.push(Frame {
            edge,
            depth,
            multiplier: scaled,
        });
    }
    Ok(())
}

/// Expand one unit of `root_id`. See [`expand_scaled`].
pub fn expand(graph: &RecipeGraph, root_id: &str, totals: &mut Totals) -> Result<Vec<TreeLine>> {
    expand_scaled(graph, root_id, 1, totals)
}

/// Expand `count` units of `root_id` depth-first.
///
/// Returns the lines in visitation order and adds every base-ingredient
/// quantity into `totals`.
///
/// # Errors
///
/// - [`CraftError::NotFound`] if the root or a referenced item is missing
///   from `graph`.
/// - [`CraftError::NotCraftable`] if the root is not complex.
/// - [`CraftError::CycleDetected`] on a revisited ancestor or when nesting
///   exceeds [`MAX_DEPTH`].
/// - [`CraftError::QuantityOverflow`] if a product or total exceeds `u64`.
pub fn expand_scaled(
    graph: &RecipeGraph,
    root_id: &str,
    count: u64,
    totals: &mut Totals,
) -> Result<Vec<TreeLine>> {
    let root = graph
        .item(root_id)
        .ok_or_else(|| CraftError::NotFound(root_id.to_string()))?;
    if !root.complex {
        return Err(CraftError::NotCraftable(root.id.clone()));
    }

    let mut lines = Vec::new();
    let mut stack = Vec::new();
    let mut path: Vec<&str> = vec![root.id.as_str()];
    push_children(&mut stack, graph.edges_of(&root.id), 0, count)?;

    while let Some(frame) = stack.pop() {
        path.truncate(frame.depth + 1);

        let ingredient = graph
            .item(&frame.edge.ingredient_id)
            .ok_or_else(|| CraftError::NotFound(frame.edge.ingredient_id.clone()))?;

        lines.push(TreeLine {
            depth: frame.depth,
            quantity: frame.multiplier,
            item_id: ingredient.id.clone(),
            name: ingredient.name.clone(),
            complex: ingredient.complex,
        });

        if ingredient.complex {
            if path.contains(&ingredient.id.as_str()) || frame.depth + 1 >= MAX_DEPTH {
                let mut cycle: Vec<String> = path.iter().map(|s| s.to_string()).collect();
                cycle.push(ingredient.id.clone());
                return Err(CraftError::CycleDetected { path: cycle });
            }
            path.push(ingredient.id.as_str());
            push_children(
                &mut stack,
                graph.edges_of(&ingredient.id),
                frame.depth + 1,
                frame.multiplier,
            )?;
        } else {
            let total = totals.entry(ingredient.name.clone()).or_insert(0);
            *total = total
                .checked_add(frame.multiplier)
                .ok_or_else(|| CraftError::QuantityOverflow(ingredient.id.clone()))?;
        }
    }

    Ok(lines)
}
