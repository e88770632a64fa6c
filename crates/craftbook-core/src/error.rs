//! Domain errors.
//!
//! Every failure a chat interaction can produce is a [`CraftError`]
//! variant. The dispatcher turns each one into a user-facing reply; only
//! [`CraftError::Store`] indicates that the backend itself failed.

use thiserror::Error;

/// Convenience alias used throughout the core crate.
pub type Result<T> = std::result::Result<T, CraftError>;

#[derive(Debug, Error)]
pub enum CraftError {
    /// The text matches none of the known game message formats.
    #[error("text does not match any known recipe format")]
    ParseMismatch,

    /// A name from a submission has no item record.
    #[error("item not in database: {0}")]
    UnknownItem(String),

    /// The (result, ingredient) pair already has an edge.
    #[error("recipe edge already exists: {result} -> {ingredient}")]
    DuplicateEdge { result: String, ingredient: String },

    /// A recipe line asks for zero of an ingredient.
    #[error("recipe edge needs a positive quantity: {result} -> {ingredient}")]
    ZeroQuantity { result: String, ingredient: String },

    /// Direct lookup by item code failed.
    #[error("item not found: {0}")]
    NotFound(String),

    /// Expansion revisited an item on its own ancestor chain.
    #[error("recipe cycle detected: {}", path.join(" -> "))]
    CycleDetected { path: Vec<String> },

    #[error("quantity overflow while expanding {0}")]
    QuantityOverflow(String),

    /// Expansion was requested for an item with no recipe.
    #[error("item cannot be crafted: {0}")]
    NotCraftable(String),

    /// The backing store failed (connection lost, I/O, corrupt row).
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl CraftError {
    /// Whether the error came from user input rather than the backend.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CraftError::Store(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_joins_path() {
        let err = CraftError::CycleDetected {
            path: vec!["a01".into(), "a02".into(), "a01".into()],
        };
        assert_eq!(err.to_string(), "recipe cycle detected: a01 -> a02 -> a01");
    }

    #[test]
    fn test_store_errors_are_not_recoverable() {
        let err: CraftError = anyhow::anyhow!("disk gone").into();
        assert!(!err.is_recoverable());
        assert!(CraftError::ParseMismatch.is_recoverable());
    }
}
