//! # Craftbook Core
//!
//! Shared logic for Craftbook: item and recipe models, the game-text
//! parsers, the store abstraction, recipe-tree expansion, search, and
//! HTML rendering of replies.
//!
//! This crate contains no tokio, sqlx, network, or filesystem I/O. The
//! application crate supplies a SQLite [`store::Store`] and the chat
//! transport; everything here can be exercised against
//! [`store::memory::InMemoryStore`].

pub mod error;
pub mod expand;
pub mod filter;
pub mod models;
pub mod parse;
pub mod render;
pub mod search;
pub mod seed;
pub mod store;
pub mod workflow;

pub use error::{CraftError, Result};
pub use models::{Item, ItemCategory, RecipeEdge, User};
