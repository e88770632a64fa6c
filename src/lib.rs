//! # Craftbook
//!
//! A Telegram bot for Chat Wars crafting recipes: look up what an item
//! needs, expand the full crafting tree down to base resources, and grow
//! the recipe database from game messages that players forward.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌────────────┐   ┌───────────────┐
//! │  Telegram  │──▶│ Dispatcher │──▶│ craftbook-core│
//! │ poll/hook  │   │  (routes)  │   │ parse/expand  │
//! └────────────┘   └─────┬──────┘   └───────┬───────┘
//!                        │                  │
//!                        ▼                  ▼
//!                  ┌──────────┐       ┌──────────┐
//!                  │ Bot API  │       │  SQLite  │
//!                  │ replies  │       │  store   │
//!                  └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! craftbook init                 # create database, load seed data
//! craftbook craft a14 --count 2  # expand a recipe in the terminal
//! craftbook list complex         # browse items
//! craftbook serve                # run the bot
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite implementation of the item store |
//! | [`telegram`] | Bot API types and client |
//! | [`dispatch`] | Update routing and reply building |
//! | [`bot`] | Long-polling transport |
//! | [`server`] | Webhook transport |
//! | [`commands`] | CLI command implementations |
//! | [`logging`] | Tracing subscriber setup |

pub mod bot;
pub mod commands;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod logging;
pub mod migrate;
pub mod server;
pub mod sqlite_store;
pub mod telegram;
