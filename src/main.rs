//! # Craftbook CLI (`craftbook`)
//!
//! Runs the crafting bot and exposes the same store operations from the
//! terminal.
//!
//! ## Usage
//!
//! ```bash
//! craftbook --config ./config/craftbook.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `craftbook init` | Create the database and seed it when empty |
//! | `craftbook seed <file>` | Load an item/recipe JSON dataset |
//! | `craftbook craft <id>` | Show a recipe and its expanded crafting tree |
//! | `craftbook list [filter]` | List items by filter |
//! | `craftbook search <words>` | Find items by name |
//! | `craftbook submit <file>` | Record a recipe or tavern hint from a text file |
//! | `craftbook serve` | Run the Telegram bot |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use craftbook::{commands, config, logging};

/// Craftbook: Chat Wars crafting recipes over Telegram.
#[derive(Parser)]
#[command(name = "craftbook", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/craftbook.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema and load `[data].seed_path` if the store is empty.
    Init,

    /// Load items and recipes from a JSON dataset. Existing rows are kept.
    Seed {
        file: PathBuf,
    },

    /// Show the recipe card and full crafting tree of an item.
    Craft {
        /// Item id, e.g. `a14` or `w01`.
        id: String,

        /// How many units to expand.
        #[arg(long, default_value_t = 1)]
        count: u64,
    },

    /// List items: all, basic, complex, armour, weapon, recipe, fragment.
    List {
        #[arg(default_value = "all")]
        filter: String,
    },

    /// Find items whose name contains every keyword.
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Record a forwarded recipe or tavern hint saved as text.
    Submit {
        file: PathBuf,
    },

    /// Run the bot (long polling or webhook, per `[bot].mode`).
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => commands::run_init(&cfg).await?,
        Commands::Seed { file } => commands::run_seed(&cfg, &file).await?,
        Commands::Craft { id, count } => commands::run_craft(&cfg, &id, count).await?,
        Commands::List { filter } => commands::run_list(&cfg, &filter).await?,
        Commands::Search { query } => commands::run_search(&cfg, &query).await?,
        Commands::Submit { file } => commands::run_submit(&cfg, &file).await?,
        Commands::Serve => commands::run_serve(&cfg).await?,
    }

    Ok(())
}
