//! Command implementations behind the `craftbook` CLI.
//!
//! Every command opens the configured database, runs migrations, and works
//! through [`SqliteStore`], so the CLI sees exactly what the bot sees.
//! Output is plain text on stdout.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use craftbook_core::filter::ItemFilter;
use craftbook_core::parse::parse_submission;
use craftbook_core::render::craft_ref;
use craftbook_core::search::{keywords, search, SearchOutcome};
use craftbook_core::seed::{seed_if_empty, seed_store, Dataset};
use craftbook_core::store::Store;
use craftbook_core::workflow;

use crate::config::{BotMode, Config};
use crate::db;
use crate::dispatch::Dispatcher;
use crate::migrate;
use crate::sqlite_store::SqliteStore;
use crate::telegram::TelegramClient;

async fn open_store(config: &Config) -> Result<SqliteStore> {
    let pool = db::connect(config).await?;
    migrate::apply(&pool).await?;
    Ok(SqliteStore::new(pool))
}

fn read_dataset(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset: {}", path.display()))?;
    Ok(Dataset::from_json(&text)?)
}

/// Create the schema, then load the configured dataset into an empty store.
pub async fn run_init(config: &Config) -> Result<()> {
    let store = open_store(config).await?;

    if let Some(path) = &config.data.seed_path {
        let dataset = read_dataset(path)?;
        match seed_if_empty(&store, &dataset).await? {
            Some(report) => println!(
                "Seeded {} items and {} recipe edges ({} skipped).",
                report.items_inserted, report.edges_inserted, report.edges_skipped
            ),
            None => println!("Store already populated; seed skipped."),
        }
    }

    store.pool().close().await;
    println!("Database initialized successfully.");
    Ok(())
}

/// Load a dataset file regardless of what the store already holds.
pub async fn run_seed(config: &Config, file: &Path) -> Result<()> {
    let store = open_store(config).await?;
    let dataset = read_dataset(file)?;
    let report = seed_store(&store, &dataset).await?;
    println!(
        "Inserted {} items and {} recipe edges ({} skipped).",
        report.items_inserted, report.edges_inserted, report.edges_skipped
    );
    store.pool().close().await;
    Ok(())
}

pub async fn run_craft(config: &Config, id: &str, count: u64) -> Result<()> {
    if count == 0 {
        bail!("--count must be at least 1");
    }
    let store = open_store(config).await?;
    let view = workflow::craft_view_scaled(&store, id, count).await?;

    println!("{} ({})", view.item.name, view.item.id);
    if let Some(expansion) = &view.expansion {
        println!();
        println!("Recipe:");
        for ingr in &view.direct {
            println!("  {:>3} x {}{}", ingr.quantity, ingr.item.name, craft_ref(&ingr.item));
        }

        println!();
        println!("Crafting tree for {}:", count);
        for line in &expansion.lines {
            println!(
                "{}{} x {}",
                "  ".repeat(line.depth + 1),
                line.quantity,
                line.name
            );
        }
        println!();
        println!("Base resources:");
        for (name, qty) in &expansion.totals {
            println!("  {:>4} x {}", qty, name);
        }
    } else {
        println!("{} cannot be crafted.", view.item.name);
    }

    if !view.used_in.is_empty() {
        println!();
        println!("Used in:");
        for result in &view.used_in {
            println!("  {}{}", result.item.name, craft_ref(&result.item));
        }
    }

    store.pool().close().await;
    Ok(())
}

pub async fn run_list(config: &Config, filter: &str) -> Result<()> {
    let filter: ItemFilter = filter.parse().map_err(anyhow::Error::msg)?;
    let store = open_store(config).await?;
    let items = store.list_items(filter).await?;

    println!("{} ({} items)", filter.label(), items.len());
    for item in &items {
        println!("{} - {}{}", item.id, item.name, craft_ref(item));
    }
    store.pool().close().await;
    Ok(())
}

pub async fn run_search(config: &Config, words: &[String]) -> Result<()> {
    let words = keywords(&words.join(" "));
    if words.is_empty() {
        bail!("search needs at least one keyword");
    }
    let store = open_store(config).await?;

    match search(&store, &words).await? {
        SearchOutcome::None => println!("No items found."),
        SearchOutcome::Single(item) => println!("{} - {}{}", item.id, item.name, craft_ref(&item)),
        SearchOutcome::Many(items) => {
            for item in &items {
                println!("{} - {}{}", item.id, item.name, craft_ref(item));
            }
        }
    }
    store.pool().close().await;
    Ok(())
}

/// Submit a recipe or tavern hint stored in a text file, as if forwarded.
pub async fn run_submit(config: &Config, file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read submission: {}", file.display()))?;
    let submission = parse_submission(&text)?;

    let store = open_store(config).await?;
    let outcome = workflow::submit_recipe(&store, &submission).await;
    store.pool().close().await;

    let done = outcome?;
    println!(
        "Recorded {} edge(s) for {} ({}).",
        done.edges_added, done.result.name, done.result.id
    );
    Ok(())
}

/// Run the bot with the configured transport until interrupted.
pub async fn run_serve(config: &Config) -> Result<()> {
    let token = config.bot.require_token()?;
    let store = open_store(config).await?;

    if let Some(path) = &config.data.seed_path {
        let dataset = read_dataset(path)?;
        if let Some(report) = seed_if_empty(&store, &dataset).await? {
            tracing::info!(items = report.items_inserted, "seeded empty store");
        }
    }

    let pool = store.pool().clone();
    let store: Arc<dyn Store> = Arc::new(store);
    let dispatcher = Arc::new(Dispatcher::new(
        store,
        config.bot.trusted_forwarders.clone(),
    ));
    let client = TelegramClient::new(&config.bot.api_base, token)?;

    let result = match config.bot.mode {
        BotMode::Polling => {
            crate::bot::run_polling(client, dispatcher, config.bot.poll_timeout_secs).await
        }
        BotMode::Webhook => crate::server::run_webhook(config, client, dispatcher).await,
    };

    pool.close().await;
    result
}
