//! Parsers for forwarded game messages.
//!
//! Chat Wars answers `/more` with a stock listing and `/recipe` with a
//! recipe card; the tavern occasionally leaks a single recipe relation as
//! a free-text sentence. Each format is matched line by line with a fixed
//! regular expression:
//!
//! | Format | Shape |
//! |--------|-------|
//! | stock line | `/a_<id> <name> x <qty>` |
//! | recipe header | `📃<name> (recipe):` |
//! | recipe part | `<name> x <qty>` |
//! | tavern hint | `… recipe of <name> saying that you need <qty> <item>.` |
//!
//! A quantity must be a positive integer that fits in `u32`; a line with a
//! bad quantity is skipped rather than failing the whole message.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{CraftError, Result};

static STOCK_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/a_(?P<id>\w+) (?P<name>[\w ]+) x (?P<qty>\d+)$").expect("valid stock regex")
});

static RECIPE_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^📃(?P<name>[\w .'\-]+) \(recipe\):$").expect("valid header regex")
});

static RECIPE_PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>[\w .'\-]+) x (?P<qty>\d+)$").expect("valid part regex")
});

static TAVERN_HINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"recipe of (?P<result>[\w .'\-]+?) saying that you need (?P<qty>\d+) (?P<item>[\w .'\-]+?)\.(?:\s|$)",
    )
    .expect("valid hint regex")
});

/// One line of a forwarded stock report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLine {
    pub id: String,
    pub name: String,
    pub qty: u32,
}

/// A single recipe relation disclosed by the tavern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TavernHint {
    pub result_name: String,
    pub qty: u32,
    pub ingredient_name: String,
}

/// A recognised recipe submission, by display names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Full recipe card: header plus one or more parts.
    Recipe {
        result_name: String,
        parts: Vec<(String, u32)>,
    },
    /// Partial recipe from a tavern rumour.
    Hint(TavernHint),
}

impl Submission {
    pub fn result_name(&self) -> &str {
        match self {
            Submission::Recipe { result_name, .. } => result_name,
            Submission::Hint(hint) => &hint.result_name,
        }
    }

    /// Ingredient names and quantities, in message order.
    pub fn parts(&self) -> Vec<(String, u32)> {
        match self {
            Submission::Recipe { parts, .. } => parts.clone(),
            Submission::Hint(hint) => vec![(hint.ingredient_name.clone(), hint.qty)],
        }
    }
}

fn parse_qty(raw: &str) -> Option<u32> {
    raw.parse::<u32>().ok().filter(|q| *q > 0)
}

fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(|l| l.trim_end_matches('\r'))
}

/// Extract every `/a_<id> <name> x <qty>` line from a stock report.
pub fn parse_stock(text: &str) -> Vec<StockLine> {
    lines(text)
        .filter_map(|line| {
            let caps = STOCK_LINE.captures(line)?;
            Some(StockLine {
                id: caps["id"].to_string(),
                name: caps["name"].trim().to_string(),
                qty: parse_qty(&caps["qty"])?,
            })
        })
        .collect()
}

/// Result-item name from the first `📃<name> (recipe):` line.
pub fn parse_recipe_header(text: &str) -> Option<String> {
    lines(text).find_map(|line| {
        RECIPE_HEADER
            .captures(line)
            .map(|caps| caps["name"].trim().to_string())
    })
}

/// Every `<name> x <qty>` line, in order.
pub fn parse_recipe_parts(text: &str) -> Vec<(String, u32)> {
    lines(text)
        .filter_map(|line| {
            let caps = RECIPE_PART.captures(line)?;
            Some((caps["name"].trim().to_string(), parse_qty(&caps["qty"])?))
        })
        .collect()
}

pub fn parse_tavern_hint(text: &str) -> Option<TavernHint> {
    let caps = TAVERN_HINT.captures(text)?;
    Some(TavernHint {
        result_name: caps["result"].trim().to_string(),
        qty: parse_qty(&caps["qty"])?,
        ingredient_name: caps["item"].trim().to_string(),
    })
}

/// Classify a forwarded message as a recipe submission.
///
/// The recipe card format is tried first and consumes the input if it
/// matches; the tavern hint is the fallback. A header with no part lines
/// counts as a mismatch.
pub fn parse_submission(text: &str) -> Result<Submission> {
    if let Some(result_name) = parse_recipe_header(text) {
        let parts = parse_recipe_parts(text);
        if !parts.is_empty() {
            return Ok(Submission::Recipe { result_name, parts });
        }
    }

    parse_tavern_hint(text)
        .map(Submission::Hint)
        .ok_or(CraftError::ParseMismatch)
}
