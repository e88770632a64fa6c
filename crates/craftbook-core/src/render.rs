//! HTML rendering of bot replies.
//!
//! Replies use Telegram's HTML parse mode: `<b>` for titles, `<code>` for
//! quantity columns, and `/craft_<id>` command references that the client
//! turns into tappable links. Item names are escaped before interpolation.

use std::fmt::Write;

use crate::expand::{Totals, TreeLine};
use crate::filter::ItemFilter;
use crate::models::{Item, LinkedItem};

/// A direct ingredient offered as an interactive control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientRef {
    pub id: String,
    pub name: String,
    pub quantity: u32,
}

impl IngredientRef {
    /// Inline-query text that expands `quantity` units of the ingredient.
    pub fn inline_query(&self) -> String {
        format!("{}-{}", self.id, self.quantity)
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// ` (/craft_<id>)` for complex items, empty otherwise.
pub fn craft_ref(item: &Item) -> String {
    if item.complex {
        format!(" (/craft_{})", item.id)
    } else {
        String::new()
    }
}

pub fn render_not_craftable(item: &Item) -> String {
    format!("<b>{}</b> cannot be crafted.", escape_html(&item.name))
}

/// The `/craft_<id>` card: direct ingredients and where the item is used.
pub fn render_recipe_card(item: &Item, direct: &[LinkedItem], used_in: &[LinkedItem]) -> String {
    let mut text = if item.complex {
        let mut text = format!("<b>{}</b>", escape_html(&item.name));
        for ingr in direct {
            let _ = write!(
                text,
                "<code>\n\t{:>3} x {}</code>{}",
                ingr.quantity,
                escape_html(&ingr.item.name),
                craft_ref(&ingr.item)
            );
        }
        text
    } else {
        render_not_craftable(item)
    };

    if !used_in.is_empty() {
        text.push_str("\n\n<b>Used in:</b>");
        for result in used_in {
            let _ = write!(
                text,
                "<code>\n\t{}</code>{}",
                escape_html(&result.item.name),
                craft_ref(&result.item)
            );
        }
    }
    text
}

/// Indented expansion, one `<code>` line per visited edge.
pub fn render_tree(lines: &[TreeLine]) -> String {
    let mut text = String::new();
    for line in lines {
        let _ = writeln!(
            text,
            "<code>{}{} x {}</code>",
            "  ".repeat(line.depth),
            line.quantity,
            escape_html(&line.name)
        );
    }
    text
}

pub fn render_totals(totals: &Totals) -> String {
    let mut text = String::from("<b>Base resources:</b>\n");
    for (name, qty) in totals {
        let _ = writeln!(text, "<code>{:>4} x {}</code>", qty, escape_html(name));
    }
    text
}

/// Full expansion view: title, tree, and base totals.
pub fn render_expansion(item: &Item, count: u64, lines: &[TreeLine], totals: &Totals) -> String {
    let title = if count > 1 {
        format!("<b>{} x {}</b>\n", count, escape_html(&item.name))
    } else {
        format!("<b>{}</b>\n", escape_html(&item.name))
    };
    format!("{}{}\n{}", title, render_tree(lines), render_totals(totals))
}

/// `<b><Title> items</b>` followed by one `<id> - <name>` line per item.
pub fn render_listing(title: &str, items: &[Item]) -> String {
    let mut text = format!("<b>{} items</b>\n", escape_html(title));
    for item in items {
        let _ = writeln!(
            text,
            "{} - {}{}",
            item.id,
            escape_html(&item.name),
            craft_ref(item)
        );
    }
    text
}

pub fn render_filter_listing(filter: ItemFilter, items: &[Item]) -> String {
    render_listing(&title_case(filter.key()), items)
}

pub fn render_no_results(query: &str) -> String {
    format!("No items found for <i>{}</i>.", escape_html(query))
}

pub fn ingredient_refs(direct: &[LinkedItem]) -> Vec<IngredientRef> {
    direct
        .iter()
        .map(|l| IngredientRef {
            id: l.item.id.clone(),
            name: l.item.name.clone(),
            quantity: l.quantity,
        })
        .collect()
}

pub fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
