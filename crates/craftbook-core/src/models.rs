//! Core data models used throughout Craftbook.
//!
//! These types represent the items, recipe edges, and chat users that flow
//! between the parsers, the store, and the expander.

use serde::{Deserialize, Serialize};

/// A game object identified by a short code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique item code, e.g. `"01"`, `"a14"`, `"w12"`.
    pub id: String,
    pub name: String,
    /// True iff the item is the result of at least one recipe edge.
    #[serde(default)]
    pub complex: bool,
}

impl Item {
    pub fn new(id: impl Into<String>, name: impl Into<String>, complex: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            complex,
        }
    }

    pub fn category(&self) -> ItemCategory {
        ItemCategory::from_id(&self.id)
    }
}

/// Coarse item classification derived from the id prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemCategory {
    Armour,
    Weapon,
    Recipe,
    Fragment,
    /// Numeric codes: resources and intermediate materials.
    Material,
}

impl ItemCategory {
    pub fn from_id(id: &str) -> Self {
        match id.chars().next() {
            Some('a') => ItemCategory::Armour,
            Some('w') => ItemCategory::Weapon,
            Some('r') => ItemCategory::Recipe,
            Some('k') => ItemCategory::Fragment,
            _ => ItemCategory::Material,
        }
    }

    /// The id prefix for prefix-classified categories.
    pub fn prefix(self) -> Option<&'static str> {
        match self {
            ItemCategory::Armour => Some("a"),
            ItemCategory::Weapon => Some("w"),
            ItemCategory::Recipe => Some("r"),
            ItemCategory::Fragment => Some("k"),
            ItemCategory::Material => None,
        }
    }
}

/// "One unit of `result_id` requires `quantity` units of `ingredient_id`."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeEdge {
    pub result_id: String,
    pub ingredient_id: String,
    pub quantity: u32,
}

impl RecipeEdge {
    pub fn new(
        result_id: impl Into<String>,
        ingredient_id: impl Into<String>,
        quantity: u32,
    ) -> Self {
        Self {
            result_id: result_id.into(),
            ingredient_id: ingredient_id.into(),
            quantity,
        }
    }
}

/// A recipe edge joined with the item on its far side.
///
/// For [`Store::recipe_of`](crate::store::Store::recipe_of) the item is
/// the ingredient; for [`Store::used_in`](crate::store::Store::used_in)
/// it is the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedItem {
    pub item: Item,
    pub quantity: u32,
}

/// A chat user seen by the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
    /// Unix seconds of the most recent interaction.
    #[serde(default)]
    pub last_seen: i64,
}

impl User {
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_prefix() {
        assert_eq!(ItemCategory::from_id("a14"), ItemCategory::Armour);
        assert_eq!(ItemCategory::from_id("w12"), ItemCategory::Weapon);
        assert_eq!(ItemCategory::from_id("r03"), ItemCategory::Recipe);
        assert_eq!(ItemCategory::from_id("k03"), ItemCategory::Fragment);
        assert_eq!(ItemCategory::from_id("07"), ItemCategory::Material);
        assert_eq!(ItemCategory::from_id(""), ItemCategory::Material);
    }

    #[test]
    fn test_full_name() {
        let mut user = User {
            id: 1,
            first_name: "Ada".into(),
            is_bot: false,
            last_name: None,
            username: None,
            language_code: None,
            last_seen: 0,
        };
        assert_eq!(user.full_name(), "Ada");
        user.last_name = Some("Lovelace".into());
        assert_eq!(user.full_name(), "Ada Lovelace");
    }
}
