//! Item listing filters.
//!
//! An [`ItemFilter`] is a small query object: it can be evaluated against
//! an in-memory [`Item`] with [`ItemFilter::matches`] or translated into a
//! parameterized SQL condition with [`ItemFilter::sql_condition`]. Both
//! paths must select the same set.

use std::fmt;
use std::str::FromStr;

use crate::models::{Item, ItemCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemFilter {
    All,
    Basic,
    Complex,
    Category(ItemCategory),
}

/// Condition fragment plus its bind parameter, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlCondition {
    pub clause: &'static str,
    pub param: Option<String>,
}

impl ItemFilter {
    /// Every selector offered in the `/craft` keyboard, in menu order.
    pub const MENU: [ItemFilter; 7] = [
        ItemFilter::All,
        ItemFilter::Basic,
        ItemFilter::Complex,
        ItemFilter::Category(ItemCategory::Weapon),
        ItemFilter::Category(ItemCategory::Armour),
        ItemFilter::Category(ItemCategory::Recipe),
        ItemFilter::Category(ItemCategory::Fragment),
    ];

    pub fn matches(&self, item: &Item) -> bool {
        match self {
            ItemFilter::All => true,
            ItemFilter::Basic => !item.complex,
            ItemFilter::Complex => item.complex,
            ItemFilter::Category(cat) => match cat.prefix() {
                Some(prefix) => item.id.starts_with(prefix),
                None => item.category() == ItemCategory::Material,
            },
        }
    }

    pub fn sql_condition(&self) -> SqlCondition {
        match self {
            ItemFilter::All => SqlCondition {
                clause: "1 = 1",
                param: None,
            },
            ItemFilter::Basic => SqlCondition {
                clause: "complex = 0",
                param: None,
            },
            ItemFilter::Complex => SqlCondition {
                clause: "complex = 1",
                param: None,
            },
            ItemFilter::Category(cat) => match cat.prefix() {
                Some(prefix) => SqlCondition {
                    clause: "substr(id, 1, 1) = ?",
                    param: Some(prefix.to_string()),
                },
                None => SqlCondition {
                    clause: "substr(id, 1, 1) NOT IN ('a', 'w', 'r', 'k')",
                    param: None,
                },
            },
        }
    }

    /// Token used in callback data (`list|<key>`).
    pub fn key(&self) -> &'static str {
        match self {
            ItemFilter::All => "all",
            ItemFilter::Basic => "basic",
            ItemFilter::Complex => "complex",
            ItemFilter::Category(ItemCategory::Armour) => "armour",
            ItemFilter::Category(ItemCategory::Weapon) => "weapon",
            ItemFilter::Category(ItemCategory::Recipe) => "recipe",
            ItemFilter::Category(ItemCategory::Fragment) => "fragment",
            ItemFilter::Category(ItemCategory::Material) => "material",
        }
    }

    /// Button label in the `/craft` keyboard.
    pub fn label(&self) -> &'static str {
        match self {
            ItemFilter::All => "All",
            ItemFilter::Basic => "Basic",
            ItemFilter::Complex => "Crafted",
            ItemFilter::Category(ItemCategory::Armour) => "Armors",
            ItemFilter::Category(ItemCategory::Weapon) => "Weapons",
            ItemFilter::Category(ItemCategory::Recipe) => "Recipes",
            ItemFilter::Category(ItemCategory::Fragment) => "Fragments",
            ItemFilter::Category(ItemCategory::Material) => "Materials",
        }
    }
}

impl fmt::Display for ItemFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ItemFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(ItemFilter::All),
            "basic" => Ok(ItemFilter::Basic),
            "complex" | "crafted" => Ok(ItemFilter::Complex),
            "armour" | "armor" => Ok(ItemFilter::Category(ItemCategory::Armour)),
            "weapon" => Ok(ItemFilter::Category(ItemCategory::Weapon)),
            "recipe" => Ok(ItemFilter::Category(ItemCategory::Recipe)),
            "fragment" => Ok(ItemFilter::Category(ItemCategory::Fragment)),
            "material" => Ok(ItemFilter::Category(ItemCategory::Material)),
            other => Err(format!(
                "unknown item filter '{}'. Use all, basic, complex, armour, weapon, recipe, or fragment.",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<Item> {
        vec![
            Item::new("01", "Thread", false),
            Item::new("a01", "Hat", true),
            Item::new("k01", "Hat part", false),
            Item::new("w01", "Wooden sword", true),
            Item::new("w02", "Broken sword", false),
        ]
    }

    fn ids(filter: ItemFilter) -> Vec<String> {
        items()
            .into_iter()
            .filter(|i| filter.matches(i))
            .map(|i| i.id)
            .collect()
    }

    #[test]
    fn test_basic_is_not_complex() {
        assert_eq!(ids(ItemFilter::Basic), vec!["01", "k01", "w02"]);
        assert_eq!(ids(ItemFilter::Complex), vec!["a01", "w01"]);
    }

    #[test]
    fn test_weapon_ignores_complexity() {
        let f: ItemFilter = "weapon".parse().unwrap();
        assert_eq!(ids(f), vec!["w01", "w02"]);
    }

    #[test]
    fn test_key_roundtrip_for_menu() {
        for f in ItemFilter::MENU {
            assert_eq!(f.key().parse::<ItemFilter>().unwrap(), f);
        }
    }

    #[test]
    fn test_unknown_filter() {
        assert!("potions".parse::<ItemFilter>().is_err());
    }

    #[test]
    fn test_sql_condition_binds_prefix() {
        let cond = ItemFilter::Category(ItemCategory::Fragment).sql_condition();
        assert_eq!(cond.param.as_deref(), Some("k"));
        assert!(ItemFilter::All.sql_condition().param.is_none());
    }
}
