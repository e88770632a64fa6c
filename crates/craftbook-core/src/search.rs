//! Free-text item search.
//!
//! Every keyword must appear in the item name (case-insensitive). The
//! caller decides how to present the outcome: a single hit behaves exactly
//! like a direct `/craft_<id>` lookup, several hits become a listing.

use crate::error::Result;
use crate::models::Item;
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    None,
    Single(Item),
    Many(Vec<Item>),
}

/// Split a raw query into keywords.
pub fn keywords(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_string).collect()
}

pub async fn search(store: &dyn Store, keywords: &[String]) -> Result<SearchOutcome> {
    let mut found = store.search_items(keywords).await?;
    Ok(match found.len() {
        0 => SearchOutcome::None,
        1 => SearchOutcome::Single(found.remove(0)),
        _ => SearchOutcome::Many(found),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;

    async fn store() -> InMemoryStore {
        let store = InMemoryStore::new();
        for item in [
            Item::new("w01", "Iron Sword", true),
            Item::new("a01", "Iron Shield", true),
            Item::new("01", "Thread", false),
        ] {
            store.insert_item(&item).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_all_keywords_must_match() {
        let store = store().await;
        let outcome = search(&store, &keywords("iron sword")).await.unwrap();
        assert_eq!(
            outcome,
            SearchOutcome::Single(Item::new("w01", "Iron Sword", true))
        );
    }

    #[tokio::test]
    async fn test_many_and_none() {
        let store = store().await;
        match search(&store, &keywords("IRON")).await.unwrap() {
            SearchOutcome::Many(items) => {
                let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
                assert_eq!(ids, vec!["a01", "w01"]);
            }
            other => panic!("expected many, got {:?}", other),
        }
        assert_eq!(
            search(&store, &keywords("mithril")).await.unwrap(),
            SearchOutcome::None
        );
    }
}
