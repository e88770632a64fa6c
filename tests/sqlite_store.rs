//! Integration tests for the SQLite store.
//!
//! Each test opens a fresh database in a temp directory and checks that
//! the SQLite implementation behaves like the in-memory one.

use std::sync::Arc;

use craftbook::db;
use craftbook::migrate;
use craftbook::sqlite_store::SqliteStore;
use craftbook_core::error::CraftError;
use craftbook_core::filter::ItemFilter;
use craftbook_core::models::{Item, User};
use craftbook_core::store::memory::InMemoryStore;
use craftbook_core::store::Store;
use craftbook_core::workflow;
use tempfile::TempDir;

async fn open(tmp: &TempDir) -> SqliteStore {
    let pool = db::connect_path(&tmp.path().join("data/test.sqlite"))
        .await
        .unwrap();
    migrate::apply(&pool).await.unwrap();
    SqliteStore::new(pool)
}

fn items() -> Vec<Item> {
    vec![
        Item::new("01", "Thread", false),
        Item::new("02", "Stick", false),
        Item::new("19", "Steel", false),
        Item::new("a01", "Hat", false),
        Item::new("k11", "Hunter Bow part", false),
        Item::new("r11", "Hunter Bow recipe", false),
        Item::new("w01", "Wooden sword", false),
        Item::new("w11", "Hunter Bow", false),
    ]
}

async fn fill(store: &dyn Store) {
    for item in items() {
        assert!(store.insert_item(&item).await.unwrap());
    }
    store
        .add_recipe("w01", &[("02".into(), 3)])
        .await
        .unwrap();
    store
        .add_recipe("a01", &[("01".into(), 4), ("19".into(), 1)])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let tmp = TempDir::new().unwrap();
    let store = open(&tmp).await;
    migrate::apply(store.pool()).await.unwrap();
    assert_eq!(store.item_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_insert_item_keeps_first() {
    let tmp = TempDir::new().unwrap();
    let store = open(&tmp).await;

    assert!(store.insert_item(&Item::new("01", "Thread", false)).await.unwrap());
    assert!(!store.insert_item(&Item::new("01", "Renamed", true)).await.unwrap());

    let got = store.get_item("01").await.unwrap().unwrap();
    assert_eq!(got, Item::new("01", "Thread", false));
}

#[tokio::test]
async fn test_add_recipe_marks_result_complex() {
    let tmp = TempDir::new().unwrap();
    let store = open(&tmp).await;
    fill(&store).await;

    assert!(store.get_item("w01").await.unwrap().unwrap().complex);
    assert!(!store.get_item("02").await.unwrap().unwrap().complex);
    assert_eq!(store.edge_count().await.unwrap(), 3);

    let recipe = store.recipe_of("a01").await.unwrap();
    let ids: Vec<(&str, u32)> = recipe.iter().map(|l| (l.item.id.as_str(), l.quantity)).collect();
    assert_eq!(ids, vec![("01", 4), ("19", 1)]);

    let used: Vec<String> = store
        .used_in("02")
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.item.id)
        .collect();
    assert_eq!(used, vec!["w01".to_string()]);
}

#[tokio::test]
async fn test_duplicate_edge_is_rejected_without_writes() {
    let tmp = TempDir::new().unwrap();
    let store = open(&tmp).await;
    fill(&store).await;

    store
        .add_recipe("w11", &[("k11".into(), 3), ("r11".into(), 1)])
        .await
        .unwrap();

    // r11 is new for a01, but 01 already exists: nothing may land.
    let err = store
        .add_recipe("a01", &[("r11".into(), 1), ("01".into(), 4)])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CraftError::DuplicateEdge { ref result, ref ingredient } if result == "a01" && ingredient == "01"
    ));
    assert_eq!(store.recipe_of("a01").await.unwrap().len(), 2);
    assert_eq!(store.edge_count().await.unwrap(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_submissions_one_wins_rest_are_duplicates() {
    let tmp = TempDir::new().unwrap();
    let store = Arc::new(open(&tmp).await);
    fill(store.as_ref()).await;

    let parts: Vec<(String, u32)> = ["01", "02", "19"]
        .iter()
        .map(|id| (id.to_string(), 2))
        .collect();
    for result in ["w11", "k11", "r11"] {
        let mut tasks = Vec::new();
        for _ in 0..4 {
            let store = store.clone();
            let parts = parts.clone();
            tasks.push(tokio::spawn(async move {
                store.add_recipe(result, &parts).await
            }));
        }

        let mut won = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(()) => won += 1,
                Err(CraftError::DuplicateEdge { result: r, .. }) => assert_eq!(r, result),
                Err(other) => panic!("{}: unexpected error {:?}", result, other),
            }
        }
        assert_eq!(won, 1, "{}", result);
        assert_eq!(store.recipe_of(result).await.unwrap().len(), 3);
    }
    assert_eq!(store.edge_count().await.unwrap(), 12);
}

#[tokio::test]
async fn test_unknown_ids_and_self_edges() {
    let tmp = TempDir::new().unwrap();
    let store = open(&tmp).await;
    fill(&store).await;

    let err = store.add_recipe("zz", &[("01".into(), 1)]).await.unwrap_err();
    assert!(matches!(err, CraftError::NotFound(ref id) if id == "zz"));

    let err = store
        .add_recipe("w11", &[("k11".into(), 1), ("nope".into(), 1)])
        .await
        .unwrap_err();
    assert!(matches!(err, CraftError::NotFound(ref id) if id == "nope"));
    assert!(store.recipe_of("w11").await.unwrap().is_empty());
    assert!(!store.get_item("w11").await.unwrap().unwrap().complex);

    let err = store.add_recipe("w11", &[("w11".into(), 1)]).await.unwrap_err();
    assert!(matches!(err, CraftError::CycleDetected { .. }));

    // Rejected before the quantity CHECK constraint can fail the write.
    let err = store
        .add_recipe("w11", &[("k11".into(), 2), ("r11".into(), 0)])
        .await
        .unwrap_err();
    assert!(matches!(err, CraftError::ZeroQuantity { ref ingredient, .. } if ingredient == "r11"));
    assert!(err.is_recoverable());
    assert!(store.recipe_of("w11").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_filters_match_in_memory_store() {
    let tmp = TempDir::new().unwrap();
    let sqlite = open(&tmp).await;
    let memory = InMemoryStore::new();
    fill(&sqlite).await;
    fill(&memory).await;

    for filter in ItemFilter::MENU {
        let a = sqlite.list_items(filter).await.unwrap();
        let b = memory.list_items(filter).await.unwrap();
        assert_eq!(a, b, "filter {}", filter);
        assert!(a.iter().all(|i| filter.matches(i)));
        assert!(a.windows(2).all(|w| w[0].id < w[1].id));
    }

    let weapons: Vec<String> = sqlite
        .list_items(ItemFilter::MENU[3])
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.id)
        .collect();
    assert_eq!(weapons, vec!["w01".to_string(), "w11".to_string()]);
}

#[tokio::test]
async fn test_search_and_name_lookup() {
    let tmp = TempDir::new().unwrap();
    let store = open(&tmp).await;
    fill(&store).await;

    let hits = store
        .search_items(&["hunter".into(), "BOW".into()])
        .await
        .unwrap();
    let ids: Vec<&str> = hits.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["k11", "r11", "w11"]);

    assert!(store.search_items(&[" ".into()]).await.unwrap().is_empty());

    let exact = store.find_item_by_name("Hunter Bow").await.unwrap().unwrap();
    assert_eq!(exact.id, "w11");
    let folded = store.find_item_by_name("wooden SWORD").await.unwrap().unwrap();
    assert_eq!(folded.id, "w01");
    assert!(store.find_item_by_name("Dragon").await.unwrap().is_none());
}

#[tokio::test]
async fn test_upsert_user_updates_in_place() {
    let tmp = TempDir::new().unwrap();
    let store = open(&tmp).await;

    let mut user = User {
        id: 42,
        first_name: "Ann".into(),
        is_bot: false,
        last_name: None,
        username: Some("ann".into()),
        language_code: Some("en".into()),
        last_seen: 100,
    };
    store.upsert_user(&user).await.unwrap();

    user.last_name = Some("Lee".into());
    user.last_seen = 200;
    store.upsert_user(&user).await.unwrap();

    let got = store.get_user(42).await.unwrap().unwrap();
    assert_eq!(got, user);
    assert!(store.get_user(7).await.unwrap().is_none());
}

#[tokio::test]
async fn test_submission_workflow_over_sqlite() {
    let tmp = TempDir::new().unwrap();
    let store = open(&tmp).await;
    fill(&store).await;

    let sub = craftbook_core::parse::parse_submission(
        "📃Hunter Bow (recipe):\nHunter Bow part x 3\nHunter Bow recipe x 1",
    )
    .unwrap();
    let done = workflow::submit_recipe(&store, &sub).await.unwrap();
    assert_eq!(done.edges_added, 2);

    let view = workflow::craft_view(&store, "w11").await.unwrap();
    let expansion = view.expansion.unwrap();
    assert_eq!(expansion.totals["Hunter Bow part"], 3);
    assert_eq!(expansion.totals["Hunter Bow recipe"], 1);

    let again = workflow::submit_recipe(&store, &sub).await.unwrap_err();
    assert!(matches!(again, CraftError::DuplicateEdge { .. }));
}
