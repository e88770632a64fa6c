//! Chat flow tests: updates in, transport actions out.
//!
//! The dispatcher runs against the in-memory store; updates are built from
//! Bot API JSON the way Telegram delivers them.

use std::sync::Arc;

use craftbook::config::CHAT_WARS_BOT_ID;
use craftbook::dispatch::{Dispatcher, Outgoing, Reply, HELP_TEXT, SUBMIT_PROMPT, WELCOME_TEXT};
use craftbook::telegram::Update;
use craftbook_core::models::Item;
use craftbook_core::store::memory::InMemoryStore;
use craftbook_core::store::Store;
use serde_json::{json, Value};

const CHAT: i64 = 555;

async fn setup() -> (Arc<InMemoryStore>, Dispatcher) {
    let store = Arc::new(InMemoryStore::new());
    for item in [
        Item::new("05", "Coal", false),
        Item::new("08", "Iron ore", false),
        Item::new("09", "Cloth", false),
        Item::new("19", "Steel", false),
        Item::new("a06", "Leather shirt", false),
        Item::new("w02", "Short sword", false),
        Item::new("w11", "Hunter Bow", false),
    ] {
        store.insert_item(&item).await.unwrap();
    }
    store
        .add_recipe("19", &[("08".into(), 3), ("05".into(), 1)])
        .await
        .unwrap();
    store.add_recipe("w02", &[("19".into(), 2)]).await.unwrap();

    let dyn_store: Arc<dyn Store> = store.clone();
    let dispatcher = Dispatcher::new(dyn_store, vec![CHAT_WARS_BOT_ID]);
    (store, dispatcher)
}

fn user() -> Value {
    json!({"id": 42, "is_bot": false, "first_name": "Ann", "username": "ann"})
}

fn text_update(text: &str) -> Update {
    serde_json::from_value(json!({
        "update_id": 1,
        "message": {
            "message_id": 10,
            "chat": {"id": CHAT, "type": "private"},
            "from": user(),
            "text": text
        }
    }))
    .unwrap()
}

fn forwarded_update(text: &str, from_id: i64) -> Update {
    serde_json::from_value(json!({
        "update_id": 2,
        "message": {
            "message_id": 11,
            "chat": {"id": CHAT, "type": "private"},
            "from": user(),
            "forward_origin": {
                "type": "user",
                "date": 0,
                "sender_user": {"id": from_id, "is_bot": true, "first_name": "Chat Wars"}
            },
            "text": text
        }
    }))
    .unwrap()
}

fn callback_update(data: &str) -> Update {
    serde_json::from_value(json!({
        "update_id": 3,
        "callback_query": {
            "id": "cb1",
            "from": user(),
            "message": {"message_id": 77, "chat": {"id": CHAT, "type": "private"}},
            "data": data
        }
    }))
    .unwrap()
}

fn inline_update(query: &str) -> Update {
    serde_json::from_value(json!({
        "update_id": 4,
        "inline_query": {"id": "iq1", "from": user(), "query": query, "offset": ""}
    }))
    .unwrap()
}

fn single_reply(out: Vec<Outgoing>) -> Reply {
    match out.as_slice() {
        [Outgoing::Send { chat_id, reply }] => {
            assert_eq!(*chat_id, CHAT);
            reply.clone()
        }
        other => panic!("expected one message, got {:?}", other),
    }
}

#[tokio::test]
async fn test_static_commands() {
    let (_, d) = setup().await;
    assert_eq!(single_reply(d.handle(&text_update("/start")).await).text, WELCOME_TEXT);
    assert_eq!(single_reply(d.handle(&text_update("/help")).await).text, HELP_TEXT);
    assert_eq!(
        single_reply(d.handle(&text_update("/help@CraftBot")).await).text,
        HELP_TEXT
    );
    assert!(d.handle(&text_update("/unknown")).await.is_empty());
    assert!(d.handle(&text_update("hello there")).await.is_empty());
}

#[tokio::test]
async fn test_every_update_records_the_sender() {
    let (store, d) = setup().await;
    d.handle(&inline_update("")).await;
    let recorded = store.get_user(42).await.unwrap().unwrap();
    assert_eq!(recorded.first_name, "Ann");
    assert!(recorded.last_seen > 0);
}

#[tokio::test]
async fn test_craft_command_variants() {
    let (_, d) = setup().await;

    let reply = single_reply(d.handle(&text_update("/craft")).await);
    assert!(reply.keyboard.is_some());

    let reply = single_reply(d.handle(&text_update("/craft_code")).await);
    assert!(reply.text.contains("silly goose"));

    let reply = single_reply(d.handle(&text_update("/craft_")).await);
    assert_eq!(reply.text, HELP_TEXT);

    let reply = single_reply(d.handle(&text_update("/craft_zz")).await);
    assert!(reply.text.contains("not in the database"));

    let reply = single_reply(d.handle(&text_update("/craft_08")).await);
    assert!(reply.text.starts_with("<b>Iron ore</b> cannot be crafted."));
    assert!(reply.text.contains("Used in:"));
    assert!(reply.keyboard.is_none());
}

#[tokio::test]
async fn test_craft_card_expansion_and_buttons() {
    let (_, d) = setup().await;
    let reply = single_reply(d.handle(&text_update("/craft_w02")).await);

    assert!(reply.text.starts_with("<b>Short sword</b>"));
    assert!(reply.text.contains("  2 x Steel</code> (/craft_19)"));
    assert!(reply.text.contains("<code>  2 x Coal</code>"));
    assert!(reply.text.contains("<code>   6 x Iron ore</code>"));

    let kb = reply.keyboard.expect("ingredient buttons");
    assert_eq!(kb.inline_keyboard.len(), 1);
    assert_eq!(
        kb.inline_keyboard[0][0].switch_inline_query.as_deref(),
        Some("19-2")
    );
}

#[tokio::test]
async fn test_search_command() {
    let (_, d) = setup().await;

    let reply = single_reply(d.handle(&text_update("/search iron")).await);
    assert!(reply.text.starts_with("<b>Iron ore</b> cannot be crafted."));

    let reply = single_reply(d.handle(&text_update("/search s")).await);
    assert!(reply.text.starts_with("<b>Matching items</b>"));

    let reply = single_reply(d.handle(&text_update("/search dragon")).await);
    assert!(reply.text.contains("No items found"));

    let reply = single_reply(d.handle(&text_update("/search")).await);
    assert!(reply.text.starts_with("Usage"));
}

#[tokio::test]
async fn test_stock_forward_from_trusted_sender_only() {
    let (_, d) = setup().await;

    let reply = single_reply(
        d.handle(&forwarded_update("/a_08 Iron ore x 12\n/a_05 Coal x 3", CHAT_WARS_BOT_ID))
            .await,
    );
    assert!(reply.text.starts_with("Stock updated!"));

    let reply = single_reply(d.handle(&forwarded_update("Nothing here", CHAT_WARS_BOT_ID)).await);
    assert!(reply.text.contains("/more"));

    // Same text from anyone else is just chatter.
    assert!(d
        .handle(&forwarded_update("/a_08 Iron ore x 12", 999))
        .await
        .is_empty());
}

#[tokio::test]
async fn test_submit_flow() {
    let (store, d) = setup().await;

    assert_eq!(single_reply(d.handle(&text_update("/submit")).await).text, SUBMIT_PROMPT);
    assert!(d.is_awaiting_recipe(CHAT));

    // Unrecognised format keeps the session open.
    let reply = single_reply(d.handle(&forwarded_update("gibberish", CHAT_WARS_BOT_ID)).await);
    assert!(reply.text.contains("not a valid recipe"));
    assert!(d.is_awaiting_recipe(CHAT));

    let recipe = "📃Hunter Bow (recipe):\nIron ore x 5\nCloth x 2";
    let reply = single_reply(d.handle(&forwarded_update(recipe, CHAT_WARS_BOT_ID)).await);
    assert!(reply.text.contains("<b>Hunter Bow</b>"), "{}", reply.text);
    assert!(!d.is_awaiting_recipe(CHAT));
    assert_eq!(store.recipe_of("w11").await.unwrap().len(), 2);

    // Resubmitting the same recipe is a duplicate and ends the session.
    single_reply(d.handle(&text_update("/submit")).await);
    let reply = single_reply(d.handle(&forwarded_update(recipe, CHAT_WARS_BOT_ID)).await);
    assert!(reply.text.contains("already in my database"));
    assert!(!d.is_awaiting_recipe(CHAT));
}

#[tokio::test]
async fn test_submit_unknown_ingredient_and_cancel() {
    let (store, d) = setup().await;

    single_reply(d.handle(&text_update("/submit")).await);
    let reply = single_reply(
        d.handle(&forwarded_update(
            "📃Leather shirt (recipe):\nCloth x 2\nDragon scale x 1",
            CHAT_WARS_BOT_ID,
        ))
        .await,
    );
    assert!(reply.text.contains("<b>Dragon scale</b> is not in my database"));
    assert!(store.recipe_of("a06").await.unwrap().is_empty());
    assert!(!d.is_awaiting_recipe(CHAT));

    single_reply(d.handle(&text_update("/submit")).await);
    let reply = single_reply(d.handle(&text_update("/cancel")).await);
    assert!(reply.text.contains("cancelled"));
    assert!(!d.is_awaiting_recipe(CHAT));

    let reply = single_reply(d.handle(&text_update("/cancel")).await);
    assert!(reply.text.contains("nothing to cancel"));
}

#[tokio::test]
async fn test_tavern_hint_submission() {
    let (store, d) = setup().await;
    single_reply(d.handle(&text_update("/submit")).await);

    let hint = "The old man mentioned the recipe of Leather shirt saying that you need 3 Cloth.";
    let reply = single_reply(d.handle(&forwarded_update(hint, CHAT_WARS_BOT_ID)).await);
    assert!(reply.text.contains("Leather shirt"));

    let recipe = store.recipe_of("a06").await.unwrap();
    assert_eq!(recipe.len(), 1);
    assert_eq!(recipe[0].quantity, 3);
    assert!(store.get_item("a06").await.unwrap().unwrap().complex);
}

#[tokio::test]
async fn test_filter_callback_edits_message() {
    let (_, d) = setup().await;
    let out = d.handle(&callback_update("list|weapon")).await;

    assert_eq!(
        out[0],
        Outgoing::AnswerCallback {
            id: "cb1".into(),
            text: Some("Filtering...".into())
        }
    );
    match &out[1] {
        Outgoing::Edit {
            chat_id,
            message_id,
            reply,
        } => {
            assert_eq!((*chat_id, *message_id), (CHAT, 77));
            assert_eq!(
                reply.text,
                "<b>Weapon items</b>\nw02 - Short sword (/craft_w02)\nw11 - Hunter Bow\n"
            );
            assert!(reply.keyboard.is_some());
        }
        other => panic!("expected edit, got {:?}", other),
    }

    let out = d.handle(&callback_update("noise")).await;
    assert_eq!(out.len(), 1);
}

#[tokio::test]
async fn test_inline_scaled_expansion() {
    let (_, d) = setup().await;
    let out = d.handle(&inline_update("19-4")).await;

    let [Outgoing::AnswerInline { id, results }] = out.as_slice() else {
        panic!("expected inline answer, got {:?}", out);
    };
    assert_eq!(id, "iq1");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title, "4 x Steel");
    let text = &results[0].input_message_content.message_text;
    assert!(text.contains("12 x Iron ore"));
    assert!(text.contains("4 x Coal"));
}

#[tokio::test]
async fn test_inline_keyword_search() {
    let (_, d) = setup().await;
    let out = d.handle(&inline_update("s")).await;

    let [Outgoing::AnswerInline { results, .. }] = out.as_slice() else {
        panic!("expected inline answer, got {:?}", out);
    };
    let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["19", "a06", "w02"]);
    assert!(results[1]
        .input_message_content
        .message_text
        .contains("cannot be crafted"));

    let out = d.handle(&inline_update("zz-3")).await;
    assert_eq!(
        out,
        vec![Outgoing::AnswerInline {
            id: "iq1".into(),
            results: vec![]
        }]
    );
}
