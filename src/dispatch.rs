//! Update routing.
//!
//! [`Dispatcher::handle`] turns one Telegram [`Update`] into the list of
//! [`Outgoing`] actions the transport should perform. It never talks to
//! the network itself, which keeps every chat flow testable against the
//! in-memory store.
//!
//! # Routes
//!
//! | Input | Handler |
//! |-------|---------|
//! | `/start`, `/help` | static text |
//! | `/craft` | filter keyboard |
//! | `/craft_<id>` | recipe card + expansion |
//! | `/search <words>` | keyword search |
//! | `/submit`, `/cancel` | enter / leave recipe submission |
//! | trusted forward | recipe submission (when awaiting) or stock report |
//! | callback `list\|<filter>` | edit message into a filtered listing |
//! | inline query | `<id>-<count>` expansion or keyword search |

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use craftbook_core::error::CraftError;
use craftbook_core::filter::ItemFilter;
use craftbook_core::models::Item;
use craftbook_core::parse::{parse_stock, parse_submission};
use craftbook_core::render::{self, escape_html};
use craftbook_core::search::{keywords, search, SearchOutcome};
use craftbook_core::store::Store;
use craftbook_core::workflow::{self, CraftView};

use crate::telegram::{
    CallbackQuery, InlineKeyboardButton, InlineKeyboardMarkup, InlineQuery,
    InlineQueryResultArticle, Message, TelegramClient, Update,
};

/// Inline answers are capped to keep the result list scannable.
const MAX_INLINE_RESULTS: usize = 10;

pub const WELCOME_TEXT: &str = "Welcome to Chat Wars Crafts Bot.\nCheck out /help for more information!";

pub const HELP_TEXT: &str = "This bot was created to help you with your \
<a href='http://t.me/chtwrsbot'>Chat Wars</a> crafting needs.\n\n\
To get started, please forward your /more from @chtwrsbot to me.\n\
You may also view all available craftable items with the /craft command.\n\
To view the crafting recipe for a specific item you may use the /craft_code command, \
where <code>code</code> is the item code of the item to craft.\n\
Use /search followed by some words to find an item by name.\n\n\
To add a recipe to the database, you may use the /submit command.";

pub const SUBMIT_PROMPT: &str =
    "Please forward me the recipe from @chtwrsbot that you would like to submit.";

pub const SUBMIT_CANCELLED: &str = "Recipe submission cancelled. Thank you for trying ^.^";

pub const STOCK_HINT: &str =
    "Send the /more command to @chtwrsbot and forward the stock result here.";

/// Text plus optional inline keyboard, always sent with HTML parse mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<InlineKeyboardMarkup>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: InlineKeyboardMarkup) -> Self {
        if !keyboard.inline_keyboard.is_empty() {
            self.keyboard = Some(keyboard);
        }
        self
    }
}

/// One transport action produced by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    Send {
        chat_id: i64,
        reply: Reply,
    },
    Edit {
        chat_id: i64,
        message_id: i64,
        reply: Reply,
    },
    AnswerCallback {
        id: String,
        text: Option<String>,
    },
    AnswerInline {
        id: String,
        results: Vec<InlineQueryResultArticle>,
    },
}

pub struct Dispatcher {
    store: Arc<dyn Store>,
    trusted_forwarders: Vec<i64>,
    /// Chats currently in the `/submit` flow.
    awaiting_recipe: Mutex<HashSet<i64>>,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn Store>, trusted_forwarders: Vec<i64>) -> Self {
        Self {
            store,
            trusted_forwarders,
            awaiting_recipe: Mutex::new(HashSet::new()),
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn is_awaiting_recipe(&self, chat_id: i64) -> bool {
        self.sessions().contains(&chat_id)
    }

    fn sessions(&self) -> std::sync::MutexGuard<'_, HashSet<i64>> {
        self.awaiting_recipe
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_awaiting(&self, chat_id: i64, awaiting: bool) -> bool {
        let mut sessions = self.sessions();
        if awaiting {
            sessions.insert(chat_id)
        } else {
            sessions.remove(&chat_id)
        }
    }

    /// Handle one update and return the actions to perform.
    pub async fn handle(&self, update: &Update) -> Vec<Outgoing> {
        self.record_sender(update).await;

        if let Some(msg) = &update.message {
            return self.on_message(msg).await;
        }
        if let Some(cb) = &update.callback_query {
            return self.on_callback(cb).await;
        }
        if let Some(q) = &update.inline_query {
            return self.on_inline_query(q).await;
        }
        Vec::new()
    }

    async fn record_sender(&self, update: &Update) {
        let Some(sender) = update.sender() else {
            return;
        };
        let user = sender.to_user(chrono::Utc::now().timestamp());
        tracing::debug!(user_id = user.id, name = %user.full_name(), "create or update user");
        if let Err(err) = self.store.upsert_user(&user).await {
            tracing::warn!(user_id = user.id, error = %err, "failed to record user");
        }
    }

    // ── messages ────────────────────────────────────────────────────────

    async fn on_message(&self, msg: &Message) -> Vec<Outgoing> {
        let chat_id = msg.chat.id;
        let Some(text) = msg.text.as_deref() else {
            return Vec::new();
        };

        let trusted_forward = msg
            .forwarded_from_id()
            .is_some_and(|id| self.trusted_forwarders.contains(&id));

        let reply = if trusted_forward {
            if self.is_awaiting_recipe(chat_id) {
                self.on_submission(chat_id, text).await
            } else {
                self.on_stock(text).await
            }
        } else if let Some(command) = text.strip_prefix('/') {
            match self.on_command(chat_id, command).await {
                Some(reply) => reply,
                None => return Vec::new(),
            }
        } else if self.is_awaiting_recipe(chat_id) {
            Reply::text(SUBMIT_PROMPT)
        } else {
            return Vec::new();
        };

        vec![Outgoing::Send { chat_id, reply }]
    }

    async fn on_command(&self, chat_id: i64, command: &str) -> Option<Reply> {
        let (head, args) = match command.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (command, ""),
        };
        // `/craft@SomeBot` in groups
        let head = head.split('@').next().unwrap_or(head);

        let reply = match head {
            "start" => Reply::text(WELCOME_TEXT),
            "help" => Reply::text(HELP_TEXT),
            "craft" => Reply::text("Which items would you like to view?")
                .with_keyboard(filter_keyboard()),
            "search" => self.on_search(args).await,
            "submit" => {
                self.set_awaiting(chat_id, true);
                Reply::text(SUBMIT_PROMPT)
            }
            "cancel" => {
                if self.set_awaiting(chat_id, false) {
                    Reply::text(SUBMIT_CANCELLED)
                } else {
                    Reply::text("There is nothing to cancel.")
                }
            }
            other => match other.strip_prefix("craft_") {
                Some("") => Reply::text(HELP_TEXT),
                Some("code") => Reply::text(
                    "Replace code with an actual item code you silly goose! eg. /craft_24",
                ),
                Some(id) => self.on_craft(id).await,
                None => return None,
            },
        };
        Some(reply)
    }

    async fn on_craft(&self, id: &str) -> Reply {
        tracing::debug!(item_id = %id, "fetching recipe");
        match workflow::craft_view(self.store(), id).await {
            Ok(view) => craft_reply(&view),
            Err(err) => error_reply(&err),
        }
    }

    async fn on_search(&self, query: &str) -> Reply {
        let words = keywords(query);
        if words.is_empty() {
            return Reply::text("Usage: /search <i>words from the item name</i>");
        }
        match search(self.store(), &words).await {
            Ok(SearchOutcome::None) => Reply::text(render::render_no_results(query)),
            Ok(SearchOutcome::Single(item)) => self.on_craft(&item.id).await,
            Ok(SearchOutcome::Many(items)) => Reply::text(render::render_listing("Matching", &items)),
            Err(err) => error_reply(&err),
        }
    }

    async fn on_submission(&self, chat_id: i64, text: &str) -> Reply {
        let submission = match parse_submission(text) {
            Ok(sub) => sub,
            Err(err) => return error_reply(&err),
        };

        let outcome = workflow::submit_recipe(self.store(), &submission).await;
        // Anything but a format mismatch ends the conversation.
        self.set_awaiting(chat_id, false);

        match outcome {
            Ok(done) => Reply::text(format!(
                "Thanks for submitting the recipe for <b>{}</b>!",
                escape_html(&done.result.name)
            )),
            Err(err) => error_reply(&err),
        }
    }

    async fn on_stock(&self, text: &str) -> Reply {
        let lines = parse_stock(text);
        if lines.is_empty() {
            return Reply::text(STOCK_HINT);
        }
        match workflow::apply_stock(self.store(), &lines).await {
            Ok(n) => Reply::text(format!("Stock updated! ({} items)", n)),
            Err(err) => error_reply(&err),
        }
    }

    // ── callbacks ───────────────────────────────────────────────────────

    async fn on_callback(&self, cb: &CallbackQuery) -> Vec<Outgoing> {
        let data = cb.data.as_deref().unwrap_or_default();
        let Some(key) = data.strip_prefix("list|") else {
            return vec![Outgoing::AnswerCallback {
                id: cb.id.clone(),
                text: None,
            }];
        };

        let mut out = vec![Outgoing::AnswerCallback {
            id: cb.id.clone(),
            text: Some("Filtering...".to_string()),
        }];

        let text = match key.parse::<ItemFilter>() {
            Ok(filter) => match self.store.list_items(filter).await {
                Ok(items) => render::render_filter_listing(filter, &items),
                Err(err) => error_reply(&err).text,
            },
            Err(_) => render::render_listing(&render::title_case(key), &[]),
        };

        if let Some(msg) = &cb.message {
            out.push(Outgoing::Edit {
                chat_id: msg.chat.id,
                message_id: msg.message_id,
                reply: Reply::text(text).with_keyboard(filter_keyboard()),
            });
        }
        out
    }

    // ── inline queries ──────────────────────────────────────────────────

    async fn on_inline_query(&self, q: &InlineQuery) -> Vec<Outgoing> {
        let results = match parse_scaled_ref(&q.query) {
            Some((id, count)) => self.inline_expansion(id, count).await,
            None => self.inline_search(&q.query).await,
        };
        vec![Outgoing::AnswerInline {
            id: q.id.clone(),
            results,
        }]
    }

    async fn inline_expansion(&self, id: &str, count: u64) -> Vec<InlineQueryResultArticle> {
        let item = match self.store.get_item(id).await {
            Ok(Some(item)) => item,
            Ok(None) => return Vec::new(),
            Err(err) => {
                tracing::error!(error = %err, "inline lookup failed");
                return Vec::new();
            }
        };
        let text = match expansion_text(self.store(), &item, count).await {
            Ok(text) => text,
            Err(err) => error_reply(&err).text,
        };
        let title = format!("{} x {}", count, item.name);
        vec![InlineQueryResultArticle::html(format!("{}-{}", item.id, count), title, text)]
    }

    async fn inline_search(&self, query: &str) -> Vec<InlineQueryResultArticle> {
        let words = keywords(query);
        if words.is_empty() {
            return Vec::new();
        }
        let items = match self.store.search_items(&words).await {
            Ok(items) => items,
            Err(err) => {
                tracing::error!(error = %err, "inline search failed");
                return Vec::new();
            }
        };

        let mut results = Vec::new();
        for item in items.into_iter().take(MAX_INLINE_RESULTS) {
            let text = match expansion_text(self.store(), &item, 1).await {
                Ok(text) => text,
                Err(err) => error_reply(&err).text,
            };
            let mut article = InlineQueryResultArticle::html(item.id.clone(), item.name.clone(), text);
            article.description = Some(if item.complex {
                format!("/craft_{}", item.id)
            } else {
                "cannot be crafted".to_string()
            });
            results.push(article);
        }
        results
    }
}

/// Expansion view for `count` units, or the fixed text for base items.
async fn expansion_text(
    store: &dyn Store,
    item: &Item,
    count: u64,
) -> craftbook_core::Result<String> {
    if !item.complex {
        return Ok(render::render_not_craftable(item));
    }
    let expansion = workflow::expand_item(store, item, count).await?;
    Ok(render::render_expansion(
        item,
        count,
        &expansion.lines,
        &expansion.totals,
    ))
}

/// `"<id>-<count>"` as produced by ingredient buttons.
fn parse_scaled_ref(query: &str) -> Option<(&str, u64)> {
    let (id, count) = query.trim().rsplit_once('-')?;
    let count: u64 = count.parse().ok().filter(|c| *c > 0)?;
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some((id, count))
}

fn craft_reply(view: &CraftView) -> Reply {
    let mut text = render::render_recipe_card(&view.item, &view.direct, &view.used_in);
    if let Some(expansion) = &view.expansion {
        text.push_str("\n\n<b>Crafting tree:</b>\n");
        text.push_str(&render::render_tree(&expansion.lines));
        text.push('\n');
        text.push_str(&render::render_totals(&expansion.totals));
    }

    let keyboard = InlineKeyboardMarkup {
        inline_keyboard: render::ingredient_refs(&view.direct)
            .into_iter()
            .map(|r| vec![InlineKeyboardButton::inline_query(r.name.clone(), r.inline_query())])
            .collect(),
    };
    Reply::text(text).with_keyboard(keyboard)
}

/// User-facing text for every error kind.
pub fn error_reply(err: &CraftError) -> Reply {
    let text = match err {
        CraftError::ParseMismatch => {
            "That is not a valid recipe. Please forward it again or /cancel to cancel.".to_string()
        }
        CraftError::UnknownItem(name) => format!(
            "<b>{}</b> is not in my database. Cancelling recipe submission.",
            escape_html(name)
        ),
        CraftError::DuplicateEdge { .. } => {
            "That recipe is already in my database, nothing was changed.".to_string()
        }
        CraftError::ZeroQuantity { ingredient, .. } => format!(
            "A recipe cannot need zero of item {}. Nothing was changed.",
            escape_html(ingredient)
        ),
        CraftError::NotFound(_) => "I'm sorry, but that item is not in the database.".to_string(),
        CraftError::CycleDetected { path } => format!(
            "The recipe data for this item loops back on itself ({}). Please report it.",
            escape_html(&path.join(" → "))
        ),
        CraftError::QuantityOverflow(_) => "That is far too many items to count.".to_string(),
        CraftError::NotCraftable(id) => format!("Item {} cannot be crafted.", escape_html(id)),
        CraftError::Store(inner) => {
            tracing::error!(error = %inner, "store failure");
            "Something went wrong on my side. Please try again later.".to_string()
        }
    };
    Reply::text(text)
}

/// The `/craft` filter menu: one wide row, then pairs.
pub fn filter_keyboard() -> InlineKeyboardMarkup {
    let buttons: Vec<InlineKeyboardButton> = ItemFilter::MENU
        .iter()
        .map(|f| InlineKeyboardButton::callback(f.label(), format!("list|{}", f.key())))
        .collect();

    let mut rows = Vec::new();
    let mut iter = buttons.into_iter();
    if let Some(first) = iter.next() {
        rows.push(vec![first]);
    }
    let rest: Vec<InlineKeyboardButton> = iter.collect();
    for pair in rest.chunks(2) {
        rows.push(pair.to_vec());
    }
    InlineKeyboardMarkup {
        inline_keyboard: rows,
    }
}

/// Perform one action against the Bot API.
pub async fn execute(client: &TelegramClient, action: &Outgoing) -> anyhow::Result<()> {
    match action {
        Outgoing::Send { chat_id, reply } => {
            client
                .send_message(*chat_id, &reply.text, reply.keyboard.as_ref())
                .await
        }
        Outgoing::Edit {
            chat_id,
            message_id,
            reply,
        } => {
            client
                .edit_message_text(*chat_id, *message_id, &reply.text, reply.keyboard.as_ref())
                .await
        }
        Outgoing::AnswerCallback { id, text } => {
            client.answer_callback_query(id, text.as_deref()).await
        }
        Outgoing::AnswerInline { id, results } => client.answer_inline_query(id, results).await,
    }
}

/// Handle an update and perform every resulting action, logging failures.
pub async fn dispatch(dispatcher: &Dispatcher, client: &TelegramClient, update: &Update) {
    for action in dispatcher.handle(update).await {
        if let Err(err) = execute(client, &action).await {
            tracing::warn!(update_id = update.update_id, error = %err, "failed to deliver reply");
        }
    }
}
