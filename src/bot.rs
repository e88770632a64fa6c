//! Long-polling transport.
//!
//! Clears any registered webhook, then loops on `getUpdates`, handing each
//! update to its own task so a slow expansion never blocks the queue. The
//! loop ends on Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::dispatch::{dispatch, Dispatcher};
use crate::telegram::TelegramClient;

const RETRY_DELAY: Duration = Duration::from_secs(5);

pub async fn run_polling(
    client: TelegramClient,
    dispatcher: Arc<Dispatcher>,
    poll_timeout_secs: u64,
) -> Result<()> {
    client.delete_webhook(false).await?;
    tracing::info!("polling for updates");

    let mut offset = 0i64;
    loop {
        let batch = tokio::select! {
            res = client.get_updates(offset, poll_timeout_secs) => res,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                return Ok(());
            }
        };

        let updates = match batch {
            Ok(updates) => updates,
            Err(err) => {
                tracing::warn!(error = %err, "getUpdates failed, retrying");
                tokio::time::sleep(RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let client = client.clone();
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                dispatch(&dispatcher, &client, &update).await;
            });
        }
    }
}
