mod config;
mod telegram;

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use veil_relay::RelayDispatcher;
use veil_store::{DAILY_MESSAGE_LIMIT, SnapshotStore};
use veil_types::{ChatId, MessageId, RevealToken, RevealTrigger};

use config::Config;
use telegram::{TelegramApi, Update};

fn welcome_text() -> String {
    format!(
        "🤖 Welcome to the anonymous relay bot!\n\
         \n\
         Send me a message and I will post it to the group without your name.\n\
         A moderator can reveal the sender if the rules are broken.\n\
         \n\
         💡 The bot accepts:\n\
         • Text messages\n\
         • Photos, videos, documents, audio and voice notes\n\
         \n\
         ⚠️ Limits:\n\
         • At most {DAILY_MESSAGE_LIMIT} messages per user per day\n\
         \n\
         🔧 Commands:\n\
         /start - show this message"
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "veil=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    let store = Arc::new(SnapshotStore::open(&config.data_file));
    let api = TelegramApi::new(&config.bot_token);
    let dispatcher = RelayDispatcher::new(store, api, config.target_group);

    info!("Anonymous relay bot starting");
    run(dispatcher).await
}

/// Long-poll loop. One update is handled at a time; a failed getUpdates call
/// backs off briefly instead of spinning.
async fn run(dispatcher: RelayDispatcher<TelegramApi>) -> anyhow::Result<()> {
    let mut offset = 0i64;
    loop {
        let updates = match dispatcher.transport().get_updates(offset).await {
            Ok(updates) => updates,
            Err(e) => {
                warn!("getUpdates failed: {e}");
                tokio::time::sleep(Duration::from_secs(5)).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            if let Err(e) = handle_update(&dispatcher, update).await {
                error!("Update handling failed: {e}");
            }
        }
    }
}

async fn handle_update(
    dispatcher: &RelayDispatcher<TelegramApi>,
    update: Update,
) -> anyhow::Result<()> {
    if let Some(callback) = update.callback_query {
        // Ack first so the button stops spinning even if the reveal fails.
        if let Err(e) = dispatcher.transport().answer_callback_query(&callback.id).await {
            warn!("answerCallbackQuery failed: {e}");
        }
        let (Some(data), Some(message)) = (callback.data, callback.message) else {
            return Ok(());
        };
        if !RevealToken::matches(&data) {
            return Ok(());
        }
        return dispatcher
            .handle_reveal(RevealTrigger {
                chat: ChatId(message.chat.id),
                message_id: MessageId(message.message_id),
                data,
            })
            .await;
    }

    let Some(message) = update.message else {
        return Ok(());
    };

    if message.text.as_deref().is_some_and(|t| t.starts_with("/start")) {
        dispatcher
            .transport()
            .send_plain(ChatId(message.chat.id), &welcome_text())
            .await?;
        return Ok(());
    }

    match telegram::inbound_from_message(&message) {
        Some(inbound) => dispatcher.handle_message(inbound).await,
        // Unsupported message kinds (stickers, locations, other commands)
        // are ignored, not answered.
        None => Ok(()),
    }
}
