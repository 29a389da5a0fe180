use std::sync::Arc;

use chrono::{DateTime, Local};
use tracing::{debug, warn};

use veil_store::{DAILY_MESSAGE_LIMIT, SnapshotStore};
use veil_types::{ChatId, IdentityRecord, InboundMessage, MessagePayload, RevealToken, RevealTrigger};

use crate::transport::ChatTransport;

/// Orchestrates the relay flow: admission, anonymized forward, identity
/// mapping, confirmation — plus the reveal-callback path.
///
/// Holds the destination group as data; a missing destination rejects each
/// relay attempt with a visible notice instead of crashing.
pub struct RelayDispatcher<T> {
    store: Arc<SnapshotStore>,
    transport: T,
    destination: Option<ChatId>,
}

impl<T: ChatTransport> RelayDispatcher<T> {
    pub fn new(store: Arc<SnapshotStore>, transport: T, destination: Option<ChatId>) -> Self {
        Self {
            store,
            transport,
            destination,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Relay one inbound user message.
    ///
    /// Quota is spent and the identity mapping written only after the forward
    /// succeeded; a transport failure leaves no trace in the snapshot.
    pub async fn handle_message(&self, msg: InboundMessage) -> anyhow::Result<()> {
        let Some(dest) = self.destination else {
            warn!("Relay rejected: destination group not configured");
            self.transport
                .reply_text(
                    msg.chat,
                    msg.message_id,
                    "❌ Destination group is not configured.\n\
                     Ask the operator to set TARGET_GROUP_ID.",
                )
                .await?;
            return Ok(());
        };

        let today = Local::now().date_naive();
        let status = self.store.check_daily_limit(msg.sender.id, today);
        if !status.allowed {
            self.transport
                .reply_text(
                    msg.chat,
                    msg.message_id,
                    &format!(
                        "❌ Daily message limit reached!\n\
                         You have sent {} of {} messages today.\n\
                         Try again tomorrow.",
                        status.count, DAILY_MESSAGE_LIMIT
                    ),
                )
                .await?;
            return Ok(());
        }

        let token = RevealToken::new(msg.sender.id, msg.sent_at);
        let sent = match &msg.payload {
            MessagePayload::Text { text } => self.transport.send_text(dest, text, &token).await,
            MessagePayload::Media {
                kind,
                file_ref,
                caption,
            } => {
                self.transport
                    .send_media(dest, *kind, file_ref, caption.as_deref(), &token)
                    .await
            }
        };

        let forwarded = match sent {
            Ok(forwarded) => forwarded,
            Err(e) => {
                warn!("Forward for user {} failed: {e}", msg.sender.id);
                self.transport
                    .reply_text(
                        msg.chat,
                        msg.message_id,
                        "❌ Failed to deliver your message. Please try again later.",
                    )
                    .await?;
                return Ok(());
            }
        };
        debug!(
            "Forwarded message {} for user {} as {}",
            msg.message_id.0, msg.sender.id, forwarded.message_id.0
        );

        self.store.increment_daily_count(msg.sender.id, today);
        self.store
            .record_identity(&token.ref_key(), identity_record(&msg));

        let remaining = DAILY_MESSAGE_LIMIT - (status.count + 1);
        self.transport
            .reply_text(
                msg.chat,
                msg.message_id,
                &format!(
                    "✅ Sent anonymously.\n\
                     You have {remaining} of {DAILY_MESSAGE_LIMIT} messages left today."
                ),
            )
            .await?;
        Ok(())
    }

    /// Handle a press of the reveal button under a forwarded message.
    ///
    /// Posts either the sender summary or a "not found" diagnostic as a reply
    /// to the forwarded message in the destination group.
    pub async fn handle_reveal(&self, trigger: RevealTrigger) -> anyhow::Result<()> {
        let (attempted_key, resolved) = match RevealToken::parse(&trigger.data) {
            Ok(token) => {
                let key = token.ref_key();
                let resolved = self.store.resolve_identity(token.user_id, &key);
                (key, resolved)
            }
            Err(e) => {
                warn!("Reveal with unparseable callback data: {e}");
                (trigger.data.clone(), None)
            }
        };

        let text = match resolved {
            Some(resolved) => {
                debug!("Resolved key {attempted_key} via {:?}", resolved.matched);
                sender_summary(&resolved.record)
            }
            None => {
                warn!("Reveal miss for key {attempted_key}");
                format!("❌ Sender info not found\nKey: {attempted_key}")
            }
        };

        self.transport
            .reply_text(trigger.chat, trigger.message_id, &text)
            .await?;
        Ok(())
    }
}

fn identity_record(msg: &InboundMessage) -> IdentityRecord {
    IdentityRecord {
        user_id: msg.sender.id,
        first_name: msg.sender.first_name.clone(),
        last_name: msg.sender.last_name.clone(),
        username: msg.sender.username.clone(),
        message_text: msg.payload.text().map(str::to_string),
        timestamp: msg.sent_at,
    }
}

/// Human-readable sender summary for the reveal reply. Optional fields are
/// omitted, not rendered empty.
fn sender_summary(record: &IdentityRecord) -> String {
    let mut summary = format!("👤 From: {}", record.first_name);
    if let Some(last_name) = &record.last_name {
        summary.push_str(&format!(" {last_name}"));
    }
    if let Some(username) = &record.username {
        summary.push_str(&format!(" (@{username})"));
    }
    if let Some(text) = &record.message_text {
        summary.push_str(&format!("\n💬 Message: {text}"));
    }
    let time = DateTime::from_timestamp(record.timestamp as i64, 0)
        .map(|t| t.with_timezone(&Local).format("%d.%m.%Y %H:%M:%S").to_string())
        .unwrap_or_else(|| record.timestamp.to_string());
    summary.push_str(&format!("\n🕐 Time: {time}"));
    summary
}
