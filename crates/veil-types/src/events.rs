use serde::{Deserialize, Serialize};

/// Platform chat identifier. Negative for groups, positive for private chats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub i64);

/// Platform message identifier, unique within a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageId(pub i64);

/// The sender of an inbound message, as seen by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

/// Media kinds the relay accepts. One variant per platform attachment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
    Document,
    Audio,
    Voice,
}

impl MediaKind {
    /// Lowercase platform name, used both for API field names and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
            MediaKind::Document => "document",
            MediaKind::Audio => "audio",
            MediaKind::Voice => "voice",
        }
    }
}

/// What an inbound message carries. Text and every media kind share one
/// relay code path; only the outbound API call differs.
#[derive(Debug, Clone, PartialEq)]
pub enum MessagePayload {
    Text {
        text: String,
    },
    Media {
        kind: MediaKind,
        /// Opaque platform file reference, reusable for re-sending.
        file_ref: String,
        caption: Option<String>,
    },
}

impl MessagePayload {
    /// The text to store in the identity record: the message text, the media
    /// caption, or None for uncaptioned media.
    pub fn text(&self) -> Option<&str> {
        match self {
            MessagePayload::Text { text } => Some(text),
            MessagePayload::Media { caption, .. } => caption.as_deref(),
        }
    }
}

/// A user message the relay should forward anonymously.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Chat the message arrived in (used for replies to the sender).
    pub chat: ChatId,
    pub message_id: MessageId,
    pub sender: Sender,
    pub payload: MessagePayload,
    /// Platform send time, epoch seconds.
    pub sent_at: f64,
}

/// A press of the reveal button under a forwarded message.
#[derive(Debug, Clone)]
pub struct RevealTrigger {
    /// Chat holding the forwarded message (the destination group).
    pub chat: ChatId,
    /// The forwarded message itself; the reveal is posted as a reply to it.
    pub message_id: MessageId,
    /// Raw callback data carrying the encoded reveal token.
    pub data: String,
}
