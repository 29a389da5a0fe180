use async_trait::async_trait;
use thiserror::Error;

use veil_types::{ChatId, MediaKind, MessageId, RevealToken};

/// Handle to a message the transport delivered, enough to reply to it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub chat: ChatId,
    pub message_id: MessageId,
}

#[derive(Debug, Error)]
pub enum TransportError {
    /// The platform accepted the call but rejected it (bad chat id, kicked
    /// bot, oversized payload, ...).
    #[error("chat platform rejected {method}: {description}")]
    Api {
        method: &'static str,
        description: String,
    },
    /// The call never completed (connectivity, timeout, malformed response).
    #[error("network error calling {method}: {message}")]
    Network {
        method: &'static str,
        message: String,
    },
}

/// The messaging platform, as seen by the relay core.
///
/// The core only sends; connection lifecycle, retries and authentication are
/// the implementation's problem. Every outbound forward carries a reveal
/// `control` that the platform renders as an inline button.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Post plain text to `dest` with the reveal control attached.
    async fn send_text(
        &self,
        dest: ChatId,
        text: &str,
        control: &RevealToken,
    ) -> Result<MessageRef, TransportError>;

    /// Post a media attachment to `dest` with the reveal control attached.
    /// `file_ref` is the platform's opaque handle for the original upload.
    async fn send_media(
        &self,
        dest: ChatId,
        kind: MediaKind,
        file_ref: &str,
        caption: Option<&str>,
        control: &RevealToken,
    ) -> Result<MessageRef, TransportError>;

    /// Reply to an existing message in `chat` with plain text, no control.
    async fn reply_text(
        &self,
        chat: ChatId,
        reply_to: MessageId,
        text: &str,
    ) -> Result<(), TransportError>;
}
