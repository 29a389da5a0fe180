//! Thin typed client for the Telegram Bot API over HTTPS long polling,
//! plus the translation from wire updates into relay events.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use veil_relay::{ChatTransport, MessageRef, TransportError};
use veil_types::{ChatId, InboundMessage, MediaKind, MessageId, MessagePayload, RevealToken, Sender};

const REVEAL_BUTTON_LABEL: &str = "🔍 Reveal sender";

/// How long a getUpdates call may block server-side, in seconds.
const POLL_TIMEOUT_SECS: u32 = 30;

pub struct TelegramApi {
    http: reqwest::Client,
    base: String,
}

impl TelegramApi {
    pub fn new(token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: format!("https://api.telegram.org/bot{token}"),
        }
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &'static str,
        payload: serde_json::Value,
    ) -> Result<T, TransportError> {
        let network = |e: reqwest::Error| TransportError::Network {
            method,
            message: e.to_string(),
        };

        let response = self
            .http
            .post(format!("{}/{}", self.base, method))
            .json(&payload)
            .send()
            .await
            .map_err(network)?;
        let body: ApiResponse<T> = response.json().await.map_err(network)?;

        if !body.ok {
            return Err(TransportError::Api {
                method,
                description: body
                    .description
                    .unwrap_or_else(|| "no description".into()),
            });
        }
        body.result.ok_or(TransportError::Network {
            method,
            message: "ok response without result".into(),
        })
    }

    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TransportError> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": POLL_TIMEOUT_SECS,
                "allowed_updates": ["message", "callback_query"],
            }),
        )
        .await
    }

    /// Ack a button press so the client stops showing a spinner.
    pub async fn answer_callback_query(&self, id: &str) -> Result<(), TransportError> {
        let _: bool = self
            .call("answerCallbackQuery", json!({ "callback_query_id": id }))
            .await?;
        Ok(())
    }

    /// Plain message without any reveal control (welcome text and the like).
    pub async fn send_plain(&self, chat: ChatId, text: &str) -> Result<(), TransportError> {
        let _: TgMessage = self
            .call("sendMessage", json!({ "chat_id": chat.0, "text": text }))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for TelegramApi {
    async fn send_text(
        &self,
        dest: ChatId,
        text: &str,
        control: &RevealToken,
    ) -> Result<MessageRef, TransportError> {
        let msg: TgMessage = self
            .call(
                "sendMessage",
                json!({
                    "chat_id": dest.0,
                    "text": text,
                    "reply_markup": reveal_markup(control),
                }),
            )
            .await?;
        Ok(message_ref(&msg))
    }

    async fn send_media(
        &self,
        dest: ChatId,
        kind: MediaKind,
        file_ref: &str,
        caption: Option<&str>,
        control: &RevealToken,
    ) -> Result<MessageRef, TransportError> {
        let method = match kind {
            MediaKind::Photo => "sendPhoto",
            MediaKind::Video => "sendVideo",
            MediaKind::Document => "sendDocument",
            MediaKind::Audio => "sendAudio",
            MediaKind::Voice => "sendVoice",
        };

        // The file field is named after the media kind ("photo", "video", ...).
        let mut payload = serde_json::Map::new();
        payload.insert("chat_id".into(), json!(dest.0));
        payload.insert(kind.as_str().into(), json!(file_ref));
        if let Some(caption) = caption {
            payload.insert("caption".into(), json!(caption));
        }
        payload.insert("reply_markup".into(), reveal_markup(control));

        let msg: TgMessage = self.call(method, serde_json::Value::Object(payload)).await?;
        Ok(message_ref(&msg))
    }

    async fn reply_text(
        &self,
        chat: ChatId,
        reply_to: MessageId,
        text: &str,
    ) -> Result<(), TransportError> {
        let _: TgMessage = self
            .call(
                "sendMessage",
                json!({
                    "chat_id": chat.0,
                    "text": text,
                    "reply_to_message_id": reply_to.0,
                }),
            )
            .await?;
        Ok(())
    }
}

fn reveal_markup(control: &RevealToken) -> serde_json::Value {
    json!({
        "inline_keyboard": [[{
            "text": REVEAL_BUTTON_LABEL,
            "callback_data": control.encode(),
        }]]
    })
}

fn message_ref(msg: &TgMessage) -> MessageRef {
    MessageRef {
        chat: ChatId(msg.chat.id),
        message_id: MessageId(msg.message_id),
    }
}

// -- Wire types (the subset of the Bot API the relay consumes) --

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TgMessage>,
    #[serde(default)]
    pub callback_query: Option<TgCallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgMessage {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<TgUser>,
    pub chat: TgChat,
    /// Unix send time in seconds.
    pub date: i64,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub photo: Option<Vec<TgPhotoSize>>,
    #[serde(default)]
    pub video: Option<TgFileRef>,
    #[serde(default)]
    pub document: Option<TgFileRef>,
    #[serde(default)]
    pub audio: Option<TgFileRef>,
    #[serde(default)]
    pub voice: Option<TgFileRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgUser {
    pub id: i64,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgChat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgPhotoSize {
    pub file_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgFileRef {
    pub file_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgCallbackQuery {
    pub id: String,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub message: Option<TgMessage>,
}

/// Translate a wire message into a relay event. None for anything the relay
/// does not forward: messages without a sender, commands, unsupported kinds.
pub fn inbound_from_message(msg: &TgMessage) -> Option<InboundMessage> {
    let from = msg.from.as_ref()?;
    let payload = payload_of(msg)?;

    Some(InboundMessage {
        chat: ChatId(msg.chat.id),
        message_id: MessageId(msg.message_id),
        sender: Sender {
            id: from.id,
            first_name: from.first_name.clone(),
            last_name: from.last_name.clone(),
            username: from.username.clone(),
        },
        payload,
        sent_at: msg.date as f64,
    })
}

fn payload_of(msg: &TgMessage) -> Option<MessagePayload> {
    let media = |kind: MediaKind, file_ref: String| MessagePayload::Media {
        kind,
        file_ref,
        caption: msg.caption.clone(),
    };

    if let Some(sizes) = &msg.photo {
        // Telegram lists photo variants smallest first; forward the largest.
        return Some(media(MediaKind::Photo, sizes.last()?.file_id.clone()));
    }
    for (kind, file) in [
        (MediaKind::Video, &msg.video),
        (MediaKind::Document, &msg.document),
        (MediaKind::Audio, &msg.audio),
        (MediaKind::Voice, &msg.voice),
    ] {
        if let Some(file) = file {
            return Some(media(kind, file.file_id.clone()));
        }
    }

    match &msg.text {
        Some(text) if !text.starts_with('/') => Some(MessagePayload::Text { text: text.clone() }),
        _ => None,
    }
}
