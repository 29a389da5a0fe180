use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The entire persisted state of the bot, read and rewritten as a whole
/// on every mutation. Serialized as one flat JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// ISO date -> user id (as string) -> messages sent that day.
    /// A day key exists only once it has been touched.
    #[serde(default)]
    pub daily_limits: BTreeMap<String, BTreeMap<String, u32>>,

    /// Reference key (`{user_id}_{timestamp}`) -> identity of the sender
    /// behind an anonymized forward.
    #[serde(default)]
    pub user_info: BTreeMap<String, IdentityRecord>,
}

/// Snapshot of a sender at forward time. This is what the reveal button
/// discloses to the destination group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    /// Original text or media caption. None for uncaptioned media.
    pub message_text: Option<String>,
    /// Epoch seconds, as reported by the platform for the original message.
    pub timestamp: f64,
}
