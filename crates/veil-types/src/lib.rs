pub mod events;
pub mod models;
pub mod token;

pub use events::{ChatId, InboundMessage, MediaKind, MessageId, MessagePayload, RevealTrigger, Sender};
pub use models::{IdentityRecord, Snapshot};
pub use token::{RevealToken, TokenError};
