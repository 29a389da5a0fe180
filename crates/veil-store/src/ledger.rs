use std::collections::BTreeMap;

use tracing::info;

use veil_types::IdentityRecord;

use crate::SnapshotStore;

/// Which lookup stage produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// The reference key matched byte-for-byte.
    Exact,
    /// No exact hit; this is the most recent record stored for the user.
    /// Covers timestamp formatting drift between the stored key and the one
    /// reconstructed from a reveal token.
    LatestForUser,
}

/// A resolved identity plus how it was found, so callers (and tests) can
/// tell the two lookup paths apart.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub record: IdentityRecord,
    pub matched: MatchKind,
}

impl SnapshotStore {
    /// Store the identity behind a forwarded message.
    ///
    /// Reference keys are `{user_id}_{timestamp}` and are not unique by
    /// construction: two messages from one user in the same instant collide.
    /// An occupied key gets a `-{n}` suffix instead of being overwritten;
    /// suffixed keys are still reachable through the prefix fallback of
    /// [`resolve_identity`](Self::resolve_identity).
    pub fn record_identity(&self, ref_key: &str, record: IdentityRecord) {
        self.mutate(|snapshot| {
            let key = dedup_key(&snapshot.user_info, ref_key);
            info!("Recording identity under key {key}");
            snapshot.user_info.insert(key, record);
        });
    }

    /// Resolve a reveal request back to the stored sender identity.
    ///
    /// Exact key match first; failing that, the most recent record whose key
    /// starts with `{user_id}_`. None means the mapping never existed or was
    /// already pruned — reportable, not fatal.
    pub fn resolve_identity(&self, user_id: i64, ref_key: &str) -> Option<Resolved> {
        self.read(|snapshot| {
            if let Some(record) = snapshot.user_info.get(ref_key) {
                return Some(Resolved {
                    record: record.clone(),
                    matched: MatchKind::Exact,
                });
            }

            let prefix = format!("{user_id}_");
            snapshot
                .user_info
                .iter()
                .filter(|(key, _)| key.starts_with(&prefix))
                .max_by(|(_, a), (_, b)| a.timestamp.total_cmp(&b.timestamp))
                .map(|(_, record)| Resolved {
                    record: record.clone(),
                    matched: MatchKind::LatestForUser,
                })
        })
    }
}

fn dedup_key(existing: &BTreeMap<String, IdentityRecord>, ref_key: &str) -> String {
    if !existing.contains_key(ref_key) {
        return ref_key.to_string();
    }
    let mut n = 1u32;
    loop {
        let candidate = format!("{ref_key}-{n}");
        if !existing.contains_key(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
