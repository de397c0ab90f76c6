use chrono::{DateTime, SubsecRound, TimeDelta, Utc};

use super::{MessageId, MessageRole, VersionId};

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub version_id: VersionId,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(version_id: VersionId, role: MessageRole, content: String) -> Self {
        Self {
            id: MessageId::new(),
            version_id,
            role,
            content,
            created_at: store_precision(Utc::now()),
        }
    }

    /// Copy of this message placed into another version under a fresh id.
    pub fn copy_into(&self, version_id: VersionId, created_at: DateTime<Utc>) -> Self {
        Self {
            id: MessageId::new(),
            version_id,
            role: self.role.clone(),
            content: self.content.clone(),
            created_at,
        }
    }
}

/// Timestamps are kept at microsecond precision, the resolution Postgres stores.
pub fn store_precision(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(6)
}

/// Creation stamp for the next message of a version.
///
/// Always strictly after `previous`, so ordering by `created_at` is a total
/// order even when the clock is coarse or steps backwards.
pub fn next_message_timestamp(
    previous: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let now = store_precision(now);
    match previous {
        Some(last) if last >= now => store_precision(last) + TimeDelta::microseconds(1),
        _ => now,
    }
}

/// Sorts messages into their canonical order within a version.
pub fn sort_messages(messages: &mut [Message]) {
    messages.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.as_uuid().cmp(&b.id.as_uuid()))
    });
}
