use chrono::{DateTime, Utc};

use super::message::{next_message_timestamp, sort_messages};
use super::{ConversationId, Message, Version};

/// Everything a fork writes: the new version plus the copied history.
///
/// The history is every message of the root message's version created
/// strictly before the root message. The root message itself stays on the
/// original branch only.
#[derive(Debug, Clone)]
pub struct ForkPlan {
    pub version: Version,
    pub copies: Vec<Message>,
}

impl ForkPlan {
    pub fn new(conversation_id: ConversationId, root_message: &Message, source: &[Message]) -> Self {
        Self::at(conversation_id, root_message, source, Utc::now())
    }

    pub fn at(
        conversation_id: ConversationId,
        root_message: &Message,
        source: &[Message],
        now: DateTime<Utc>,
    ) -> Self {
        let version = Version::forked_at(conversation_id, root_message);

        let mut history: Vec<Message> = source
            .iter()
            .filter(|m| {
                m.version_id == root_message.version_id && m.created_at < root_message.created_at
            })
            .cloned()
            .collect();
        sort_messages(&mut history);

        let mut previous = None;
        let copies = history
            .iter()
            .map(|m| {
                let stamp = next_message_timestamp(previous, now);
                previous = Some(stamp);
                m.copy_into(version.id, stamp)
            })
            .collect();

        Self { version, copies }
    }
}
