use chrono::{DateTime, Utc};

use super::message::store_precision;
use super::{ConversationId, Message, MessageId, VersionId};

/// One branch of a conversation's history.
///
/// A root version has neither parent nor root message. A forked version
/// points at the version it branched from and at the message of that
/// version where the branch diverges.
#[derive(Debug, Clone, PartialEq)]
pub struct Version {
    pub id: VersionId,
    pub conversation_id: ConversationId,
    pub parent_version_id: Option<VersionId>,
    pub root_message_id: Option<MessageId>,
    pub created_at: DateTime<Utc>,
}

impl Version {
    pub fn root(conversation_id: ConversationId) -> Self {
        Self {
            id: VersionId::new(),
            conversation_id,
            parent_version_id: None,
            root_message_id: None,
            created_at: store_precision(Utc::now()),
        }
    }

    pub fn forked_at(conversation_id: ConversationId, root_message: &Message) -> Self {
        Self {
            id: VersionId::new(),
            conversation_id,
            parent_version_id: Some(root_message.version_id),
            root_message_id: Some(root_message.id),
            created_at: store_precision(Utc::now()),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_version_id.is_none()
    }
}
