use std::collections::{HashMap, HashSet};

use super::message::sort_messages;
use super::{Conversation, ConversationId, Message, MessageId, Version, VersionId};

/// Display tree of every branch of one conversation.
///
/// `root` is the conversation's original version. Versions that cannot be
/// anchored under it (extra parentless versions, forks whose parent or root
/// message was deleted) are listed in `detached`.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchTree {
    pub conversation_id: ConversationId,
    pub active_version_id: Option<VersionId>,
    pub root: Option<BranchNode>,
    pub detached: Vec<BranchNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BranchNode {
    pub version_id: VersionId,
    pub parent_version_id: Option<VersionId>,
    pub root_message_id: Option<MessageId>,
    pub is_active: bool,
    /// Leading messages that were copied from the parent when forking.
    pub shared_prefix_len: usize,
    pub messages: Vec<BranchMessage>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BranchMessage {
    pub message: Message,
    pub shared: bool,
    /// Versions forked at this message, oldest first.
    pub branches: Vec<BranchNode>,
}

impl BranchTree {
    pub fn build(conversation: &Conversation, versions: &[Version], messages: &[Message]) -> Self {
        let mut builder = Builder::new(conversation.active_version_id, versions, messages);

        let root = builder.pick_root().map(|version| builder.node(version, 0));

        let mut detached = Vec::new();
        while let Some(version) = builder.next_unvisited() {
            detached.push(builder.node(version, 0));
        }

        Self {
            conversation_id: conversation.id,
            active_version_id: conversation.active_version_id,
            root,
            detached,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none() && self.detached.is_empty()
    }

    pub fn find(&self, version_id: VersionId) -> Option<&BranchNode> {
        self.root
            .iter()
            .chain(self.detached.iter())
            .find_map(|node| node.find(version_id))
    }

    pub fn version_count(&self) -> usize {
        self.root
            .iter()
            .chain(self.detached.iter())
            .map(BranchNode::version_count)
            .sum()
    }
}

impl BranchNode {
    pub fn find(&self, version_id: VersionId) -> Option<&BranchNode> {
        if self.version_id == version_id {
            return Some(self);
        }
        self.messages
            .iter()
            .flat_map(|m| m.branches.iter())
            .find_map(|child| child.find(version_id))
    }

    pub fn version_count(&self) -> usize {
        1 + self
            .messages
            .iter()
            .flat_map(|m| m.branches.iter())
            .map(BranchNode::version_count)
            .sum::<usize>()
    }

    /// Messages this version added after its fork point.
    pub fn own_messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| !m.shared).map(|m| &m.message)
    }
}

struct Builder<'a> {
    active_version_id: Option<VersionId>,
    ordered: Vec<&'a Version>,
    messages: HashMap<VersionId, Vec<Message>>,
    children: HashMap<VersionId, Vec<&'a Version>>,
    visited: HashSet<VersionId>,
}

impl<'a> Builder<'a> {
    fn new(
        active_version_id: Option<VersionId>,
        versions: &'a [Version],
        messages: &[Message],
    ) -> Self {
        let mut ordered: Vec<&Version> = versions.iter().collect();
        ordered.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let known: HashSet<VersionId> = ordered.iter().map(|v| v.id).collect();

        let mut grouped: HashMap<VersionId, Vec<Message>> = HashMap::new();
        for message in messages.iter().filter(|m| known.contains(&m.version_id)) {
            grouped
                .entry(message.version_id)
                .or_default()
                .push(message.clone());
        }
        for list in grouped.values_mut() {
            sort_messages(list);
        }

        let mut children: HashMap<VersionId, Vec<&Version>> = HashMap::new();
        for &version in &ordered {
            if let Some(parent) = version.parent_version_id.filter(|p| known.contains(p)) {
                children.entry(parent).or_default().push(version);
            }
        }

        Self {
            active_version_id,
            ordered,
            messages: grouped,
            children,
            visited: HashSet::new(),
        }
    }

    fn pick_root(&self) -> Option<&'a Version> {
        self.ordered
            .iter()
            .find(|v| v.is_root())
            .or_else(|| self.ordered.first())
            .copied()
    }

    fn next_unvisited(&self) -> Option<&'a Version> {
        self.ordered
            .iter()
            .find(|v| !self.visited.contains(&v.id))
            .copied()
    }

    fn node(&mut self, version: &'a Version, shared_prefix_len: usize) -> BranchNode {
        self.visited.insert(version.id);

        let own = self.messages.get(&version.id).cloned().unwrap_or_default();
        let children = self.children.get(&version.id).cloned().unwrap_or_default();

        let mut messages = Vec::with_capacity(own.len());
        for (position, message) in own.into_iter().enumerate() {
            let mut branches = Vec::new();
            for &child in &children {
                if child.root_message_id == Some(message.id) && !self.visited.contains(&child.id) {
                    branches.push(self.node(child, position));
                }
            }
            messages.push(BranchMessage {
                shared: position < shared_prefix_len,
                message,
                branches,
            });
        }

        BranchNode {
            version_id: version.id,
            parent_version_id: version.parent_version_id,
            root_message_id: version.root_message_id,
            is_active: self.active_version_id == Some(version.id),
            shared_prefix_len: shared_prefix_len.min(messages.len()),
            messages,
        }
    }
}
