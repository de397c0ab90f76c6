use super::Message;

pub const NO_ACTIVE_VERSION_SUMMARY: &str = "No messages in conversation";
pub const EMPTY_VERSION_SUMMARY: &str = "Empty conversation";

const SINGLE_MESSAGE_PREVIEW_CHARS: usize = 50;
const MESSAGE_PREVIEW_CHARS: usize = 100;

/// Derives the summary text of a conversation.
///
/// `active_messages` is `None` when the conversation has no active version,
/// otherwise the active version's messages in creation order.
pub fn summarize(active_messages: Option<&[Message]>) -> String {
    let Some(messages) = active_messages else {
        return NO_ACTIVE_VERSION_SUMMARY.to_string();
    };

    let (Some(first), Some(last)) = (messages.first(), messages.last()) else {
        return EMPTY_VERSION_SUMMARY.to_string();
    };

    if messages.len() == 1 {
        return format!(
            "Single message conversation: {}...",
            preview(&first.content, SINGLE_MESSAGE_PREVIEW_CHARS)
        );
    }

    let mut parts = vec![format!("Conversation with {} messages", messages.len())];

    if first.role.is_user() {
        parts.push(format!(
            "Started with: {}...",
            preview(&first.content, MESSAGE_PREVIEW_CHARS)
        ));
    }

    if last.id != first.id {
        parts.push(format!(
            "Latest: {}...",
            preview(&last.content, MESSAGE_PREVIEW_CHARS)
        ));
    }

    parts.join(" ")
}

fn preview(content: &str, max_chars: usize) -> &str {
    match content.char_indices().nth(max_chars) {
        Some((idx, _)) => &content[..idx],
        None => content,
    }
}
