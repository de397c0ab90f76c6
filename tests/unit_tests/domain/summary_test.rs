use chrono::Utc;

use forkchat::domain::{
    EMPTY_VERSION_SUMMARY, Message, MessageRole, NO_ACTIVE_VERSION_SUMMARY, VersionId, summarize,
};

use super::thread;

#[test]
fn given_no_active_version_when_summarizing_then_reports_no_messages() {
    assert_eq!(summarize(None), "No messages in conversation");
    assert_eq!(summarize(None), NO_ACTIVE_VERSION_SUMMARY);
}

#[test]
fn given_empty_version_when_summarizing_then_reports_empty_conversation() {
    assert_eq!(summarize(Some(&[])), EMPTY_VERSION_SUMMARY);
}

#[test]
fn given_single_message_when_summarizing_then_previews_first_fifty_chars() {
    let content = "x".repeat(80);
    let messages = thread(VersionId::new(), &[&content], Utc::now());

    let summary = summarize(Some(&messages));

    assert_eq!(
        summary,
        format!("Single message conversation: {}...", "x".repeat(50))
    );
}

#[test]
fn given_user_then_assistant_when_summarizing_then_matches_expected_text() {
    let messages = thread(VersionId::new(), &["hi", "hello"], Utc::now());

    let summary = summarize(Some(&messages));

    assert_eq!(
        summary,
        "Conversation with 2 messages Started with: hi... Latest: hello..."
    );
}

#[test]
fn given_assistant_opens_when_summarizing_then_started_with_is_omitted() {
    let version_id = VersionId::new();
    let messages = vec![
        Message::new(version_id, MessageRole::assistant(), "welcome".to_string()),
        Message::new(version_id, MessageRole::user(), "thanks".to_string()),
    ];

    let summary = summarize(Some(&messages));

    assert_eq!(summary, "Conversation with 2 messages Latest: thanks...");
}

#[test]
fn given_long_messages_when_summarizing_then_previews_are_cut_at_one_hundred_chars() {
    let first = "a".repeat(150);
    let last = "b".repeat(150);
    let messages = thread(VersionId::new(), &[&first, "middle", &last], Utc::now());

    let summary = summarize(Some(&messages));

    assert!(summary.starts_with("Conversation with 3 messages"));
    assert!(summary.contains(&format!("Started with: {}...", "a".repeat(100))));
    assert!(summary.contains(&format!("Latest: {}...", "b".repeat(100))));
    assert!(!summary.contains(&"a".repeat(101)));
}

#[test]
fn given_multibyte_content_when_summarizing_then_cuts_on_char_boundary() {
    let content = "é".repeat(60);
    let messages = thread(VersionId::new(), &[&content], Utc::now());

    let summary = summarize(Some(&messages));

    assert_eq!(
        summary,
        format!("Single message conversation: {}...", "é".repeat(50))
    );
}
