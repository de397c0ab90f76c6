use chrono::{TimeDelta, Utc};

use forkchat::domain::{ConversationId, ForkPlan, Version};

use super::thread;

#[test]
fn given_root_message_when_planning_fork_then_copies_only_earlier_messages() {
    let conversation_id = ConversationId::new();
    let source = Version::root(conversation_id);
    let messages = thread(source.id, &["one", "two", "three", "four"], Utc::now());

    let plan = ForkPlan::new(conversation_id, &messages[2], &messages);

    let copied: Vec<&str> = plan.copies.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(copied, vec!["one", "two"]);
}

#[test]
fn given_fork_plan_when_inspecting_version_then_links_parent_and_root_message() {
    let conversation_id = ConversationId::new();
    let source = Version::root(conversation_id);
    let messages = thread(source.id, &["one", "two"], Utc::now());

    let plan = ForkPlan::new(conversation_id, &messages[1], &messages);

    assert_eq!(plan.version.conversation_id, conversation_id);
    assert_eq!(plan.version.parent_version_id, Some(source.id));
    assert_eq!(plan.version.root_message_id, Some(messages[1].id));
    assert!(!plan.version.is_root());
}

#[test]
fn given_fork_plan_when_inspecting_copies_then_they_are_fresh_rows_in_new_version() {
    let conversation_id = ConversationId::new();
    let source = Version::root(conversation_id);
    let messages = thread(source.id, &["one", "two", "three"], Utc::now());

    let plan = ForkPlan::new(conversation_id, &messages[2], &messages);

    for (copy, original) in plan.copies.iter().zip(&messages) {
        assert_ne!(copy.id, original.id);
        assert_eq!(copy.version_id, plan.version.id);
        assert_eq!(copy.role, original.role);
        assert_eq!(copy.content, original.content);
    }
}

#[test]
fn given_fork_plan_when_inspecting_copy_timestamps_then_they_strictly_increase() {
    let conversation_id = ConversationId::new();
    let source = Version::root(conversation_id);
    let messages = thread(source.id, &["a", "b", "c", "d", "e"], Utc::now());
    let now = Utc::now();

    let plan = ForkPlan::at(conversation_id, &messages[4], &messages, now);

    assert_eq!(plan.copies.len(), 4);
    for pair in plan.copies.windows(2) {
        assert!(pair[0].created_at < pair[1].created_at);
    }
}

#[test]
fn given_first_message_as_root_when_planning_fork_then_nothing_is_copied() {
    let conversation_id = ConversationId::new();
    let source = Version::root(conversation_id);
    let messages = thread(source.id, &["one", "two"], Utc::now());

    let plan = ForkPlan::new(conversation_id, &messages[0], &messages);

    assert!(plan.copies.is_empty());
}

#[test]
fn given_source_with_other_versions_when_planning_fork_then_ignores_foreign_messages() {
    let conversation_id = ConversationId::new();
    let source = Version::root(conversation_id);
    let other = Version::root(conversation_id);
    let start = Utc::now();
    let mut messages = thread(source.id, &["one", "two"], start);
    messages.extend(thread(other.id, &["foreign"], start - TimeDelta::hours(1)));

    let plan = ForkPlan::new(conversation_id, &messages[1], &messages);

    let copied: Vec<&str> = plan.copies.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(copied, vec!["one"]);
}
