use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use futures::future::join_all;

use forkchat::application::ports::{ConversationRepository, PageRequest, SummaryQuery};
use forkchat::application::services::{
    CleanupOptions, ConversationError, ConversationService, MAX_ACTIVE_VERSION_RETRIES,
    MessageDraft, SummaryService,
};
use forkchat::domain::{
    Conversation, DEFAULT_TITLE, EMPTY_VERSION_SUMMARY, Message, MessageId, UserId, VersionId,
};

use super::ConversationHarness;
use super::conflicting_repository::ConflictingRepository;

async fn active_messages(harness: &ConversationHarness, conversation: &Conversation) -> Vec<Message> {
    let stored = harness.stored(conversation).await;
    harness
        .repository
        .list_messages(stored.active_version_id.unwrap())
        .await
        .unwrap()
}

fn contents(messages: &[Message]) -> Vec<&str> {
    messages.iter().map(|m| m.content.as_str()).collect()
}

#[tokio::test]
async fn given_no_title_when_creating_conversation_then_uses_default_and_has_no_version() {
    let harness = ConversationHarness::new();

    let conversation = harness
        .service
        .create_conversation(harness.owner, None)
        .await
        .unwrap();

    assert_eq!(conversation.title, DEFAULT_TITLE);
    assert_eq!(conversation.active_version_id, None);
    assert_eq!(
        conversation.summary.as_deref(),
        Some("No messages in conversation")
    );
}

#[tokio::test]
async fn given_blank_title_when_creating_conversation_then_returns_validation_error() {
    let harness = ConversationHarness::new();

    let result = harness
        .service
        .create_conversation(harness.owner, Some("   "))
        .await;

    assert!(matches!(result, Err(ConversationError::Validation(_))));
}

#[tokio::test]
async fn given_new_version_with_two_messages_when_reloading_then_summary_describes_them() {
    let harness = ConversationHarness::new();
    let service = &harness.service;
    let conversation = service
        .create_conversation(harness.owner, Some("T"))
        .await
        .unwrap();

    let version = service
        .start_version(harness.owner, conversation.id)
        .await
        .unwrap();
    service
        .append_message(harness.owner, version.id, "hi", "user")
        .await
        .unwrap();
    service
        .append_message(harness.owner, version.id, "hello", "assistant")
        .await
        .unwrap();

    let stored = harness.stored(&conversation).await;
    assert_eq!(stored.active_version_id, Some(version.id));
    assert_eq!(
        stored.summary.as_deref(),
        Some("Conversation with 2 messages Started with: hi... Latest: hello...")
    );
}

#[tokio::test]
async fn given_drafts_when_opening_conversation_then_messages_are_stored_in_order() {
    let harness = ConversationHarness::new();

    let conversation = harness.seeded(&["one", "two", "three"]).await;

    let messages = active_messages(&harness, &conversation).await;
    assert_eq!(contents(&messages), vec!["one", "two", "three"]);
    assert_eq!(messages[1].role.as_str(), "assistant");
    for pair in messages.windows(2) {
        assert!(pair[0].created_at < pair[1].created_at);
    }
}

#[tokio::test]
async fn given_one_invalid_draft_when_opening_conversation_then_nothing_is_created() {
    let harness = ConversationHarness::new();
    let drafts = vec![MessageDraft::new("user", "fine"), MessageDraft::new("user", "  ")];

    let result = harness
        .service
        .open_conversation(harness.owner, Some("T"), drafts)
        .await;

    assert!(matches!(result, Err(ConversationError::Validation(_))));
    let listed = harness
        .service
        .list_conversations(harness.owner)
        .await
        .unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn given_no_drafts_when_opening_conversation_then_empty_root_is_active_and_summarised() {
    let harness = ConversationHarness::new();

    let conversation = harness
        .service
        .open_conversation(harness.owner, None, Vec::new())
        .await
        .unwrap();

    let version_id = conversation.active_version_id.unwrap();
    let versions = harness.repository.list_versions(conversation.id).await.unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].id, version_id);
    assert!(harness.repository.list_messages(version_id).await.unwrap().is_empty());
    assert_eq!(conversation.summary.as_deref(), Some(EMPTY_VERSION_SUMMARY));
}

#[tokio::test]
async fn given_drafts_when_opening_conversation_then_modified_at_covers_last_message() {
    let harness = ConversationHarness::new();

    let conversation = harness.seeded(&["one", "two"]).await;

    let messages = active_messages(&harness, &conversation).await;
    assert!(conversation.modified_at >= messages[1].created_at);
    assert!(
        conversation
            .summary
            .as_deref()
            .unwrap()
            .starts_with("Conversation with 2 messages")
    );
}

#[tokio::test]
async fn given_active_version_when_starting_another_root_then_returns_validation_error() {
    let harness = ConversationHarness::new();
    let conversation = harness.seeded(&["hi"]).await;

    let result = harness
        .service
        .start_version(harness.owner, conversation.id)
        .await;

    assert!(matches!(result, Err(ConversationError::Validation(_))));
}

#[tokio::test]
async fn given_empty_content_when_appending_then_returns_validation_error() {
    let harness = ConversationHarness::new();
    let conversation = harness.seeded(&["hi"]).await;
    let version_id = conversation.active_version_id.unwrap();

    let blank = harness
        .service
        .append_message(harness.owner, version_id, " \n ", "user")
        .await;
    let no_role = harness
        .service
        .append_message(harness.owner, version_id, "text", "")
        .await;

    assert!(matches!(blank, Err(ConversationError::Validation(_))));
    assert!(matches!(no_role, Err(ConversationError::Validation(_))));
}

#[tokio::test]
async fn given_unknown_version_when_appending_then_returns_not_found() {
    let harness = ConversationHarness::new();

    let result = harness
        .service
        .append_message(harness.owner, VersionId::new(), "hi", "user")
        .await;

    assert!(matches!(result, Err(ConversationError::NotFound(_))));
}

#[tokio::test]
async fn given_other_owners_version_when_appending_then_returns_not_found() {
    let harness = ConversationHarness::new();
    let conversation = harness.seeded(&["hi"]).await;

    let result = harness
        .service
        .append_message(
            UserId::new(),
            conversation.active_version_id.unwrap(),
            "intrusion",
            "user",
        )
        .await;

    assert!(matches!(result, Err(ConversationError::NotFound(_))));
    assert_eq!(active_messages(&harness, &conversation).await.len(), 1);
}

#[tokio::test]
async fn given_no_active_version_when_appending_to_active_then_returns_validation_error() {
    let harness = ConversationHarness::new();
    let conversation = harness
        .service
        .create_conversation(harness.owner, None)
        .await
        .unwrap();

    let result = harness
        .service
        .append_to_active(harness.owner, conversation.id, "hi", "user")
        .await;

    match result {
        Err(ConversationError::Validation(reason)) => {
            assert_eq!(reason, "Active version not set for this conversation")
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn given_message_appended_when_reloading_then_conversation_modified_at_moves_forward() {
    let harness = ConversationHarness::new();
    let conversation = harness.seeded(&["hi"]).await;
    let before = harness.stored(&conversation).await.modified_at;

    harness
        .service
        .append_to_active(harness.owner, conversation.id, "more", "user")
        .await
        .unwrap();

    let after = harness.stored(&conversation).await;
    assert!(after.modified_at >= before);
    assert_eq!(
        after.summary.as_deref(),
        Some("Conversation with 2 messages Started with: hi... Latest: more...")
    );
}

#[tokio::test]
async fn given_rapid_appends_when_listing_then_timestamps_are_strictly_increasing() {
    let harness = ConversationHarness::new();
    let conversation = harness.seeded(&[]).await;

    for i in 0..20 {
        harness
            .service
            .append_to_active(harness.owner, conversation.id, &format!("m{i}"), "user")
            .await
            .unwrap();
    }

    let messages = active_messages(&harness, &conversation).await;
    assert_eq!(messages.len(), 20);
    assert_eq!(messages[0].content, "m0");
    assert_eq!(messages[19].content, "m19");
    for pair in messages.windows(2) {
        assert!(pair[0].created_at < pair[1].created_at);
    }
}

#[tokio::test]
async fn given_message_in_middle_when_forking_then_new_active_version_has_earlier_history() {
    let harness = ConversationHarness::new();
    let conversation = harness
        .seeded(&["hi", "hello", "how are you", "fine"])
        .await;
    let original_version = conversation.active_version_id.unwrap();
    let originals = active_messages(&harness, &conversation).await;

    let fork = harness
        .service
        .fork_version(harness.owner, conversation.id, originals[2].id)
        .await
        .unwrap();

    let stored = harness.stored(&conversation).await;
    assert_eq!(stored.active_version_id, Some(fork.id));
    assert_eq!(fork.parent_version_id, Some(original_version));
    assert_eq!(fork.root_message_id, Some(originals[2].id));

    let copied = harness.repository.list_messages(fork.id).await.unwrap();
    assert_eq!(contents(&copied), vec!["hi", "hello"]);
    assert!(copied.iter().all(|m| !originals.iter().any(|o| o.id == m.id)));

    let untouched = harness
        .repository
        .list_messages(original_version)
        .await
        .unwrap();
    assert_eq!(untouched, originals);

    assert_eq!(
        stored.summary.as_deref(),
        Some("Conversation with 2 messages Started with: hi... Latest: hello...")
    );
}

#[tokio::test]
async fn given_forked_version_when_appending_then_original_branch_is_unchanged() {
    let harness = ConversationHarness::new();
    let conversation = harness.seeded(&["hi", "hello"]).await;
    let originals = active_messages(&harness, &conversation).await;
    let fork = harness
        .service
        .fork_version(harness.owner, conversation.id, originals[1].id)
        .await
        .unwrap();

    harness
        .service
        .append_to_active(harness.owner, conversation.id, "bonjour", "assistant")
        .await
        .unwrap();

    let forked = harness.repository.list_messages(fork.id).await.unwrap();
    assert_eq!(contents(&forked), vec!["hi", "bonjour"]);
    let original = harness
        .repository
        .list_messages(conversation.active_version_id.unwrap())
        .await
        .unwrap();
    assert_eq!(contents(&original), vec!["hi", "hello"]);
}

#[tokio::test]
async fn given_message_of_other_conversation_when_forking_then_returns_validation_error() {
    let harness = ConversationHarness::new();
    let conversation = harness.seeded(&["hi"]).await;
    let other = harness.seeded(&["elsewhere"]).await;
    let foreign = active_messages(&harness, &other).await;

    let result = harness
        .service
        .fork_version(harness.owner, conversation.id, foreign[0].id)
        .await;

    assert!(matches!(result, Err(ConversationError::Validation(_))));
    assert_eq!(
        harness.stored(&conversation).await.active_version_id,
        conversation.active_version_id
    );
}

#[tokio::test]
async fn given_unknown_message_when_forking_then_returns_not_found() {
    let harness = ConversationHarness::new();
    let conversation = harness.seeded(&["hi"]).await;

    let result = harness
        .service
        .fork_version(harness.owner, conversation.id, MessageId::new())
        .await;

    assert!(matches!(result, Err(ConversationError::NotFound(_))));
}

#[tokio::test]
async fn given_other_owner_when_forking_then_returns_not_found() {
    let harness = ConversationHarness::new();
    let conversation = harness.seeded(&["hi"]).await;
    let messages = active_messages(&harness, &conversation).await;

    let result = harness
        .service
        .fork_version(UserId::new(), conversation.id, messages[0].id)
        .await;

    assert!(matches!(result, Err(ConversationError::NotFound(_))));
}

#[tokio::test]
async fn given_no_active_version_when_forking_then_returns_validation_error() {
    let harness = ConversationHarness::new();
    let conversation = harness
        .service
        .create_conversation(harness.owner, None)
        .await
        .unwrap();

    let result = harness
        .service
        .fork_version(harness.owner, conversation.id, MessageId::new())
        .await;

    assert!(matches!(result, Err(ConversationError::Validation(_))));
}

#[tokio::test]
async fn given_fork_when_switching_back_then_summary_follows_active_version() {
    let harness = ConversationHarness::new();
    let conversation = harness.seeded(&["hi", "hello", "bye"]).await;
    let root_version = conversation.active_version_id.unwrap();
    let messages = active_messages(&harness, &conversation).await;
    harness
        .service
        .fork_version(harness.owner, conversation.id, messages[1].id)
        .await
        .unwrap();

    harness
        .service
        .switch_active_version(harness.owner, conversation.id, root_version)
        .await
        .unwrap();

    let stored = harness.stored(&conversation).await;
    assert_eq!(stored.active_version_id, Some(root_version));
    assert_eq!(
        stored.summary.as_deref(),
        Some("Conversation with 3 messages Started with: hi... Latest: bye...")
    );
}

#[tokio::test]
async fn given_version_of_other_conversation_when_switching_then_returns_not_found() {
    let harness = ConversationHarness::new();
    let conversation = harness.seeded(&["hi"]).await;
    let other = harness.seeded(&["elsewhere"]).await;

    let result = harness
        .service
        .switch_active_version(
            harness.owner,
            conversation.id,
            other.active_version_id.unwrap(),
        )
        .await;

    assert!(matches!(result, Err(ConversationError::NotFound(_))));
    assert_eq!(
        harness.stored(&conversation).await.active_version_id,
        conversation.active_version_id
    );
}

#[tokio::test]
async fn given_active_pointer_keeps_moving_when_forking_then_gives_up_with_conflict() {
    let harness = ConversationHarness::new();
    let conversation = harness.seeded(&["hi", "hello"]).await;
    let messages = active_messages(&harness, &conversation).await;
    let racing = Arc::new(ConflictingRepository::new(
        Arc::clone(&harness.repository),
        usize::MAX,
    ));
    let service = ConversationService::new(racing.clone(), SummaryService::new(racing.clone()));

    let result = service
        .fork_version(harness.owner, conversation.id, messages[1].id)
        .await;

    assert!(matches!(result, Err(ConversationError::Conflict(_))));
    assert_eq!(racing.writes(), MAX_ACTIVE_VERSION_RETRIES);
    let versions = harness
        .service
        .list_versions(harness.owner, conversation.id)
        .await
        .unwrap();
    assert_eq!(versions.len(), 1);
}

#[tokio::test]
async fn given_one_lost_race_when_forking_then_retry_succeeds() {
    let harness = ConversationHarness::new();
    let conversation = harness.seeded(&["hi", "hello"]).await;
    let messages = active_messages(&harness, &conversation).await;
    let racing = Arc::new(ConflictingRepository::new(Arc::clone(&harness.repository), 1));
    let service = ConversationService::new(racing.clone(), SummaryService::new(racing.clone()));

    let fork = service
        .fork_version(harness.owner, conversation.id, messages[1].id)
        .await
        .unwrap();

    assert_eq!(racing.writes(), 2);
    assert_eq!(
        harness.stored(&conversation).await.active_version_id,
        Some(fork.id)
    );
}

#[tokio::test]
async fn given_active_pointer_keeps_moving_when_switching_then_gives_up_with_conflict() {
    let harness = ConversationHarness::new();
    let conversation = harness.seeded(&["hi"]).await;
    let racing = Arc::new(ConflictingRepository::new(
        Arc::clone(&harness.repository),
        usize::MAX,
    ));
    let service = ConversationService::new(racing.clone(), SummaryService::new(racing.clone()));

    let result = service
        .switch_active_version(
            harness.owner,
            conversation.id,
            conversation.active_version_id.unwrap(),
        )
        .await;

    assert!(matches!(result, Err(ConversationError::Conflict(_))));
    assert_eq!(racing.writes(), MAX_ACTIVE_VERSION_RETRIES);
}

#[tokio::test]
async fn given_concurrent_forks_when_all_finish_then_every_fork_is_kept_and_one_is_active() {
    let harness = ConversationHarness::new();
    let conversation = harness.seeded(&["hi", "hello", "bye"]).await;
    let messages = active_messages(&harness, &conversation).await;

    let results = join_all((0..2).map(|_| {
        harness
            .service
            .fork_version(harness.owner, conversation.id, messages[2].id)
    }))
    .await;

    let forks: Vec<_> = results.into_iter().map(Result::unwrap).collect();
    let versions = harness
        .service
        .list_versions(harness.owner, conversation.id)
        .await
        .unwrap();
    assert_eq!(versions.len(), 3);
    let active = harness.stored(&conversation).await.active_version_id.unwrap();
    assert!(forks.iter().any(|f| f.id == active));
}

#[tokio::test]
async fn given_new_title_when_changing_then_title_updates_and_modified_at_moves() {
    let harness = ConversationHarness::new();
    let conversation = harness.seeded(&["hi"]).await;

    let updated = harness
        .service
        .change_title(harness.owner, conversation.id, "  Renamed ")
        .await
        .unwrap();

    assert_eq!(updated.title, "Renamed");
    assert!(updated.modified_at >= conversation.modified_at);
}

#[tokio::test]
async fn given_overlong_title_when_changing_then_returns_validation_error() {
    let harness = ConversationHarness::new();
    let conversation = harness.seeded(&["hi"]).await;

    let result = harness
        .service
        .change_title(harness.owner, conversation.id, &"x".repeat(101))
        .await;

    assert!(matches!(result, Err(ConversationError::Validation(_))));
}

#[tokio::test]
async fn given_soft_deleted_conversation_when_listing_then_it_is_hidden_but_still_readable() {
    let harness = ConversationHarness::new();
    let kept = harness.seeded(&["keep"]).await;
    let removed = harness.seeded(&["remove"]).await;

    let deleted = harness
        .service
        .soft_delete(harness.owner, removed.id)
        .await
        .unwrap();

    assert!(deleted.is_deleted());
    let listed = harness
        .service
        .list_conversations(harness.owner)
        .await
        .unwrap();
    let ids: Vec<_> = listed.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![kept.id]);
    assert!(
        harness
            .service
            .get_conversation(harness.owner, removed.id)
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn given_conversation_when_hard_deleting_then_versions_and_messages_are_gone() {
    let harness = ConversationHarness::new();
    let conversation = harness.seeded(&["hi", "hello"]).await;
    let version_id = conversation.active_version_id.unwrap();

    harness
        .service
        .delete_conversation(harness.owner, conversation.id)
        .await
        .unwrap();

    let result = harness
        .service
        .get_conversation(harness.owner, conversation.id)
        .await;
    assert!(matches!(result, Err(ConversationError::NotFound(_))));
    assert!(harness.repository.get_version(version_id).await.unwrap().is_none());
    assert!(harness.repository.list_messages(version_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn given_other_owner_when_hard_deleting_then_returns_not_found() {
    let harness = ConversationHarness::new();
    let conversation = harness.seeded(&["hi"]).await;

    let result = harness
        .service
        .delete_conversation(UserId::new(), conversation.id)
        .await;

    assert!(matches!(result, Err(ConversationError::NotFound(_))));
    assert!(harness.repository.get_conversation(conversation.id).await.unwrap().is_some());
}

#[tokio::test]
async fn given_active_version_when_deleting_it_then_returns_validation_error() {
    let harness = ConversationHarness::new();
    let conversation = harness.seeded(&["hi"]).await;

    let result = harness
        .service
        .delete_version(
            harness.owner,
            conversation.id,
            conversation.active_version_id.unwrap(),
        )
        .await;

    assert!(matches!(result, Err(ConversationError::Validation(_))));
}

#[tokio::test]
async fn given_version_activated_concurrently_when_deleting_it_then_delete_is_refused() {
    let harness = ConversationHarness::new();
    let conversation = harness.seeded(&["hi", "hello"]).await;
    let root_version = conversation.active_version_id.unwrap();
    let messages = active_messages(&harness, &conversation).await;
    let fork = harness
        .service
        .fork_version(harness.owner, conversation.id, messages[1].id)
        .await
        .unwrap();
    let racing = Arc::new(ConflictingRepository::activating_before_delete(Arc::clone(
        &harness.repository,
    )));
    let service = ConversationService::new(racing.clone(), SummaryService::new(racing.clone()));

    let result = service
        .delete_version(harness.owner, conversation.id, root_version)
        .await;

    assert!(matches!(result, Err(ConversationError::Validation(_))));
    let stored = harness.stored(&conversation).await;
    assert_eq!(stored.active_version_id, Some(root_version));
    let versions = harness
        .service
        .list_versions(harness.owner, conversation.id)
        .await
        .unwrap();
    let ids: Vec<VersionId> = versions.iter().map(|v| v.id).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&root_version) && ids.contains(&fork.id));
    assert_eq!(
        contents(&harness.repository.list_messages(root_version).await.unwrap()),
        vec!["hi", "hello"]
    );
}

#[tokio::test]
async fn given_parent_version_deleted_when_building_tree_then_fork_is_detached() {
    let harness = ConversationHarness::new();
    let conversation = harness.seeded(&["hi", "hello"]).await;
    let root_version = conversation.active_version_id.unwrap();
    let messages = active_messages(&harness, &conversation).await;
    let fork = harness
        .service
        .fork_version(harness.owner, conversation.id, messages[1].id)
        .await
        .unwrap();

    harness
        .service
        .delete_version(harness.owner, conversation.id, root_version)
        .await
        .unwrap();

    let versions = harness
        .service
        .list_versions(harness.owner, conversation.id)
        .await
        .unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].id, fork.id);
    assert_eq!(versions[0].parent_version_id, None);
    assert_eq!(versions[0].root_message_id, None);

    let tree = harness
        .service
        .build_branch_tree(harness.owner, conversation.id)
        .await
        .unwrap();
    assert_eq!(tree.root.as_ref().unwrap().version_id, fork.id);
    assert_eq!(tree.version_count(), 1);
}

#[tokio::test]
async fn given_fork_when_building_tree_then_branch_appears_under_root_message() {
    let harness = ConversationHarness::new();
    let conversation = harness.seeded(&["hi", "hello", "bye"]).await;
    let messages = active_messages(&harness, &conversation).await;
    let fork = harness
        .service
        .fork_version(harness.owner, conversation.id, messages[2].id)
        .await
        .unwrap();

    let tree = harness
        .service
        .build_branch_tree(harness.owner, conversation.id)
        .await
        .unwrap();

    let root = tree.root.as_ref().unwrap();
    assert_eq!(Some(root.version_id), conversation.active_version_id);
    assert!(!root.is_active);
    let branch = &root.messages[2].branches[0];
    assert_eq!(branch.version_id, fork.id);
    assert!(branch.is_active);
    assert_eq!(branch.shared_prefix_len, 2);
}

#[tokio::test]
async fn given_several_conversations_when_building_all_trees_then_one_tree_each() {
    let harness = ConversationHarness::new();
    harness.seeded(&["a"]).await;
    harness.seeded(&["b"]).await;
    harness
        .service
        .create_conversation(UserId::new(), None)
        .await
        .unwrap();

    let trees = harness
        .service
        .build_branch_trees(harness.owner)
        .await
        .unwrap();

    assert_eq!(trees.len(), 2);
    assert!(trees.iter().all(|t| t.version_count() == 1));
}

#[tokio::test]
async fn given_conversation_when_reading_detail_then_includes_every_version_with_messages() {
    let harness = ConversationHarness::new();
    let conversation = harness.seeded(&["hi", "hello"]).await;
    let messages = active_messages(&harness, &conversation).await;
    let fork = harness
        .service
        .fork_version(harness.owner, conversation.id, messages[1].id)
        .await
        .unwrap();

    let detail = harness
        .service
        .conversation_detail(harness.owner, conversation.id)
        .await
        .unwrap();

    assert_eq!(detail.versions.len(), 2);
    let forked = detail
        .versions
        .iter()
        .find(|v| v.version.id == fork.id)
        .unwrap();
    assert_eq!(contents(&forked.messages), vec!["hi"]);

    let single = harness
        .service
        .version_detail(harness.owner, conversation.id, fork.id)
        .await
        .unwrap();
    assert_eq!(single.messages, forked.messages);
}

#[tokio::test]
async fn given_summaries_when_searching_and_filtering_then_returns_matching_page() {
    let harness = ConversationHarness::new();
    harness.seeded(&["talk about rust"]).await;
    harness.seeded(&["talk about python"]).await;
    let hidden = harness.seeded(&["rust but deleted"]).await;
    harness
        .service
        .soft_delete(harness.owner, hidden.id)
        .await
        .unwrap();
    let stranger = UserId::new();
    harness
        .service
        .open_conversation(stranger, Some("Rusty"), vec![MessageDraft::new("user", "x")])
        .await
        .unwrap();

    let all_rust = harness
        .service
        .list_summaries(&SummaryQuery {
            search: Some("RUST".to_string()),
            ..SummaryQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(all_rust.count, 2);

    let mine = harness
        .service
        .list_summaries(&SummaryQuery {
            owner_id: Some(harness.owner),
            search: Some("rust".to_string()),
            ..SummaryQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(mine.count, 1);
    assert_eq!(mine.results[0].owner_id, harness.owner);
    assert!(mine.results[0].summary.as_deref().unwrap().contains("rust"));
}

#[tokio::test]
async fn given_blank_title_when_updating_conversation_then_active_version_is_not_switched() {
    let harness = ConversationHarness::new();
    let conversation = harness.seeded(&["hi", "hello"]).await;
    let root = conversation.active_version_id.unwrap();
    let messages = active_messages(&harness, &conversation).await;
    harness
        .service
        .fork_version(harness.owner, conversation.id, messages[1].id)
        .await
        .unwrap();

    let result = harness
        .service
        .update_conversation(harness.owner, conversation.id, "   ", Some(root))
        .await;

    assert!(matches!(result, Err(ConversationError::Validation(_))));
    let stored = harness.stored(&conversation).await;
    assert_ne!(stored.active_version_id, Some(root));
    assert_eq!(stored.title, "T");
}

#[tokio::test]
async fn given_title_filter_when_listing_summaries_then_matches_exact_title_only() {
    let harness = ConversationHarness::new();
    for title in ["Rust", "Rust talk", "rust"] {
        harness
            .service
            .create_conversation(harness.owner, Some(title))
            .await
            .unwrap();
    }

    let page = harness
        .service
        .list_summaries(&SummaryQuery {
            title: Some("Rust".to_string()),
            ..SummaryQuery::default()
        })
        .await
        .unwrap();

    assert_eq!(page.count, 1);
    assert_eq!(page.results[0].title, "Rust");
}

#[tokio::test]
async fn given_more_summaries_than_page_size_when_listing_then_paginates() {
    let harness = ConversationHarness::new();
    for i in 0..5 {
        harness.seeded(&[&format!("message {i}")]).await;
    }

    let page = harness
        .service
        .list_summaries(&SummaryQuery {
            page: PageRequest::new(Some(2), Some(2)),
            ..SummaryQuery::default()
        })
        .await
        .unwrap();

    assert_eq!(page.count, 5);
    assert_eq!(page.page, 2);
    assert_eq!(page.results.len(), 2);
}

async fn backdated(harness: &ConversationHarness, days: i64, deleted: bool) -> Conversation {
    let mut conversation = Conversation::new(harness.owner, "old".to_string());
    conversation.modified_at = Utc::now() - TimeDelta::days(days);
    if deleted {
        conversation.deleted_at = Some(conversation.modified_at);
    }
    harness
        .repository
        .create_conversation(&conversation)
        .await
        .unwrap();
    conversation
}

#[tokio::test]
async fn given_stale_conversations_when_cleaning_up_dry_run_then_nothing_is_deleted() {
    let harness = ConversationHarness::new();
    let stale = backdated(&harness, 40, false).await;
    harness.seeded(&["fresh"]).await;

    let report = harness
        .service
        .cleanup_old_conversations(CleanupOptions {
            dry_run: true,
            ..CleanupOptions::default()
        })
        .await
        .unwrap();

    assert_eq!(report.matched, 1);
    assert_eq!(report.deleted, 0);
    assert_eq!(report.examples[0].id, stale.id);
    assert!(harness.repository.get_conversation(stale.id).await.unwrap().is_some());
}

#[tokio::test]
async fn given_stale_conversations_when_cleaning_up_then_only_old_ones_are_deleted() {
    let harness = ConversationHarness::new();
    let stale = backdated(&harness, 40, false).await;
    let fresh = harness.seeded(&["fresh"]).await;

    let report = harness
        .service
        .cleanup_old_conversations(CleanupOptions::default())
        .await
        .unwrap();

    assert_eq!(report.deleted, 1);
    assert_eq!(report.failed, 0);
    assert!(harness.repository.get_conversation(stale.id).await.unwrap().is_none());
    assert!(harness.repository.get_conversation(fresh.id).await.unwrap().is_some());
}

#[tokio::test]
async fn given_deleted_only_when_cleaning_up_then_active_stale_conversations_survive() {
    let harness = ConversationHarness::new();
    let stale_active = backdated(&harness, 40, false).await;
    let stale_deleted = backdated(&harness, 40, true).await;

    let report = harness
        .service
        .cleanup_old_conversations(CleanupOptions {
            deleted_only: true,
            ..CleanupOptions::default()
        })
        .await
        .unwrap();

    assert_eq!(report.matched, 1);
    assert!(harness.repository.get_conversation(stale_active.id).await.unwrap().is_some());
    assert!(harness.repository.get_conversation(stale_deleted.id).await.unwrap().is_none());
}

#[tokio::test]
async fn given_negative_age_when_cleaning_up_then_returns_validation_error() {
    let harness = ConversationHarness::new();

    let result = harness
        .service
        .cleanup_old_conversations(CleanupOptions {
            older_than_days: -1,
            ..CleanupOptions::default()
        })
        .await;

    assert!(matches!(result, Err(ConversationError::Validation(_))));
}
