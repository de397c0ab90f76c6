use forkchat::application::ports::ConversationRepository;
use forkchat::application::services::ConversationError;
use forkchat::domain::{Conversation, ConversationId};

use super::ConversationHarness;

async fn unsummarized(harness: &ConversationHarness) -> Conversation {
    let conversation = Conversation::new(harness.owner, "legacy".to_string());
    harness
        .repository
        .create_conversation(&conversation)
        .await
        .unwrap();
    conversation
}

#[tokio::test]
async fn given_conversation_without_version_when_generating_then_reports_no_messages() {
    let harness = ConversationHarness::new();
    let conversation = unsummarized(&harness).await;

    let summary = harness
        .summaries
        .generate_summary(conversation.id)
        .await
        .unwrap();

    assert_eq!(summary, "No messages in conversation");
}

#[tokio::test]
async fn given_empty_active_version_when_generating_then_reports_empty_conversation() {
    let harness = ConversationHarness::new();
    let conversation = harness.seeded(&[]).await;

    let summary = harness
        .summaries
        .generate_summary(conversation.id)
        .await
        .unwrap();

    assert_eq!(summary, "Empty conversation");
}

#[tokio::test]
async fn given_unknown_conversation_when_generating_then_returns_not_found() {
    let harness = ConversationHarness::new();

    let result = harness
        .summaries
        .generate_summary(ConversationId::new())
        .await;

    assert!(matches!(result, Err(ConversationError::NotFound(_))));
}

#[tokio::test]
async fn given_generated_summary_when_reading_stored_value_then_generation_did_not_write() {
    let harness = ConversationHarness::new();
    let conversation = unsummarized(&harness).await;

    harness
        .summaries
        .generate_summary(conversation.id)
        .await
        .unwrap();

    assert_eq!(harness.stored(&conversation).await.summary, None);
}

#[tokio::test]
async fn given_summary_update_when_reloading_then_modified_at_is_unchanged() {
    let harness = ConversationHarness::new();
    let conversation = harness.seeded(&["hi", "hello"]).await;
    let before = harness.stored(&conversation).await;

    let summary = harness
        .summaries
        .update_summary(conversation.id)
        .await
        .unwrap();

    let after = harness.stored(&conversation).await;
    assert_eq!(after.summary.as_deref(), Some(summary.as_str()));
    assert_eq!(after.modified_at, before.modified_at);
}

#[tokio::test]
async fn given_existing_summary_and_empty_active_version_when_saving_then_summary_is_kept() {
    let harness = ConversationHarness::new();
    let conversation = harness.seeded(&[]).await;
    harness
        .repository
        .store_summary(conversation.id, "curated")
        .await
        .unwrap();

    harness
        .service
        .change_title(harness.owner, conversation.id, "Renamed")
        .await
        .unwrap();

    assert_eq!(
        harness.stored(&conversation).await.summary.as_deref(),
        Some("curated")
    );
}

#[tokio::test]
async fn given_existing_summary_and_messages_when_saving_then_summary_is_rederived() {
    let harness = ConversationHarness::new();
    let conversation = harness.seeded(&["hi"]).await;
    harness
        .repository
        .store_summary(conversation.id, "stale")
        .await
        .unwrap();

    harness
        .service
        .change_title(harness.owner, conversation.id, "Renamed")
        .await
        .unwrap();

    assert_eq!(
        harness.stored(&conversation).await.summary.as_deref(),
        Some("Single message conversation: hi...")
    );
}

#[tokio::test]
async fn given_blank_summary_when_saving_then_summary_is_filled_in() {
    let harness = ConversationHarness::new();
    let conversation = harness.seeded(&[]).await;
    harness
        .repository
        .store_summary(conversation.id, "")
        .await
        .unwrap();

    harness
        .service
        .soft_delete(harness.owner, conversation.id)
        .await
        .unwrap();

    assert_eq!(
        harness.stored(&conversation).await.summary.as_deref(),
        Some("Empty conversation")
    );
}

#[tokio::test]
async fn given_conversations_without_summary_when_backfilling_then_only_those_are_updated() {
    let harness = ConversationHarness::new();
    let legacy = unsummarized(&harness).await;
    let current = harness.seeded(&["hi"]).await;
    harness
        .repository
        .store_summary(current.id, "hand written")
        .await
        .unwrap();

    let report = harness
        .summaries
        .update_all_conversation_summaries()
        .await
        .unwrap();

    assert_eq!(report.updated, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(
        harness.stored(&legacy).await.summary.as_deref(),
        Some("No messages in conversation")
    );
    assert_eq!(
        harness.stored(&current).await.summary.as_deref(),
        Some("hand written")
    );
}

#[tokio::test]
async fn given_backfill_already_ran_when_running_again_then_nothing_changes() {
    let harness = ConversationHarness::new();
    let legacy = unsummarized(&harness).await;
    harness
        .summaries
        .update_all_conversation_summaries()
        .await
        .unwrap();
    let first = harness.stored(&legacy).await;

    let report = harness
        .summaries
        .update_all_conversation_summaries()
        .await
        .unwrap();

    assert_eq!(report.updated, 0);
    assert_eq!(harness.stored(&legacy).await, first);
}
