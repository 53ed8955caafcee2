mod support;

use std::sync::Arc;
use std::time::Duration;

use postdeck_core::infra::InMemoryFileRecords;
use postdeck_core::ports::FileRecordRepository;
use postdeck_core::retrieval::{RetrievalOutcome, RetrievalService};
use postdeck_model::{
    ChatId, ContentHandle, MessageId, MessageRef, NewFileRecord, RetrievalCode, UserId,
};
use support::{ARCHIVE, RecordingMessenger, Sent};

const VIEWER: ChatId = ChatId(42);

fn code() -> RetrievalCode {
    RetrievalCode::parse("Ab3dE6gH").unwrap()
}

async fn store(files: &InMemoryFileRecords, handle: &str, backup: i32, timer: u32) {
    let record = NewFileRecord {
        content_handle: ContentHandle::new(handle),
        backup_pointer: Some(MessageRef::new(ARCHIVE, MessageId(backup))),
        caption: format!("caption {handle}"),
        delete_timer_seconds: timer,
        uploader_id: UserId(1),
    }
    .into_record(code());
    files.insert(&record).await.unwrap();
}

fn service(
    files: &Arc<InMemoryFileRecords>,
    messenger: &Arc<RecordingMessenger>,
) -> RetrievalService<InMemoryFileRecords, RecordingMessenger> {
    RetrievalService::new(Arc::clone(files), Arc::clone(messenger))
}

#[tokio::test]
async fn unknown_codes_are_expired() {
    let files = Arc::new(InMemoryFileRecords::new());
    let messenger = Arc::new(RecordingMessenger::new());

    let outcome = service(&files, &messenger)
        .deliver(VIEWER, &code())
        .await
        .unwrap();

    assert_eq!(outcome, RetrievalOutcome::Expired);
    assert!(messenger.log().await.is_empty());
}

#[tokio::test]
async fn every_file_of_the_group_is_sent_in_order() {
    let files = Arc::new(InMemoryFileRecords::new());
    let messenger = Arc::new(RecordingMessenger::new());
    store(&files, "h480", 10, 0).await;
    store(&files, "h720", 11, 0).await;

    let outcome = service(&files, &messenger)
        .deliver(VIEWER, &code())
        .await
        .unwrap();

    let RetrievalOutcome::Delivered {
        delivered,
        failed,
        delete_after,
        ..
    } = outcome
    else {
        panic!("expected delivery, got {outcome:?}");
    };
    assert_eq!(delivered.len(), 2);
    assert_eq!(failed, 0);
    assert_eq!(delete_after, None);
    assert_eq!(
        messenger.media_to(VIEWER).await,
        vec![ContentHandle::new("h480"), ContentHandle::new("h720")]
    );
}

#[tokio::test]
async fn stale_handles_fall_back_to_the_archive_copy() {
    let files = Arc::new(InMemoryFileRecords::new());
    let messenger = Arc::new(RecordingMessenger::new());
    store(&files, "stale", 10, 0).await;
    store(&files, "fresh", 11, 0).await;
    messenger.fail_handle("stale").await;

    let outcome = service(&files, &messenger)
        .deliver(VIEWER, &code())
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        RetrievalOutcome::Delivered { ref delivered, failed: 0, .. } if delivered.len() == 2
    ));
    let copies: Vec<MessageRef> = messenger
        .log()
        .await
        .into_iter()
        .filter_map(|sent| match sent {
            Sent::Copy { chat, source, .. } if chat == VIEWER => Some(source),
            _ => None,
        })
        .collect();
    assert_eq!(copies, vec![MessageRef::new(ARCHIVE, MessageId(10))]);
}

#[tokio::test]
async fn partial_failures_still_deliver_the_rest() {
    let files = Arc::new(InMemoryFileRecords::new());
    let messenger = Arc::new(RecordingMessenger::new());
    store(&files, "gone", 10, 0).await;
    store(&files, "fine", 11, 0).await;
    messenger.fail_handle("gone").await;
    messenger.fail_copies_to(VIEWER).await;

    let outcome = service(&files, &messenger)
        .deliver(VIEWER, &code())
        .await
        .unwrap();

    match outcome {
        RetrievalOutcome::Delivered {
            delivered, failed, ..
        } => {
            assert_eq!(delivered.len(), 1);
            assert_eq!(failed, 1);
        }
        other => panic!("expected delivery, got {other:?}"),
    }
}

#[tokio::test]
async fn nothing_deliverable_is_reported() {
    let files = Arc::new(InMemoryFileRecords::new());
    let messenger = Arc::new(RecordingMessenger::new());
    store(&files, "gone", 10, 0).await;
    messenger.fail_handle("gone").await;
    messenger.fail_copies_to(VIEWER).await;

    let outcome = service(&files, &messenger)
        .deliver(VIEWER, &code())
        .await
        .unwrap();

    assert!(matches!(outcome, RetrievalOutcome::AllFailed { ref records } if records.len() == 1));
}

#[tokio::test(start_paused = true)]
async fn delivered_messages_are_deleted_after_the_longest_timer() {
    let files = Arc::new(InMemoryFileRecords::new());
    let messenger = Arc::new(RecordingMessenger::new());
    store(&files, "short", 10, 60).await;
    store(&files, "long", 11, 600).await;

    let outcome = service(&files, &messenger)
        .deliver(VIEWER, &code())
        .await
        .unwrap();
    let RetrievalOutcome::Delivered {
        delivered,
        delete_after,
        ..
    } = outcome
    else {
        panic!("expected delivery, got {outcome:?}");
    };
    assert_eq!(delete_after, Some(Duration::from_secs(600)));

    tokio::time::sleep(Duration::from_secs(599)).await;
    assert!(messenger.deleted().await.is_empty());

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(messenger.deleted().await, delivered);
}
