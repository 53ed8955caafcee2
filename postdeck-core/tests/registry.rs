use std::collections::HashSet;
use std::sync::Arc;

use postdeck_core::infra::InMemoryFileRecords;
use postdeck_core::metadata::GroupKey;
use postdeck_core::ports::FileRecordRepository;
use postdeck_core::registry::{CodeRegistry, GroupCodes};
use postdeck_model::{ContentHandle, NewFileRecord, UserId};

fn draft(handle: &str) -> NewFileRecord {
    NewFileRecord {
        content_handle: ContentHandle::new(handle),
        backup_pointer: None,
        caption: format!("caption {handle}"),
        delete_timer_seconds: 0,
        uploader_id: UserId(7),
    }
}

#[tokio::test]
async fn each_group_gets_its_own_code_and_repeats_share_it() {
    let files = Arc::new(InMemoryFileRecords::new());
    let registry = CodeRegistry::new(files.clone());
    let mut groups = GroupCodes::new();

    let uploads = [
        (GroupKey::episodic(1, 1), "e1-480"),
        (GroupKey::episodic(1, 1), "e1-720"),
        (GroupKey::episodic(1, 2), "e2-480"),
        (GroupKey::new("1080p"), "movie"),
    ];
    let mut codes = Vec::new();
    for (key, handle) in &uploads {
        let registration = registry
            .register_upload(&mut groups, key, draft(handle))
            .await
            .unwrap();
        codes.push(registration.code);
    }

    assert_eq!(codes[0], codes[1]);
    let distinct: HashSet<_> = codes.iter().collect();
    assert_eq!(distinct.len(), 3);
    assert_eq!(groups.len(), 3);

    let first_group = files.find_by_code(&codes[0]).await.unwrap();
    let handles: Vec<&str> = first_group
        .iter()
        .map(|r| r.content_handle.as_str())
        .collect();
    assert_eq!(handles, vec!["e1-480", "e1-720"]);
    assert_eq!(files.count().await.unwrap(), 4);
}

#[tokio::test]
async fn codes_are_scoped_to_one_session() {
    let files = Arc::new(InMemoryFileRecords::new());
    let registry = CodeRegistry::new(files);
    let key = GroupKey::new("720p");

    let mut first_session = GroupCodes::new();
    let mut second_session = GroupCodes::new();
    let a = registry
        .register_upload(&mut first_session, &key, draft("a"))
        .await
        .unwrap();
    let b = registry
        .register_upload(&mut second_session, &key, draft("b"))
        .await
        .unwrap();

    assert!(a.is_new_group && b.is_new_group);
    assert_ne!(a.code, b.code);
}

#[tokio::test]
async fn standalone_files_never_join_a_group() {
    let files = Arc::new(InMemoryFileRecords::new());
    let registry = CodeRegistry::new(files.clone());

    let a = registry.register_standalone(draft("a")).await.unwrap();
    let b = registry.register_standalone(draft("b")).await.unwrap();

    assert_ne!(a.code, b.code);
    assert_eq!(files.find_by_code(&a.code).await.unwrap().len(), 1);
}
