use neighborly_core::db::open_db;
use neighborly_core::{
    AgeReference, BlobHouseholdDirectory, BlobPostRepository, FilterCriteria, HouseholdRecord,
    HouseholdType, PostDraft, PostRepository, PostService, PostServiceError, SelectionLayer,
    SessionOptions, SqliteBlobStore, TargetingSession,
};

fn record(id: &str, kind: &str) -> HouseholdRecord {
    HouseholdRecord {
        id: id.to_string(),
        household_type: Some(kind.to_string()),
        ..HouseholdRecord::default()
    }
}

#[test]
fn new_post_goes_to_effective_selection_and_edit_only_grows() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_db(dir.path().join("neighborly.sqlite3")).unwrap();
    let store = SqliteBlobStore::new(&conn);

    let directory = BlobHouseholdDirectory::new(&store);
    directory
        .save_records(&[
            record("h1", "family"),
            record("h2", "family"),
            record("h3", "empty nesters"),
        ])
        .unwrap();

    let mut criteria = FilterCriteria::default();
    criteria.household_types.insert(HouseholdType::FamilyWithKids);
    let mut session = TargetingSession::new(SessionOptions {
        criteria,
        age_reference: Some(AgeReference::new(2026, 5)),
        ..SessionOptions::default()
    });
    session.load_roster(&directory);
    session.toggle_layer(SelectionLayer::Matches);

    let service = PostService::new(BlobPostRepository::new(&store));
    let post = service
        .create_post(
            PostDraft::event("Block party", 1_700_000_000_000, None),
            &session.effective_selection(),
        )
        .unwrap();
    assert_eq!(post.recipients, vec!["h1", "h2"]);
    session.dispose();

    let mut edit = service.begin_edit(post.id).unwrap();
    assert!(!edit.toggle_recipient("h1"));
    assert!(edit.toggle_recipient("h3"));
    let saved = service.save_edit(edit).unwrap();
    assert_eq!(saved.recipients, vec!["h1", "h2", "h3"]);

    let reloaded = service.get_post(post.id).unwrap().unwrap();
    assert_eq!(reloaded.recipients, vec!["h1", "h2", "h3"]);
}

#[test]
fn cancelled_edit_writes_nothing() {
    let conn = neighborly_core::db::open_db_in_memory().unwrap();
    let store = SqliteBlobStore::new(&conn);
    let service = PostService::new(BlobPostRepository::new(&store));
    let post = service
        .create_post(
            PostDraft::post("Lost keys", "near the park"),
            &["h1".to_string()].into_iter().collect(),
        )
        .unwrap();

    let mut edit = service.begin_edit(post.id).unwrap();
    edit.toggle_recipient("h9");
    service.cancel_edit(edit);

    let reloaded = service.get_post(post.id).unwrap().unwrap();
    assert_eq!(reloaded.recipients, vec!["h1"]);
}

#[test]
fn save_merges_into_recipients_changed_elsewhere() {
    let conn = neighborly_core::db::open_db_in_memory().unwrap();
    let store = SqliteBlobStore::new(&conn);
    let repo = BlobPostRepository::new(&store);
    let service = PostService::new(BlobPostRepository::new(&store));
    let post = service
        .create_post(
            PostDraft::post("Garage sale", ""),
            &["X".to_string(), "Y".to_string()].into_iter().collect(),
        )
        .unwrap();

    let mut edit = service.begin_edit(post.id).unwrap();
    edit.toggle_recipient("Z");

    let mut concurrent = repo.get_post(post.id).unwrap().unwrap();
    concurrent.recipients.push("W".to_string());
    repo.update_post(&concurrent).unwrap();

    let saved = service.save_edit(edit).unwrap();
    assert_eq!(saved.recipients, vec!["X", "Y", "W", "Z"]);
}

#[test]
fn empty_selection_cannot_be_posted() {
    let conn = neighborly_core::db::open_db_in_memory().unwrap();
    let service = PostService::new(BlobPostRepository::new(SqliteBlobStore::new(&conn)));
    let session = TargetingSession::new(SessionOptions::default());

    let err = service
        .create_post(PostDraft::post("Hello", ""), &session.effective_selection())
        .unwrap_err();
    assert!(matches!(err, PostServiceError::EmptyAudience));
}
