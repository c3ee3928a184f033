use flatrepo::error::ApiError;
use flatrepo::repository::Repository;

use crate::integration::support::{add_file, fixture, repository};

/// p4 revisions: 0 technical, 1 content, 2 blank comment on empty state, 3 comment
fn fixture_with_history() -> crate::integration::support::Fixture {
    let fixture = fixture();
    let store = &fixture.store;
    let p4 = fixture.p4;

    let children = flatrepo::store::TreeStore::children(store.as_ref(), p4).unwrap();
    for child in children {
        store.remove_node(child).unwrap();
    }
    store.checkin(p4, "system", None).unwrap();
    add_file(store, p4, "d.xlsx", b"delta");
    store.checkin(p4, "alice", None).unwrap();
    let children = flatrepo::store::TreeStore::children(store.as_ref(), p4).unwrap();
    for child in children {
        store.remove_node(child).unwrap();
    }
    store.checkin(p4, "system", Some("  ")).unwrap();
    add_file(store, p4, "e.xlsx", b"epsilon");
    store.checkin(p4, "bob", Some("add e")).unwrap();
    fixture
}

#[test]
fn history_skips_technical_revisions_in_store_order() {
    let fixture = fixture_with_history();
    let repo = repository(&fixture.store);

    let history = repo.list_history("rules/p4").unwrap();
    let versions: Vec<&str> = history.iter().filter_map(|d| d.version.as_deref()).collect();
    assert_eq!(versions, vec!["1", "3"]);
    assert!(history.iter().all(|d| d.name == "rules/p4"));
    assert_eq!(history[1].comment.as_deref(), Some("add e"));
}

#[test]
fn history_of_unversioned_folder_is_empty() {
    let fixture = fixture();
    let repo = repository(&fixture.store);
    assert!(repo.list_history("deploy/d1").unwrap().is_empty());
    assert!(repo.list_history("missing").unwrap().is_empty());
}

#[test]
fn check_history_without_version_equals_check() {
    let fixture = fixture_with_history();
    let repo = repository(&fixture.store);

    assert_eq!(
        repo.check_history("rules/p4", None).unwrap(),
        repo.check("rules/p4").unwrap()
    );
}

#[test]
fn check_history_selects_a_revision() {
    let fixture = fixture_with_history();
    let repo = repository(&fixture.store);

    let v1 = repo.check_history("rules/p4", Some("1")).unwrap().unwrap();
    assert_eq!(v1.version.as_deref(), Some("1"));
    assert_eq!(v1.author.as_deref(), Some("alice"));
    assert_eq!(v1.name, "rules/p4");

    let padded = repo.check_history("rules/p4", Some(" 1 ")).unwrap().unwrap();
    assert_eq!(padded, v1);
}

#[test]
fn non_numeric_version_is_a_format_error() {
    let fixture = fixture_with_history();
    let repo = repository(&fixture.store);

    let err = repo.check_history("rules/p4", Some("abc")).unwrap_err();
    assert!(matches!(err, ApiError::InvalidVersionFormat { .. }));
    assert!(err.to_string().contains("version must be a number"));

    let err = repo.read_history("rules/p4", Some("1.5")).unwrap_err();
    assert!(matches!(err, ApiError::InvalidVersionFormat { .. }));
}

#[test]
fn unknown_revision_is_a_wrapped_store_error() {
    let fixture = fixture_with_history();
    let repo = repository(&fixture.store);

    let err = repo.check_history("rules/p4", Some("9999999")).unwrap_err();
    assert!(err.is_version_not_found());
    assert!(matches!(err, ApiError::Store { .. }));
    assert!(!matches!(err, ApiError::InvalidVersionFormat { .. }));
}

#[test]
fn read_history_archives_the_old_state() {
    let fixture = fixture_with_history();
    let repo = repository(&fixture.store);

    let item = repo.read_history("rules/p4", Some("1")).unwrap().unwrap();
    let archive = zip::ZipArchive::new(std::io::Cursor::new(item.content)).unwrap();
    assert_eq!(archive.file_names().collect::<Vec<_>>(), vec!["d.xlsx"]);

    let current = repo.read_history("rules/p4", None).unwrap().unwrap();
    let archive = zip::ZipArchive::new(std::io::Cursor::new(current.content)).unwrap();
    assert_eq!(archive.file_names().collect::<Vec<_>>(), vec!["e.xlsx"]);
}
