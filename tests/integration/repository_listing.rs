use flatrepo::repository::Repository;

use crate::integration::support::{fixture, names, repository};

#[test]
fn deploy_listing_flattens_two_levels() {
    let fixture = fixture();
    let repo = repository(&fixture.store);

    let entries = repo.list("deploy").unwrap();
    assert_eq!(
        names(&entries),
        vec!["deploy/d1/p1", "deploy/d1/p2", "deploy/d2/p3"]
    );
}

#[test]
fn deployment_holding_only_files_contributes_nothing() {
    let fixture = fixture();
    let repo = repository(&fixture.store);

    let entries = repo.list("deploy").unwrap();
    assert!(names(&entries)
        .iter()
        .all(|name| *name != "deploy/d3" && !name.starts_with("deploy/d3/")));
    assert!(repo.list("deploy/d3").unwrap().is_empty());
}

#[test]
fn deploy_listing_ignores_surrounding_slashes() {
    let fixture = fixture();
    let repo = repository(&fixture.store);

    assert_eq!(
        names(&repo.list("/deploy/").unwrap()),
        names(&repo.list("deploy").unwrap())
    );
}

#[test]
fn nested_deploy_path_is_a_plain_listing() {
    let fixture = fixture();
    let repo = repository(&fixture.store);

    let entries = repo.list("deploy/d1").unwrap();
    assert_eq!(names(&entries), vec!["deploy/d1/p1", "deploy/d1/p2"]);
}

#[test]
fn lock_markers_never_appear() {
    let fixture = fixture();
    let repo = repository(&fixture.store);

    let entries = repo.list("rules").unwrap();
    assert_eq!(names(&entries), vec!["rules/p4"]);
    assert!(repo.check("rules/p4.lock").unwrap().is_none());
}

#[test]
fn missing_paths_are_absent_not_errors() {
    let fixture = fixture();
    let repo = repository(&fixture.store);

    assert!(repo.list("nowhere/at/all").unwrap().is_empty());
    assert!(repo.check("nowhere").unwrap().is_none());
    assert!(repo.read("nowhere").unwrap().is_none());
}

#[test]
fn summaries_carry_version_metadata() {
    let fixture = fixture();
    let repo = repository(&fixture.store);

    let p1 = repo.check("deploy/d1/p1").unwrap().unwrap();
    assert_eq!(p1.version.as_deref(), Some("0"));
    assert_eq!(p1.author.as_deref(), Some("alice"));
    assert_eq!(p1.comment.as_deref(), Some("first release"));
    assert!(p1.modified_at.is_some());
    assert_eq!(p1.size, None);

    let p2 = repo.check("deploy/d1/p2").unwrap().unwrap();
    assert_eq!(p2.size, Some(0));
    assert_eq!(p2.author, None);
}
