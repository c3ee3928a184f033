use std::io::{Cursor, Read};

use flatrepo::archive::{ArchiveOptions, Compression};
use flatrepo::repository::{FlatRepository, Repository, RepositoryOptions};
use flatrepo::store::TreeStore;
use zip::ZipArchive;

use crate::integration::support::{fixture, repository};

fn entries(bytes: Vec<u8>) -> Vec<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut content = Vec::new();
            file.read_to_end(&mut content).unwrap();
            (file.name().to_string(), content)
        })
        .collect()
}

#[test]
fn folder_read_packs_every_resource_with_relative_paths() {
    let fixture = fixture();
    let repo = repository(&fixture.store);

    let item = repo.read("deploy/d1/p1").unwrap().unwrap();
    assert_eq!(item.data.name, "deploy/d1/p1");
    assert_eq!(
        entries(item.content),
        vec![
            ("a.xlsx".to_string(), b"alpha".to_vec()),
            ("sub/b.xlsx".to_string(), b"beta".to_vec()),
        ]
    );
}

#[test]
fn archive_skips_lock_markers() {
    let fixture = fixture();
    let repo = repository(&fixture.store);

    let item = repo.read("rules").unwrap().unwrap();
    let names: Vec<String> = entries(item.content).into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["p4/d.xlsx"]);
}

#[test]
fn empty_folder_reads_as_empty_archive() {
    let fixture = fixture();
    let repo = repository(&fixture.store);

    let item = repo.read("deploy/d1/p2").unwrap().unwrap();
    assert_eq!(item.data.size, Some(0));
    assert!(entries(item.content).is_empty());
}

#[test]
fn repeated_reads_are_byte_identical() {
    let fixture = fixture();
    let repo = repository(&fixture.store);

    let first = repo.read("deploy").unwrap().unwrap();
    let second = repo.read("deploy").unwrap().unwrap();
    assert_eq!(first.content, second.content);
}

#[test]
fn deflated_archives_hold_the_same_entries() {
    let fixture = fixture();
    let stored = repository(&fixture.store).read("deploy").unwrap().unwrap();

    let store: std::sync::Arc<dyn TreeStore> = fixture.store.clone();
    let options = RepositoryOptions {
        archive: ArchiveOptions {
            compression: Compression::Deflated,
        },
        ..RepositoryOptions::default()
    };
    let deflated = FlatRepository::new(store, options)
        .unwrap()
        .read("deploy")
        .unwrap()
        .unwrap();

    assert_eq!(entries(stored.content), entries(deflated.content));
}
