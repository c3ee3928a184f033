use std::io::Cursor;

use flatrepo::error::ApiError;
use flatrepo::repository::{FileData, FileItem, Repository};

use crate::integration::support::{fixture, repository};

fn is_unsupported<T: std::fmt::Debug>(result: Result<T, ApiError>) -> bool {
    matches!(result, Err(ApiError::UnsupportedOperation(_)))
}

#[test]
fn mutations_fail_without_touching_the_store() {
    let fixture = fixture();
    let repo = repository(&fixture.store);
    let before = repo.list("deploy").unwrap();
    let pending = fixture.store.pending_events();

    let data = FileData {
        name: "deploy/d1/p1".to_string(),
        ..FileData::default()
    };
    let item = FileItem {
        data: data.clone(),
        content: b"zip".to_vec(),
    };

    assert!(is_unsupported(repo.save(&data, &mut Cursor::new(b"x".to_vec()))));
    assert!(is_unsupported(repo.save_batch(vec![item])));
    assert!(is_unsupported(repo.delete(&data)));
    assert!(is_unsupported(repo.delete_history(&data)));
    assert!(is_unsupported(repo.copy_history("deploy/d1/p1", &data, None)));

    assert_eq!(repo.list("deploy").unwrap(), before);
    assert_eq!(fixture.store.pending_events(), pending);
}
