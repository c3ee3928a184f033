use std::sync::Arc;

use flatrepo::repository::{FlatRepository, RepositoryOptions};
use flatrepo::store::{MemoryTreeStore, TreeStore};
use flatrepo::types::{NodeId, NodeKind};

/// Store with two deployments, a plain rules folder and a lock marker:
///
/// ```text
/// deploy/d1/p1/{a.xlsx, sub/b.xlsx}
/// deploy/d1/p2/
/// deploy/d1/readme.txt
/// deploy/d2/p3/c.xlsx
/// deploy/d3/only.txt
/// deploy/notes.txt
/// rules/p4/d.xlsx
/// rules/p4.lock
/// ```
pub struct Fixture {
    pub store: Arc<MemoryTreeStore>,
    pub p1: NodeId,
    pub p4: NodeId,
}

pub fn add_folder(store: &MemoryTreeStore, parent: NodeId, name: &str) -> NodeId {
    store.add_child(parent, name, NodeKind::Folder).unwrap()
}

pub fn add_project(store: &MemoryTreeStore, parent: NodeId, name: &str) -> NodeId {
    store.add_child(parent, name, NodeKind::Project).unwrap()
}

pub fn add_file(store: &MemoryTreeStore, parent: NodeId, name: &str, content: &[u8]) -> NodeId {
    let file = store.add_child(parent, name, NodeKind::Resource).unwrap();
    store.set_content(file, content.to_vec()).unwrap();
    file
}

pub fn fixture() -> Fixture {
    let store = Arc::new(MemoryTreeStore::new());
    let root = store.root().unwrap();

    let deploy = add_folder(&store, root, "deploy");
    let d1 = add_folder(&store, deploy, "d1");
    let p1 = add_project(&store, d1, "p1");
    add_file(&store, p1, "a.xlsx", b"alpha");
    let sub = add_folder(&store, p1, "sub");
    add_file(&store, sub, "b.xlsx", b"beta");
    add_project(&store, d1, "p2");
    add_file(&store, d1, "readme.txt", b"read me");
    let d2 = add_folder(&store, deploy, "d2");
    let p3 = add_project(&store, d2, "p3");
    add_file(&store, p3, "c.xlsx", b"gamma");
    let d3 = add_folder(&store, deploy, "d3");
    add_file(&store, d3, "only.txt", b"no projects here");
    add_file(&store, deploy, "notes.txt", b"notes");

    let rules = add_folder(&store, root, "rules");
    let p4 = add_project(&store, rules, "p4");
    add_file(&store, p4, "d.xlsx", b"delta");
    store.add_child(rules, "p4.lock", NodeKind::Lock).unwrap();

    store.save(root).unwrap();
    store.checkin(p1, "alice", Some("first release")).unwrap();

    Fixture { store, p1, p4 }
}

pub fn repository(store: &Arc<MemoryTreeStore>) -> FlatRepository {
    let store: Arc<dyn TreeStore> = store.clone();
    FlatRepository::new(store, RepositoryOptions::default()).unwrap()
}

pub fn names(entries: &[flatrepo::repository::FileData]) -> Vec<&str> {
    entries.iter().map(|d| d.name.as_str()).collect()
}
