use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use flatrepo::repository::Repository;
use flatrepo::types::PropertyValue;
use flatrepo::store::TreeStore;
use flatrepo::watch::ChangeListener;

use crate::integration::support::{fixture, repository};

fn counting(counter: &Arc<AtomicUsize>) -> Arc<dyn ChangeListener> {
    let counter = Arc::clone(counter);
    Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn each_saved_batch_notifies_once() {
    let fixture = fixture();
    let repo = repository(&fixture.store);
    let calls = Arc::new(AtomicUsize::new(0));
    repo.set_listener(Some(counting(&calls)));

    let store = &fixture.store;
    for i in 0..5 {
        store
            .set_property(fixture.p4, &format!("k{}", i), PropertyValue::Long(i))
            .unwrap();
    }
    store.save(fixture.p4).unwrap();
    store
        .set_property(fixture.p4, "k0", PropertyValue::Long(10))
        .unwrap();
    store.set_property(fixture.p4, "k9", PropertyValue::Boolean(true)).unwrap();
    store.save(fixture.p4).unwrap();

    repo.close();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn close_delivers_batches_already_accepted() {
    let fixture = fixture();
    let repo = repository(&fixture.store);
    let calls = Arc::new(AtomicUsize::new(0));
    let observed = Arc::clone(&calls);
    repo.set_listener(Some(Arc::new(move || {
        thread::sleep(Duration::from_millis(100));
        observed.fetch_add(1, Ordering::SeqCst);
    })));

    let store = &fixture.store;
    store.set_property(fixture.p4, "a", PropertyValue::Long(1)).unwrap();
    store.save(fixture.p4).unwrap();
    store.set_property(fixture.p4, "b", PropertyValue::Long(2)).unwrap();
    store.save(fixture.p4).unwrap();

    repo.close();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn checkin_is_a_single_change() {
    let fixture = fixture();
    let repo = repository(&fixture.store);
    let calls = Arc::new(AtomicUsize::new(0));
    repo.set_listener(Some(counting(&calls)));

    fixture.store.checkin(fixture.p4, "alice", Some("release")).unwrap();

    repo.close();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn cleared_listener_is_not_called() {
    let fixture = fixture();
    let repo = repository(&fixture.store);
    let calls = Arc::new(AtomicUsize::new(0));
    repo.set_listener(Some(counting(&calls)));
    repo.set_listener(None);

    fixture.store.checkin(fixture.p4, "alice", None).unwrap();

    repo.close();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn replaced_listener_receives_later_batches() {
    let fixture = fixture();
    let repo = repository(&fixture.store);
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    repo.set_listener(Some(counting(&first)));
    fixture.store.checkin(fixture.p4, "alice", None).unwrap();
    repo.close();

    let repo = repository(&fixture.store);
    repo.set_listener(Some(counting(&second)));
    fixture.store.checkin(fixture.p4, "bob", None).unwrap();
    repo.close();

    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 1);
}

#[test]
fn close_after_store_shutdown_is_quiet() {
    let fixture = fixture();
    let repo = repository(&fixture.store);
    fixture.store.close();
    repo.close();
    repo.close();
}
