//! Lock Helper Tests

use std::sync::{Arc, Mutex, RwLock};

use strata_domain::Error;
use strata_infrastructure::locks::{Guarded, lock_mutex, read_lock, write_lock};

#[test]
fn test_locks_grant_access() {
    let mutex = Mutex::new(1);
    *lock_mutex(&mutex, Guarded::Listeners).unwrap() += 1;
    assert_eq!(*lock_mutex(&mutex, Guarded::Listeners).unwrap(), 2);

    let rwlock = RwLock::new(vec![1]);
    write_lock(&rwlock, Guarded::NodeState("app")).unwrap().push(2);
    assert_eq!(read_lock(&rwlock, Guarded::NodeState("app")).unwrap().len(), 2);
}

#[test]
fn test_guarded_names_the_node() {
    assert_eq!(
        Guarded::NodeState("app").to_string(),
        "state of registry 'app'"
    );
    assert_eq!(
        Guarded::Forwarders("app").to_string(),
        "orphan forwarders of registry 'app'"
    );
    assert_eq!(Guarded::Listeners.to_string(), "listener collection");
}

#[test]
fn test_poisoned_lock_maps_to_internal_error() {
    let state = Arc::new(RwLock::new(()));
    let poisoner = Arc::clone(&state);
    let _ = std::thread::spawn(move || {
        let _guard = poisoner.write().unwrap();
        panic!("factory panicked");
    })
    .join();

    match read_lock(&state, Guarded::NodeState("request-42")) {
        Err(Error::Internal { message }) => {
            assert!(message.contains("poisoned"));
            assert!(message.contains("registry 'request-42'"));
        }
        _ => panic!("Expected Internal error"),
    }

    let mutex = Arc::new(Mutex::new(()));
    let poisoner = Arc::clone(&mutex);
    let _ = std::thread::spawn(move || {
        let _guard = poisoner.lock().unwrap();
        panic!("listener panicked");
    })
    .join();
    assert!(matches!(
        lock_mutex(&mutex, Guarded::Listeners),
        Err(Error::Internal { .. })
    ));
}
