//! Process-wide node directory

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use strata_infrastructure::container::{
    Registry, RegistryDirectory, RegistryListener, SharedListener, directory,
};

use super::unique;

/// Records whether its node was still tracked when it was disposed
struct PresenceCheck {
    node_id: String,
    tracked_on_dispose: Mutex<Option<bool>>,
}

#[async_trait]
impl RegistryListener for PresenceCheck {
    async fn dispose(&self) -> strata_domain::Result<()> {
        *self.tracked_on_dispose.lock().unwrap() = Some(directory().has(&self.node_id));
        Ok(())
    }
}

#[test]
fn test_lookup_operations() {
    let id = unique("directory-lookup");
    let node = Registry::of(&id).unwrap();

    assert!(std::ptr::eq(directory(), RegistryDirectory::global()));
    assert!(directory().has(&id));
    assert!(directory().get(&id).unwrap().ptr_eq(&node));
    assert!(directory().find(&id).unwrap().ptr_eq(&node));
    assert!(directory().ids().contains(&id));
    assert!(!directory().is_empty());
    assert!(directory().len() >= 2);

    let ids = directory().ids();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);

    let missing = unique("directory-missing");
    assert!(directory().find(&missing).is_none());
    assert!(directory().get(&missing).unwrap_err().is_conflict());
}

#[test]
fn test_default_node_is_tracked() {
    let default = Registry::default_registry();
    assert!(directory().get("default").unwrap().ptr_eq(&default));
}

#[test]
fn test_duplicate_registration_conflicts() {
    let node = Registry::of(&unique("directory-duplicate")).unwrap();
    let error = directory().register(node.clone()).unwrap_err();
    assert!(error.is_conflict());
}

#[tokio::test]
async fn test_disposed_nodes_cannot_be_registered() {
    let id = unique("directory-disposed");
    let node = Registry::of(&id).unwrap();
    node.dispose().await.unwrap();
    assert!(!directory().has(&id));

    let error = directory().register(node).unwrap_err();
    assert!(error.is_invalid_usage());
}

#[tokio::test]
async fn test_remove_disposes_the_node() {
    let id = unique("directory-remove");
    let node = Registry::of(&id).unwrap();
    let check = Arc::new(PresenceCheck {
        node_id: id.clone(),
        tracked_on_dispose: Mutex::new(None),
    });
    let listener: SharedListener = check.clone();
    node.accept_listener(listener).unwrap();

    directory().remove(&id).await.unwrap();
    assert!(node.is_disposed());
    assert!(!directory().has(&id));
    assert_eq!(*check.tracked_on_dispose.lock().unwrap(), Some(false));

    let error = directory().remove(&id).await.unwrap_err();
    assert!(error.is_conflict());
}

#[tokio::test]
async fn test_removed_id_can_be_reused() {
    let id = unique("directory-reuse");
    let first = Registry::of(&id).unwrap();
    directory().remove(&id).await.unwrap();

    let second = Registry::of(&id).unwrap();
    assert!(!second.ptr_eq(&first));
    assert!(directory().get(&id).unwrap().ptr_eq(&second));
}
