#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::rc::Rc;

use common::{membership, MemoryConnector, Membership, User};
use persista_core::connector::{Connector, Lookup};
use persista_core::errors::PersistError;
use persista_core::model::{ObjectExt, Persist, PrimaryKey, Value};

fn admin() -> User {
    User {
        id: Some(1),
        username: "admin".to_string(),
    }
}

#[test]
fn test_find_returns_cached_instance() {
    let mut connector = MemoryConnector::running();
    let created = admin().create(&mut connector).unwrap();

    let found = User::find(&mut connector, 1).unwrap();

    assert!(Rc::ptr_eq(&created, &found));
    assert_eq!(connector.reads, 0, "cache hit must not touch storage");
}

#[test]
fn test_find_by_keyword_and_positional_agree() {
    let mut connector = MemoryConnector::running();
    admin().create(&mut connector).unwrap();

    let positional = User::find(&mut connector, 1).unwrap();
    let keyword = User::find_by(&mut connector, &Lookup::new().eq("id", 1)).unwrap();

    assert!(Rc::ptr_eq(&positional, &keyword));
}

#[test]
fn test_cache_miss_loads_once_then_hits() {
    let mut connector = MemoryConnector::running();
    connector.insert_row(&admin());

    let first = User::find(&mut connector, 1).unwrap();
    let second = User::find(&mut connector, 1).unwrap();

    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(connector.reads, 1);
}

#[test]
fn test_not_found_caches_nothing() {
    let mut connector = MemoryConnector::running();

    let err = User::find(&mut connector, 42).unwrap_err();

    assert!(matches!(err, PersistError::NotFound { .. }));
    assert_eq!(connector.state().cached_count("user"), 0);
}

#[test]
fn test_get_from_cache_projects_primary_key() {
    let mut connector = MemoryConnector::running();
    let created = admin().create(&mut connector).unwrap();

    let hit = User::cached(
        &connector,
        &Lookup::new().eq("username", "ignored").eq("id", 1),
    )
    .unwrap();
    assert!(Rc::ptr_eq(&created, &hit));

    // No key attribute projects to a null key, which is never cached
    assert!(User::cached(&connector, &Lookup::new().eq("username", "admin")).is_none());
}

#[test]
fn test_composite_key_lookup() {
    let mut connector = MemoryConnector::running();
    let created = membership(1, 2, "owner").create(&mut connector).unwrap();

    let key = PrimaryKey::Composite(vec![Value::Integer(1), Value::Integer(2)]);
    let found: Rc<_> = connector.state().cached::<Membership>(&key).unwrap();
    assert!(Rc::ptr_eq(&created, &found));

    let lookup = Lookup::primary_key::<Membership>([Value::Integer(1), Value::Integer(2)]).unwrap();
    assert!(Rc::ptr_eq(
        &created,
        &Membership::find_by(&mut connector, &lookup).unwrap()
    ));
}

#[test]
fn test_wrong_key_arity_rejected() {
    let err = Lookup::primary_key::<Membership>([Value::Integer(1)]).unwrap_err();
    assert!(matches!(err, PersistError::InvalidLookup { .. }));
}

#[test]
fn test_delete_tombstones_and_blocks_update() {
    let mut connector = MemoryConnector::running();
    let created = admin().create(&mut connector).unwrap();

    created.delete(&mut connector).unwrap();

    assert!(created.is_deleted(&connector));
    let err = created
        .assign(&mut connector, "username", "other")
        .unwrap_err();
    assert!(matches!(err, PersistError::ObjectDeleted { .. }));
    assert_eq!(created.borrow().username, "admin", "instance left untouched");
}

#[test]
fn test_uncache_of_uncached_key_is_noop() {
    let mut connector = MemoryConnector::running();
    let stray = Rc::new(std::cell::RefCell::new(admin()));

    connector.uncache_object(&stray);

    assert!(!connector.was_deleted(&stray));
}

#[test]
fn test_tombstones_survive_clear_cache() {
    let mut connector = MemoryConnector::running();
    let created = admin().create(&mut connector).unwrap();
    created.delete(&mut connector).unwrap();

    connector.clear_cache();

    assert!(connector.was_deleted(&created));
    assert!(User::cached(&connector, &Lookup::new().eq("id", 1)).is_none());
}

#[test]
fn test_clear_cache_forces_reload_as_new_instance() {
    let mut connector = MemoryConnector::running();
    let created = admin().create(&mut connector).unwrap();

    connector.clear_cache();
    let reloaded = User::find(&mut connector, 1).unwrap();

    assert!(!Rc::ptr_eq(&created, &reloaded));
    assert_eq!(*created.borrow(), *reloaded.borrow());
}

#[test]
fn test_assign_persists_through_update() {
    let mut connector = MemoryConnector::running();
    let created = admin().create(&mut connector).unwrap();

    created
        .assign(&mut connector, "username", "root")
        .unwrap();

    let stored = connector
        .stored::<User>(&PrimaryKey::Scalar(Value::Integer(1)))
        .unwrap();
    assert_eq!(stored[1], Value::from("root"));
}

#[test]
fn test_assign_rejects_primary_key_and_unknown_fields() {
    let mut connector = MemoryConnector::running();
    let created = admin().create(&mut connector).unwrap();

    let err = created.assign(&mut connector, "id", 7).unwrap_err();
    assert!(matches!(err, PersistError::ImmutablePrimaryKey { .. }));

    let err = created.assign(&mut connector, "email", "x").unwrap_err();
    assert!(matches!(err, PersistError::UnknownField { .. }));
}

#[test]
fn test_assign_type_mismatch_leaves_value() {
    let mut connector = MemoryConnector::running();
    let created = admin().create(&mut connector).unwrap();

    let err = created.assign(&mut connector, "username", 5).unwrap_err();

    assert!(matches!(err, PersistError::TypeMismatch { .. }));
    assert_eq!(created.borrow().username, "admin");
}

#[test]
fn test_failed_update_restores_value() {
    let mut connector = MemoryConnector::running();
    let created = admin().create(&mut connector).unwrap();
    connector.fail_updates = true;

    let err = created
        .assign(&mut connector, "username", "root")
        .unwrap_err();

    assert!(matches!(err, PersistError::Persistence { .. }));
    assert_eq!(created.borrow().username, "admin");
    let stored = connector
        .stored::<User>(&PrimaryKey::Scalar(Value::Integer(1)))
        .unwrap();
    assert_eq!(stored[1], Value::from("admin"));
}

#[test]
fn test_unrecorded_model_rejected() {
    let mut connector = MemoryConnector::new();

    let err = admin().create(&mut connector).unwrap_err();

    assert_eq!(
        err,
        PersistError::ModelNotRecorded {
            model: "user".to_string()
        }
    );
}

#[test]
fn test_record_tables_sets_running_and_is_idempotent() {
    let mut connector = MemoryConnector::running();
    assert!(connector.state().is_running());
    admin().create(&mut connector).unwrap();

    connector
        .record_tables(&[persista_core::ModelType::of::<User>()])
        .unwrap();

    assert_eq!(connector.state().cached_count("user"), 1);
}

#[test]
fn test_get_all_in_key_order() {
    let mut connector = MemoryConnector::running();
    for (id, name) in [(3, "c"), (1, "a"), (2, "b")] {
        User {
            id: Some(id),
            username: name.to_string(),
        }
        .create(&mut connector)
        .unwrap();
    }

    let names: Vec<_> = User::all(&mut connector)
        .unwrap()
        .iter()
        .map(|u| u.borrow().username.clone())
        .collect();

    assert_eq!(names, vec!["a", "b", "c"]);
}
