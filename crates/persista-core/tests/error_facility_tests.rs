#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{MemoryConnector, User};
use persista_core::errors::{ExError, ExErrorKind, PersistError};
use persista_core::model::{ObjectExt, Persist};

#[test]
fn test_not_found_maps_to_recoverable_kind() {
    let mut connector = MemoryConnector::running();

    let err = User::find(&mut connector, 5).unwrap_err();
    let ex: ExError = err.into();

    assert_eq!(ex.kind(), ExErrorKind::NotFound);
    assert_eq!(ex.code(), "ERR_NOT_FOUND");
    assert_eq!(ex.model(), Some("user"));
    assert!(ex.kind().is_recoverable());
}

#[test]
fn test_stale_update_maps_to_deleted() {
    let mut connector = MemoryConnector::running();
    let created = User {
        id: Some(3),
        username: "gone".to_string(),
    }
    .create(&mut connector)
    .unwrap();
    created.delete(&mut connector).unwrap();

    let err = created.assign(&mut connector, "username", "x").unwrap_err();
    let ex: ExError = err.into();

    assert_eq!(ex.kind(), ExErrorKind::Deleted);
    assert_eq!(ex.key(), Some("3"));
    assert!(ex.to_string().contains("was deleted"));
}

#[test]
fn test_configuration_kinds() {
    let cases = [
        (
            PersistError::InsufficientConfiguration {
                reason: "no location".to_string(),
            },
            "ERR_INSUFFICIENT_CONFIGURATION",
        ),
        (
            PersistError::DriverNotFound {
                driver: "mongo".to_string(),
            },
            "ERR_DRIVER_NOT_FOUND",
        ),
        (
            PersistError::DriverInitialization {
                location: "/nope".to_string(),
                reason: "read-only".to_string(),
            },
            "ERR_DRIVER_INITIALIZATION",
        ),
    ];
    for (err, code) in cases {
        let ex: ExError = err.into();
        assert_eq!(ex.code(), code);
        assert!(!ex.kind().is_recoverable());
    }
}

#[test]
fn test_schema_errors_share_kind() {
    let unmapped = PersistError::UnmappedFieldType {
        model: "event".to_string(),
        field: "at".to_string(),
        field_type: "Datetime".to_string(),
    };
    let keyless = PersistError::MissingPrimaryKey {
        model: "note".to_string(),
    };
    assert_eq!(unmapped.kind(), ExErrorKind::Schema);
    assert_eq!(keyless.kind(), ExErrorKind::Schema);
}

#[test]
fn test_persistence_error_keeps_op() {
    let ex: ExError = PersistError::Persistence {
        op: "insert".to_string(),
        message: "UNIQUE constraint failed".to_string(),
    }
    .into();
    assert_eq!(ex.op(), Some("insert"));
    assert_eq!(ex.code(), "ERR_PERSISTENCE");
}
