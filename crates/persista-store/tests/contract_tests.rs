#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Behavior every backend must share, run once per driver

mod common;

macro_rules! contract_suite {
    ($module:ident, $driver:expr) => {
        mod $module {
            use std::collections::HashSet;
            use std::rc::Rc;

            use persista_core::connector::{Connector, Lookup};
            use persista_core::errors::PersistError;
            use persista_core::model::{ObjectExt, Persist};
            use proptest::prelude::*;
            use tempfile::TempDir;

            use crate::common::{connect, teardown, user, Membership, User};

            const DRIVER: &str = $driver;

            #[test]
            fn create() {
                let dir = TempDir::new().unwrap();
                let mut connector = connect(DRIVER, &dir);

                let kredh = user("Kredh").create(&mut connector).unwrap();

                assert_eq!(kredh.borrow().username, "Kredh");
                assert!(kredh.borrow().id.is_some(), "key assigned on create");
            }

            #[test]
            fn update() {
                let dir = TempDir::new().unwrap();
                let mut connector = connect(DRIVER, &dir);
                let nitrate = user("Nitrate").create(&mut connector).unwrap();

                nitrate.assign(&mut connector, "username", "Erwyn").unwrap();

                assert_eq!(nitrate.borrow().username, "Erwyn");
            }

            #[test]
            fn save_and_reload() {
                let dir = TempDir::new().unwrap();
                let mut connector = connect(DRIVER, &dir);
                let percyst = user("Percyst").create(&mut connector).unwrap();
                let uid = percyst.borrow().id.unwrap();
                let count = User::all(&mut connector).unwrap().len();
                teardown(connector);

                let mut connector = connect(DRIVER, &dir);
                let retrieved = User::find(&mut connector, uid).unwrap();

                assert_eq!(retrieved.borrow().id, Some(uid));
                assert_eq!(retrieved.borrow().username, "Percyst");
                assert!(!Rc::ptr_eq(&retrieved, &percyst));
                assert_eq!(User::all(&mut connector).unwrap().len(), count);
            }

            #[test]
            fn updates_survive_reload() {
                let dir = TempDir::new().unwrap();
                let mut connector = connect(DRIVER, &dir);
                let created = user("Before").create(&mut connector).unwrap();
                let uid = created.borrow().id.unwrap();
                created.assign(&mut connector, "username", "After").unwrap();
                teardown(connector);

                let mut connector = connect(DRIVER, &dir);
                let retrieved = User::find(&mut connector, uid).unwrap();
                assert_eq!(retrieved.borrow().username, "After");
            }

            #[test]
            fn clear_cache_reloads_from_storage() {
                let dir = TempDir::new().unwrap();
                let mut connector = connect(DRIVER, &dir);
                let kept = user("Kept").create(&mut connector).unwrap();
                let uid = kept.borrow().id.unwrap();
                teardown(connector);

                let mut connector = connect(DRIVER, &dir);
                user("Pending").create(&mut connector).unwrap();
                connector.clear_cache();

                let reloaded = User::find(&mut connector, uid).unwrap();
                assert_eq!(reloaded.borrow().username, "Kept");
                assert_eq!(User::all(&mut connector).unwrap().len(), 2);
                teardown(connector);

                let mut connector = connect(DRIVER, &dir);
                let names: HashSet<String> = User::all(&mut connector)
                    .unwrap()
                    .iter()
                    .map(|u| u.borrow().username.clone())
                    .collect();
                assert!(names.contains("Kept"));
                assert!(names.contains("Pending"));
            }

            #[test]
            fn delete_blocks_update() {
                let dir = TempDir::new().unwrap();
                let mut connector = connect(DRIVER, &dir);
                let noway = user("Noway").create(&mut connector).unwrap();

                noway.delete(&mut connector).unwrap();

                let err = noway.assign(&mut connector, "username", "no").unwrap_err();
                assert!(matches!(err, PersistError::ObjectDeleted { .. }));
                assert!(noway.is_deleted(&connector));
            }

            #[test]
            fn deleted_records_stay_gone_after_reload() {
                let dir = TempDir::new().unwrap();
                let mut connector = connect(DRIVER, &dir);
                let gone = user("Gone").create(&mut connector).unwrap();
                let uid = gone.borrow().id.unwrap();
                gone.delete(&mut connector).unwrap();
                teardown(connector);

                let mut connector = connect(DRIVER, &dir);
                let err = User::find(&mut connector, uid).unwrap_err();
                assert!(matches!(err, PersistError::NotFound { .. }));
            }

            #[test]
            fn primary_keys_are_unique() {
                let dir = TempDir::new().unwrap();
                let mut connector = connect(DRIVER, &dir);
                for name in ["a", "b", "c", "d"] {
                    user(name).create(&mut connector).unwrap();
                }

                let users = User::all(&mut connector).unwrap();
                let ids: HashSet<_> = users.iter().map(|u| u.borrow().id).collect();

                assert_eq!(ids.len(), users.len());
            }

            #[test]
            fn explicit_duplicate_key_rejected() {
                let dir = TempDir::new().unwrap();
                let mut connector = connect(DRIVER, &dir);
                let first = Membership {
                    group_id: 1,
                    user_id: 1,
                    role: "owner".to_string(),
                };
                first.clone().create(&mut connector).unwrap();

                let err = first.create(&mut connector).unwrap_err();

                assert!(matches!(err, PersistError::DuplicateKey { .. }));
            }

            #[test]
            fn auto_increment_is_monotonic() {
                let dir = TempDir::new().unwrap();
                let mut connector = connect(DRIVER, &dir);
                user("Atlist").create(&mut connector).unwrap();

                let max_id = User::all(&mut connector)
                    .unwrap()
                    .iter()
                    .filter_map(|u| u.borrow().id)
                    .max()
                    .unwrap();
                let ideafix = user("Ideafix").create(&mut connector).unwrap();
                let new_id = ideafix.borrow().id.unwrap();
                assert!(max_id < new_id);
                teardown(connector);

                let mut connector = connect(DRIVER, &dir);
                let overall = user("Overall").create(&mut connector).unwrap();
                assert!(new_id < overall.borrow().id.unwrap());
            }

            #[test]
            fn find_returns_same_instance() {
                let dir = TempDir::new().unwrap();
                let mut connector = connect(DRIVER, &dir);
                let martha = user("Martha").create(&mut connector).unwrap();
                let uid = martha.borrow().id.unwrap();

                let positional = User::find(&mut connector, uid).unwrap();
                let keyword = User::find_by(&mut connector, &Lookup::new().eq("id", uid)).unwrap();

                assert!(Rc::ptr_eq(&martha, &positional));
                assert!(Rc::ptr_eq(&positional, &keyword));
            }

            #[test]
            fn find_by_non_key_field() {
                let dir = TempDir::new().unwrap();
                let mut connector = connect(DRIVER, &dir);
                let created = user("Searched").create(&mut connector).unwrap();
                teardown(connector);

                let mut connector = connect(DRIVER, &dir);
                let found = User::find_by(&mut connector, &Lookup::new().eq("username", "Searched"))
                    .unwrap();
                let again = User::find(&mut connector, found.borrow().id.unwrap()).unwrap();

                assert_eq!(found.borrow().id, created.borrow().id);
                assert!(Rc::ptr_eq(&found, &again));
            }

            #[test]
            fn find_unknown_field_rejected() {
                let dir = TempDir::new().unwrap();
                let mut connector = connect(DRIVER, &dir);

                let err = User::find_by(&mut connector, &Lookup::new().eq("email", "x")).unwrap_err();

                assert!(matches!(err, PersistError::UnknownField { .. }));
            }

            #[test]
            fn not_found_caches_nothing() {
                let dir = TempDir::new().unwrap();
                let mut connector = connect(DRIVER, &dir);

                let err = User::find(&mut connector, 9999).unwrap_err();

                assert!(matches!(err, PersistError::NotFound { .. }));
                assert_eq!(connector.state().cached_count("user"), 0);
            }

            #[test]
            fn get_all_contains_created() {
                let dir = TempDir::new().unwrap();
                let mut connector = connect(DRIVER, &dir);
                let crowd = user("Crowd").create(&mut connector).unwrap();

                let users = User::all(&mut connector).unwrap();

                assert!(users.iter().any(|u| Rc::ptr_eq(u, &crowd)));
            }

            #[test]
            fn get_all_skips_deleted() {
                let dir = TempDir::new().unwrap();
                let mut connector = connect(DRIVER, &dir);
                let kept = user("Kept").create(&mut connector).unwrap();
                let dropped = user("Dropped").create(&mut connector).unwrap();
                dropped.delete(&mut connector).unwrap();

                let users = User::all(&mut connector).unwrap();

                assert_eq!(users.len(), 1);
                assert!(Rc::ptr_eq(&users[0], &kept));
            }

            #[test]
            fn composite_keys_round_trip() {
                let dir = TempDir::new().unwrap();
                let mut connector = connect(DRIVER, &dir);
                Membership {
                    group_id: 3,
                    user_id: 7,
                    role: "member".to_string(),
                }
                .create(&mut connector)
                .unwrap();
                teardown(connector);

                let mut connector = connect(DRIVER, &dir);
                let lookup = Lookup::new().eq("group_id", 3).eq("user_id", 7);
                let found = Membership::find_by(&mut connector, &lookup).unwrap();

                assert_eq!(found.borrow().role, "member");
            }

            #[test]
            fn destroy_erases_data() {
                let dir = TempDir::new().unwrap();
                let mut connector = connect(DRIVER, &dir);
                let created = user("Ephemeral").create(&mut connector).unwrap();
                let uid = created.borrow().id.unwrap();
                connector.tick().unwrap();

                connector.destroy().unwrap();

                let mut connector = connect(DRIVER, &dir);
                assert!(User::find(&mut connector, uid).is_err());
                assert!(User::all(&mut connector).unwrap().is_empty());
            }

            proptest! {
                #![proptest_config(ProptestConfig::with_cases(16))]

                #[test]
                fn usernames_survive_reload(name in "[a-zA-Z0-9 _'\"-]{0,24}") {
                    let dir = TempDir::new().unwrap();
                    let mut connector = connect(DRIVER, &dir);
                    let created = user(&name).create(&mut connector).unwrap();
                    let uid = created.borrow().id.unwrap();
                    teardown(connector);

                    let mut connector = connect(DRIVER, &dir);
                    let found = User::find(&mut connector, uid).unwrap();
                    prop_assert_eq!(&found.borrow().username, &name);
                }
            }
        }
    };
}

contract_suite!(sqlite, "sqlite3");
contract_suite!(yaml, "yaml");
