//! Property tests for create-time validation.

use local_store::{Error, Store};
use proptest::prelude::*;
use std::time::Duration;
use tempfile::TempDir;

fn open(dir: &TempDir) -> Store {
    Store::builder()
        .path(dir.path())
        .flush_interval(Duration::from_secs(3600))
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn out_of_range_keys_never_touch_the_map(key in "[a-z0-9]{33,80}") {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);
        let err = db.create(&key, "{}").unwrap_err();
        let is_length_error = matches!(err, Error::InvalidKeyLength { length, .. } if length == key.len());
        prop_assert!(is_length_error);
        prop_assert!(db.is_empty());
    }

    #[test]
    fn in_range_keys_round_trip(key in "\\PC{1,32}", n in any::<i64>()) {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);
        db.create(&key, &format!(r#"{{"n": {n}}}"#)).unwrap();
        prop_assert_eq!(db.read(&key).unwrap()["n"].as_i64(), Some(n));
    }

    #[test]
    fn non_object_json_is_rejected(
        payload in prop_oneof![
            any::<i64>().prop_map(|n| n.to_string()),
            any::<bool>().prop_map(|b| b.to_string()),
            "[a-z]{0,10}".prop_map(|s| format!("[\"{s}\"]")),
            "[a-z]{0,10}".prop_map(|s| format!("\"{s}\"")),
        ]
    ) {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);
        let is_json_error = matches!(db.create("k", &payload), Err(Error::InvalidJson { .. }));
        prop_assert!(is_json_error);
        prop_assert!(db.is_empty());
    }
}
