use dashmap::DashMap;
use local_store::backend::MapBackend;
use local_store::{Error, Record, Store, StoreBuilder};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;
use tempfile::TempDir;

type LockedMap = RwLock<HashMap<String, Record>>;

fn open<M>(dir: &TempDir) -> Store<M>
where
    M: MapBackend<String, Record> + Default + 'static,
{
    StoreBuilder::<M>::new()
        .path(dir.path())
        .flush_interval(Duration::from_millis(50))
        .build()
        .unwrap()
}

fn crud_contract<M>()
where
    M: MapBackend<String, Record> + Default + 'static,
{
    let dir = TempDir::new().unwrap();
    {
        let db = open::<M>(&dir);
        assert!(matches!(db.read("a"), Err(Error::EmptyStore { .. })));
        db.create("a", r#"{"n": 1}"#).unwrap();
        assert!(matches!(
            db.create("a", r#"{"n": 2}"#),
            Err(Error::KeyExists { .. })
        ));
        db.create_with_ttl("b", r#"{"n": 2}"#, 0).unwrap();
        assert!(matches!(db.read("b"), Err(Error::Expired { .. })));
        db.create("c", r#"{"n": 3}"#).unwrap();
        db.delete("c").unwrap();
        assert_eq!(db.len(), 1);
        db.flush().unwrap();
    }

    let db = open::<M>(&dir);
    assert_eq!(db.read("a").unwrap()["n"], 1);
    assert_eq!(db.len(), 1);
}

#[test]
fn dashmap_backend() {
    crud_contract::<DashMap<String, Record>>();
}

#[test]
fn rwlock_hashmap_backend() {
    crud_contract::<LockedMap>();
}

#[test]
fn backends_share_the_snapshot_format() {
    let dir = TempDir::new().unwrap();
    {
        let db = open::<LockedMap>(&dir);
        db.create("shared", r#"{"from": "rwlock"}"#).unwrap();
        db.close_blocking();
    }
    let db = open::<DashMap<String, Record>>(&dir);
    assert_eq!(db.read("shared").unwrap()["from"], "rwlock");
}
