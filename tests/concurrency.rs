use local_store::{Error, Store};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn open(dir: &TempDir) -> Arc<Store> {
    Arc::new(
        Store::builder()
            .path(dir.path())
            .flush_interval(Duration::from_millis(20))
            .build()
            .unwrap(),
    )
}

#[test]
fn racing_creates_of_one_key_have_a_single_winner() {
    const THREADS: usize = 16;
    let dir = TempDir::new().unwrap();
    let db = open(&dir);
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let db = Arc::clone(&db);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                db.create("contested", &format!(r#"{{"writer": {i}}}"#))
                    .map(|()| i)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners: Vec<usize> = results.iter().filter_map(|r| r.as_ref().ok()).copied().collect();
    let losers = results
        .iter()
        .filter(|r| matches!(r, Err(Error::KeyExists { .. })))
        .count();

    assert_eq!(winners.len(), 1);
    assert_eq!(losers, THREADS - 1);
    assert_eq!(db.len(), 1);
    assert_eq!(db.read("contested").unwrap()["writer"], winners[0]);
}

#[test]
fn racing_recreates_of_an_expired_key_have_a_single_winner() {
    const THREADS: usize = 8;
    let dir = TempDir::new().unwrap();
    let db = open(&dir);
    db.create_with_ttl("stale", "{}", 0).unwrap();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let db = Arc::clone(&db);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                db.create("stale", r#"{"fresh": true}"#).is_ok()
            })
        })
        .collect();

    let wins = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert_eq!(wins, 1);
    assert_eq!(db.read("stale").unwrap()["fresh"], true);
}

#[test]
fn parallel_writers_on_distinct_keys_are_all_persisted() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 50;
    let dir = TempDir::new().unwrap();
    {
        let db = open(&dir);
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let db = Arc::clone(&db);
                thread::spawn(move || {
                    for n in 0..PER_THREAD {
                        db.create(&format!("t{t}-{n}"), &format!(r#"{{"n": {n}}}"#))
                            .unwrap();
                        if n % 5 == 0 {
                            db.delete(&format!("t{t}-{n}")).unwrap();
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        db.close_blocking();
    }

    let db = open(&dir);
    assert_eq!(db.len(), THREADS * (PER_THREAD - PER_THREAD / 5));
    assert_eq!(db.read("t3-7").unwrap()["n"], 7);
    assert!(db.read("t3-5").is_err());
}

#[test]
fn readers_and_deleters_do_not_trip_each_other() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir);
    db.create("anchor", "{}").unwrap();
    for i in 0..100 {
        db.create(&format!("k{i}"), "{}").unwrap();
    }

    let reader = {
        let db = Arc::clone(&db);
        thread::spawn(move || {
            for _ in 0..10 {
                for i in 0..100 {
                    match db.read(&format!("k{i}")) {
                        Ok(_) | Err(Error::KeyNotFound { .. }) => {}
                        Err(other) => panic!("unexpected error: {other}"),
                    }
                }
            }
        })
    };
    let deleter = {
        let db = Arc::clone(&db);
        thread::spawn(move || {
            for i in 0..100 {
                db.delete(&format!("k{i}")).unwrap();
            }
        })
    };
    reader.join().unwrap();
    deleter.join().unwrap();
    assert_eq!(db.len(), 1);
}
