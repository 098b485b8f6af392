use local_store::Store;
use std::time::Duration;

fn main() -> Result<(), local_store::Error> {
    let dir = std::env::temp_dir().join("local_store_example_builder");

    // pretty-printed snapshot, written via temp file + rename every 200ms
    let db = Store::builder()
        .path(&dir)
        .file_name("inventory.db")
        .flush_interval(Duration::from_millis(200))
        .pretty(true)
        .atomic_writes(true)
        .build()?;

    let _ = db.delete("name");
    db.create("name", r#"{"value": "local-store"}"#)?;
    db.create_value("status", &serde_json::json!({"value": "ok"}), 60)
        .or_else(|e| match e {
            local_store::Error::KeyExists { .. } => Ok(()),
            other => Err(other),
        })?;
    db.flush()?;

    // the file on disk is now nicely indented
    let contents = std::fs::read_to_string(db.path())?;
    println!("On-disk JSON:\n{contents}");

    println!("\nDebug output: {db:?}");
    println!("stats: {:?}", db.persist_stats());

    let _ = std::fs::remove_dir_all(&dir);
    Ok(())
}
