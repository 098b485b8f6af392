use local_store::{Error, Store};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "local_store=debug".into()),
        )
        .init();

    let dir = std::env::temp_dir().join("local_store_example_basic");
    let db = Store::open(&dir)?;

    // create / read / delete
    match db.create("apples", r#"{"count": 3}"#) {
        Ok(()) => println!("created apples"),
        Err(Error::KeyExists { .. }) => println!("apples already there from a previous run"),
        Err(e) => return Err(e),
    }
    println!("apples  = {:?}", db.read("apples")?);

    db.create_with_ttl("bananas", r#"{"count": 5}"#, 1)?;
    println!("bananas = {:?}", db.read("bananas")?);
    std::thread::sleep(std::time::Duration::from_millis(1200));
    println!("bananas after 1.2s = {}", db.read("bananas").unwrap_err());

    // validation errors carry readable messages
    println!("{}", db.create("", "{}").unwrap_err());
    println!("{}", db.create("pears", "[1, 2]").unwrap_err());

    println!("len = {}", db.len());
    db.delete("apples")?;

    // wait for the last snapshot before exiting
    db.close_blocking();
    println!("snapshot at {}", db.path().display());
    Ok(())
}
