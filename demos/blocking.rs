use jsondb_cloud::{blocking::JsonDb, BulkOperation};
use serde_json::json;

fn main() -> anyhow::Result<()> {
    let db = JsonDb::from_env()?;
    let posts = db.collection("posts");

    let result = posts.bulk(&[
        BulkOperation::create(json!({"title": "Hello"})),
        BulkOperation::create(json!({"title": "World"})),
        BulkOperation::delete("stale-post"),
    ])?;

    for item in &result.results {
        match &item.error {
            Some(error) => eprintln!("status {}: {error}", item.status),
            None => println!("status {}: {:?}", item.status, item.id),
        }
    }
    println!(
        "{} of {} operations succeeded",
        result.summary.succeeded, result.summary.total
    );

    println!("collections: {:?}", db.list_collections()?);
    db.close();
    Ok(())
}
