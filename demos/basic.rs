use jsondb_cloud::{ApiErrorKind, Filter, FilterOp, JsonDb, JsonDbError, ListOptions};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let db = JsonDb::from_env()?;
    let users = db.collection("users");

    let alice = users
        .create(&json!({"name": "Alice", "email": "alice@example.com", "age": 31}))
        .await?;
    let id = alice["_id"].as_str().unwrap_or_default().to_owned();

    users.patch(&id, &json!({"age": 32})).await?;

    let page = users
        .list(
            &ListOptions::new()
                .filter(Filter::new().op("age", FilterOp::Gte, 21))
                .sort("-age")
                .limit(10),
        )
        .await?;
    for doc in page.iter() {
        println!("{doc}");
    }
    println!("total: {}, more: {}", page.meta.total, page.meta.has_more);

    users.delete(&id).await?;

    match users.get(&id).await {
        Err(JsonDbError::Api(err)) if matches!(err.kind, ApiErrorKind::NotFound { .. }) => {
            println!("deleted: {}", err.message);
        }
        other => println!("unexpected: {other:?}"),
    }

    Ok(())
}
