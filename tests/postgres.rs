//! Runs against a real PostgreSQL when `DATABASE_URL` is set; otherwise returns early.

use order_backend::schema::default_catalog;
use order_backend::{ensure_schema, PgSchemaStore, SchemaStore};
use std::time::{SystemTime, UNIX_EPOCH};

#[tokio::test]
async fn create_if_absent_against_postgres() -> Result<(), Box<dyn std::error::Error>> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping");
        return Ok(());
    };
    let millis = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis();
    let schema = format!("order_backend_test_{}", millis);

    let store = PgSchemaStore::connect(&url).await?;
    let catalog = default_catalog(&schema);

    let first = ensure_schema(&store, &catalog).await?;
    assert_eq!(first.created, vec!["clientes", "users", "orders", "order_items"]);

    let second = ensure_schema(&store, &catalog).await?;
    assert!(second.created.is_empty());
    assert_eq!(second.existing.len(), 4);
    assert!(store.table_exists(&schema, "order_items").await?);

    sqlx::query(&format!("DROP SCHEMA \"{}\" CASCADE", schema))
        .execute(store.pool())
        .await?;
    Ok(())
}
