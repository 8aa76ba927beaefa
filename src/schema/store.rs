//! Schema store seam and the "create every declared table if absent" operation.

use crate::error::AppError;
use crate::schema::types::{Catalog, TableDef};
use crate::schema::validator::{creation_order, validate};
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

/// Relational store the declared tables are created in.
#[async_trait]
pub trait SchemaStore: Send + Sync {
    /// Create the namespace (PostgreSQL schema) if it does not exist.
    async fn ensure_namespace(&self, schema: &str) -> Result<(), AppError>;

    async fn table_exists(&self, schema: &str, table: &str) -> Result<bool, AppError>;

    /// Create the table if it does not exist. Must not fail when it already does.
    async fn create_table(&self, schema: &str, table: &TableDef) -> Result<(), AppError>;
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SchemaReport {
    pub created: Vec<String>,
    pub existing: Vec<String>,
}

/// Validate the catalog, then create each absent table in dependency order.
/// Running it again against the same store creates nothing.
pub async fn ensure_schema(store: &dyn SchemaStore, catalog: &Catalog) -> Result<SchemaReport, AppError> {
    validate(catalog)?;
    let order = creation_order(catalog)?;

    store.ensure_namespace(&catalog.schema).await?;

    let mut report = SchemaReport::default();
    for table in order {
        if store.table_exists(&catalog.schema, &table.name).await? {
            debug!(table = %table.name, "table already exists");
            report.existing.push(table.name.clone());
            continue;
        }
        store.create_table(&catalog.schema, table).await?;
        debug!(table = %table.name, "table created");
        report.created.push(table.name.clone());
    }
    Ok(report)
}
