//! In-process schema store for tests. Rejects tables whose foreign keys point at tables it does not hold,
//! the same way PostgreSQL would.

use crate::error::{AppError, ConfigError};
use crate::schema::store::SchemaStore;
use crate::schema::types::TableDef;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct MemorySchemaStore {
    namespaces: Mutex<BTreeSet<String>>,
    tables: Mutex<BTreeMap<(String, String), TableDef>>,
    create_calls: AtomicUsize,
}

impl MemorySchemaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Qualified names (`schema.table`) of every table held.
    pub fn tables(&self) -> Vec<String> {
        self.tables
            .lock()
            .map(|t| t.keys().map(|(s, n)| format!("{}.{}", s, n)).collect())
            .unwrap_or_default()
    }

    /// Number of `create_table` calls received, including ones for tables that already existed.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

fn poisoned() -> AppError {
    AppError::Config(ConfigError::Load("schema store lock poisoned".into()))
}

#[async_trait]
impl SchemaStore for MemorySchemaStore {
    async fn ensure_namespace(&self, schema: &str) -> Result<(), AppError> {
        self.namespaces.lock().map_err(|_| poisoned())?.insert(schema.to_string());
        Ok(())
    }

    async fn table_exists(&self, schema: &str, table: &str) -> Result<bool, AppError> {
        let tables = self.tables.lock().map_err(|_| poisoned())?;
        Ok(tables.contains_key(&(schema.to_string(), table.to_string())))
    }

    async fn create_table(&self, schema: &str, table: &TableDef) -> Result<(), AppError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if !self.namespaces.lock().map_err(|_| poisoned())?.contains(schema) {
            return Err(AppError::NotFound(format!("schema {}", schema)));
        }
        let mut tables = self.tables.lock().map_err(|_| poisoned())?;
        for dep in table.dependencies() {
            if !tables.contains_key(&(schema.to_string(), dep.to_string())) {
                return Err(AppError::NotFound(format!("relation {}.{}", schema, dep)));
            }
        }
        tables
            .entry((schema.to_string(), table.name.clone()))
            .or_insert_with(|| table.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::builtin::default_catalog;
    use crate::schema::store::ensure_schema;
    use crate::schema::types::Catalog;

    #[tokio::test]
    async fn creates_all_then_nothing() {
        let store = MemorySchemaStore::new();
        let catalog = default_catalog("public");

        let first = ensure_schema(&store, &catalog).await.unwrap();
        assert_eq!(first.created, vec!["clientes", "users", "orders", "order_items"]);
        assert!(first.existing.is_empty());

        let second = ensure_schema(&store, &catalog).await.unwrap();
        assert!(second.created.is_empty());
        assert_eq!(second.existing.len(), 4);
        assert_eq!(store.tables().len(), 4);
        assert_eq!(store.create_calls(), 4);
    }

    #[tokio::test]
    async fn missing_foreign_table_fails() {
        let store = MemorySchemaStore::new();
        store.ensure_namespace("public").await.unwrap();
        let catalog = default_catalog("public");
        let orders = catalog.table("orders").unwrap();
        assert!(matches!(
            store.create_table("public", orders).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn invalid_catalog_creates_nothing() {
        let store = MemorySchemaStore::new();
        let mut catalog: Catalog = default_catalog("public");
        catalog.tables.push(catalog.tables[0].clone());
        assert!(ensure_schema(&store, &catalog).await.is_err());
        assert!(store.tables().is_empty());
    }
}
