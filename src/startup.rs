//! Boot-time tasks run by the host before it accepts requests.

use crate::error::AppError;
use crate::schema::{ensure_schema, Catalog, SchemaReport, SchemaStore};
use async_trait::async_trait;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

/// A task run once, in registration order, before the first request is dispatched.
#[async_trait]
pub trait StartupHook: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self) -> Result<(), AppError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaState {
    NotInitialized,
    Initialized,
}

/// Creates every catalog table that does not exist yet.
pub struct SchemaInitHook {
    store: Arc<dyn SchemaStore>,
    catalog: Catalog,
    report: OnceLock<SchemaReport>,
}

impl SchemaInitHook {
    pub fn new(store: Arc<dyn SchemaStore>, catalog: Catalog) -> Self {
        Self {
            store,
            catalog,
            report: OnceLock::new(),
        }
    }

    pub fn state(&self) -> SchemaState {
        if self.report.get().is_some() {
            SchemaState::Initialized
        } else {
            SchemaState::NotInitialized
        }
    }

    pub fn report(&self) -> Option<&SchemaReport> {
        self.report.get()
    }
}

#[async_trait]
impl StartupHook for SchemaInitHook {
    fn name(&self) -> &str {
        "schema-init"
    }

    async fn run(&self) -> Result<(), AppError> {
        if self.state() == SchemaState::Initialized {
            warn!("schema already initialized; skipping");
            return Ok(());
        }
        info!(schema = %self.catalog.schema, "creating tables if they do not exist");
        let report = ensure_schema(self.store.as_ref(), &self.catalog).await?;
        info!(
            created = report.created.len(),
            existing = report.existing.len(),
            "tables created successfully"
        );
        if self.report.set(report).is_err() {
            warn!("schema initialization finished twice; keeping the first report");
        }
        Ok(())
    }
}

/// Lets a hook be registered on the host while the caller keeps a handle to inspect it.
#[async_trait]
impl<H: StartupHook + ?Sized> StartupHook for Arc<H> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn run(&self) -> Result<(), AppError> {
        (**self).run().await
    }
}
