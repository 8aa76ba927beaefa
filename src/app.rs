//! Wires a [`HostConfig`] into an [`AppHost`]: middleware, routes, and the schema startup hook.

use crate::config::HostConfig;
use crate::error::{AppError, ConfigError};
use crate::host::{AppHost, HostOptions, Middleware};
use crate::routes::{self, docs};
use crate::schema::postgres::redact;
use crate::schema::{default_catalog, ensure_database_exists, validate, Catalog, PgSchemaStore};
use crate::startup::SchemaInitHook;
use axum::http::Method;
use std::sync::Arc;
use tracing::info;

/// Host for `config`. `schema_hook` is registered as the only startup hook when given.
pub fn assemble(config: &HostConfig, schema_hook: Option<Arc<SchemaInitHook>>) -> Result<AppHost, ConfigError> {
    let mut host = AppHost::with_options(HostOptions {
        title: config.title.clone(),
        middleware: vec![Middleware::Trace],
    });
    if let Some(policy) = &config.cors {
        host.layer(Middleware::Cors(policy.clone()));
    }
    host.layer(Middleware::BodyLimit(config.body_limit));

    let greeting: Arc<str> = Arc::from(config.greeting.as_str());
    host.route(Method::GET, "/", move || routes::root(greeting.clone()))?;
    if config.health {
        host.route(Method::GET, "/health", routes::health)?;
    }

    let doc = Arc::new(docs::document(&config.title, &host.routes()));
    host.route(Method::GET, docs::DOCS_PATH, move || docs::serve(doc.clone()))?;

    if let Some(hook) = schema_hook {
        host.on_startup(hook);
    }
    Ok(host)
}

/// Assemble the host, connecting to PostgreSQL first when schema initialization is enabled.
pub async fn build(config: &HostConfig) -> Result<AppHost, AppError> {
    let hook = if config.schema_init {
        Some(Arc::new(schema_hook(config).await?))
    } else {
        None
    };
    Ok(assemble(config, hook)?)
}

/// Catalog from `SCHEMA_CATALOG` if set, otherwise the built-in tables in `DB_SCHEMA`.
pub async fn load_catalog(config: &HostConfig) -> Result<Catalog, ConfigError> {
    let catalog = match &config.catalog_path {
        Some(path) => Catalog::from_json_file(path).await?,
        None => default_catalog(&config.db_schema),
    };
    validate(&catalog)?;
    Ok(catalog)
}

async fn schema_hook(config: &HostConfig) -> Result<SchemaInitHook, AppError> {
    let url = config
        .database_url
        .as_deref()
        .ok_or(ConfigError::MissingVar("DATABASE_URL"))?;
    let catalog = load_catalog(config).await?;

    info!(database = %redact(url), tables = catalog.tables.len(), "connecting to schema store");
    if config.create_database {
        ensure_database_exists(url).await?;
    }
    let store = PgSchemaStore::connect(url).await?;
    Ok(SchemaInitHook::new(Arc::new(store), catalog))
}
