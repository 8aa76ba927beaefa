//! Order backend host: greeting and health routes, optional permissive CORS, and
//! "create tables if absent" against PostgreSQL before the first request.

pub mod app;
pub mod config;
pub mod cors;
pub mod error;
pub mod host;
pub mod routes;
pub mod schema;
pub mod startup;

pub use app::{assemble, build};
pub use config::{HostConfig, Preset};
pub use cors::{AllowList, CorsPolicy};
pub use error::{AppError, ConfigError};
pub use host::{AppHost, HostOptions, Middleware, ReadyHost};
pub use schema::{ensure_schema, Catalog, MemorySchemaStore, PgSchemaStore, SchemaReport, SchemaStore};
pub use startup::{SchemaInitHook, SchemaState, StartupHook};
