pub mod builtin;
pub mod ddl;
pub mod memory;
pub mod postgres;
pub mod store;
pub mod types;
pub mod validator;

pub use builtin::default_catalog;
pub use memory::MemorySchemaStore;
pub use postgres::{ensure_database_exists, PgSchemaStore};
pub use store::{ensure_schema, SchemaReport, SchemaStore};
pub use types::*;
pub use validator::{creation_order, validate};
