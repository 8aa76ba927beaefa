//! PostgreSQL schema store (sqlx).

use crate::error::{AppError, ConfigError};
use crate::schema::ddl::{comment_sql, create_schema_sql, create_table_sql, quote};
use crate::schema::store::SchemaStore;
use crate::schema::types::TableDef;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;
use tracing::{info, warn};

pub struct PgSchemaStore {
    pool: PgPool,
}

impl PgSchemaStore {
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SchemaStore for PgSchemaStore {
    async fn ensure_namespace(&self, schema: &str) -> Result<(), AppError> {
        // public always exists and CREATE SCHEMA needs privileges a plain app role may lack
        if schema == "public" {
            return Ok(());
        }
        sqlx::query(&create_schema_sql(schema)).execute(&self.pool).await?;
        Ok(())
    }

    async fn table_exists(&self, schema: &str, table: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_schema = $1 AND table_name = $2)",
        )
        .bind(schema)
        .bind(table)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create_table(&self, schema: &str, table: &TableDef) -> Result<(), AppError> {
        sqlx::query(&create_table_sql(schema, table))
            .execute(&self.pool)
            .await?;
        if let Some(sql) = comment_sql(schema, table) {
            if let Err(e) = sqlx::query(&sql).execute(&self.pool).await {
                warn!(table = %table.name, error = %e, "could not set table comment");
            }
        }
        Ok(())
    }
}

/// Connect to the `postgres` maintenance database and create the target database if it is missing.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = PgConnectOptions::from_str(&admin_url).map_err(|_| ConfigError::InvalidValue {
        key: "DATABASE_URL",
        value: redact(database_url),
    })?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        sqlx::query(&format!("CREATE DATABASE {}", quote(&db_name)))
            .execute(&mut conn)
            .await?;
        info!(database = %db_name, "database created");
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), ConfigError> {
    let scheme_end = url.find("://").map(|i| i + 3).unwrap_or(0);
    let path_start = url[scheme_end..]
        .find('/')
        .map(|i| scheme_end + i + 1)
        .ok_or_else(|| ConfigError::InvalidValue {
            key: "DATABASE_URL",
            value: redact(url),
        })?;
    let (base, path_and_query) = url.split_at(path_start);
    let mut parts = path_and_query.splitn(2, '?');
    let db_name = parts.next().unwrap_or("").trim().to_string();
    let admin_url = match parts.next() {
        Some(q) => format!("{}postgres?{}", base, q),
        None => format!("{}postgres", base),
    };
    Ok((admin_url, db_name))
}

/// Drop the password from a connection URL before it ends up in a log line or error.
pub fn redact(url: &str) -> String {
    let Some(scheme_end) = url.find("://").map(|i| i + 3) else {
        return url.to_string();
    };
    let rest = &url[scheme_end..];
    match (rest.find('@'), rest.find(':')) {
        (Some(at), Some(colon)) if colon < at => {
            format!("{}{}:***{}", &url[..scheme_end], &rest[..colon], &rest[at..])
        }
        _ => url.to_string(),
    }
}
