//! Declarative table definitions (the catalog) as read from JSON or built in code.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Catalog {
    /// PostgreSQL schema (namespace) the tables live in.
    #[serde(default = "default_namespace")]
    pub schema: String,
    pub tables: Vec<TableDef>,
}

pub fn default_namespace() -> String {
    "public".into()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryKeyDef {
    Single(String),
    Composite(Vec<String>),
}

impl PrimaryKeyDef {
    pub fn columns(&self) -> Vec<&str> {
        match self {
            PrimaryKeyDef::Single(s) => vec![s.as_str()],
            PrimaryKeyDef::Composite(v) => v.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckDef {
    pub name: String,
    pub expression: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub primary_key: PrimaryKeyDef,
    #[serde(default)]
    pub unique: Vec<Vec<String>>,
    #[serde(default)]
    pub check: Vec<CheckDef>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl TableDef {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Names of other tables this one references through foreign keys.
    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter_map(|c| c.references.as_ref())
            .map(|fk| fk.table.as_str())
            .filter(move |t| *t != self.name)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default = "default_true")]
    pub nullable: bool,
    /// SQL expression used verbatim after DEFAULT.
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub references: Option<ForeignKeyDef>,
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ForeignKeyDef {
    pub table: String,
    pub column: String,
    #[serde(default)]
    pub on_delete: Option<String>,
}

impl ColumnDef {
    pub fn new(name: &str, type_: &str) -> Self {
        Self {
            name: name.into(),
            type_: type_.into(),
            nullable: true,
            default: None,
            references: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn default_expr(mut self, expr: &str) -> Self {
        self.default = Some(expr.into());
        self
    }

    pub fn references(mut self, table: &str, column: &str, on_delete: Option<&str>) -> Self {
        self.references = Some(ForeignKeyDef {
            table: table.into(),
            column: column.into(),
            on_delete: on_delete.map(Into::into),
        });
        self
    }
}

impl Catalog {
    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(|e| ConfigError::Load(format!("catalog: {}", e)))
    }

    pub async fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&raw)
    }
}
