//! Catalog validation: identifiers, referential integrity, and creation order.

use crate::error::ConfigError;
use crate::schema::types::{Catalog, TableDef};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

const REFERENTIAL_ACTIONS: &[&str] = &["NO ACTION", "RESTRICT", "CASCADE", "SET NULL", "SET DEFAULT"];

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex"))
}

pub fn check_identifier(name: &str) -> Result<(), ConfigError> {
    if name.len() > 63 || !identifier_re().is_match(name) {
        return Err(ConfigError::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

pub fn validate(catalog: &Catalog) -> Result<(), ConfigError> {
    check_identifier(&catalog.schema)?;

    let mut tables: HashMap<&str, &TableDef> = HashMap::new();
    for t in &catalog.tables {
        check_identifier(&t.name)?;
        if tables.insert(t.name.as_str(), t).is_some() {
            return Err(ConfigError::DuplicateTable(t.name.clone()));
        }
    }

    for t in &catalog.tables {
        let mut seen = HashSet::new();
        for c in &t.columns {
            check_identifier(&c.name)?;
            if !seen.insert(c.name.as_str()) {
                return Err(ConfigError::DuplicateColumn {
                    table: t.name.clone(),
                    column: c.name.clone(),
                });
            }
        }

        for pk in t.primary_key.columns() {
            if !seen.contains(pk) {
                return Err(ConfigError::InvalidPrimaryKey {
                    table: t.name.clone(),
                    column: pk.to_string(),
                });
            }
        }

        for col in t.unique.iter().flatten() {
            if !seen.contains(col.as_str()) {
                return Err(ConfigError::MissingReference {
                    kind: "column",
                    id: format!("{}.{}", t.name, col),
                });
            }
        }
        for ch in &t.check {
            check_identifier(&ch.name)?;
        }

        for c in &t.columns {
            let Some(fk) = &c.references else { continue };
            let target = tables.get(fk.table.as_str()).ok_or_else(|| ConfigError::MissingReference {
                kind: "table",
                id: fk.table.clone(),
            })?;
            if target.column(&fk.column).is_none() {
                return Err(ConfigError::MissingReference {
                    kind: "column",
                    id: format!("{}.{}", fk.table, fk.column),
                });
            }
            if let Some(action) = &fk.on_delete {
                if !REFERENTIAL_ACTIONS.contains(&action.to_uppercase().as_str()) {
                    return Err(ConfigError::Load(format!(
                        "unknown ON DELETE action '{}' on {}.{}",
                        action, t.name, c.name
                    )));
                }
            }
        }
    }

    Ok(())
}

/// Tables ordered so every referenced table comes before the tables that reference it.
/// Ties keep declaration order. Call after [`validate`].
pub fn creation_order(catalog: &Catalog) -> Result<Vec<&TableDef>, ConfigError> {
    let index: HashMap<&str, usize> = catalog
        .tables
        .iter()
        .enumerate()
        .map(|(i, t)| (t.name.as_str(), i))
        .collect();

    let mut pending: Vec<usize> = vec![0; catalog.tables.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); catalog.tables.len()];
    for (i, t) in catalog.tables.iter().enumerate() {
        let deps: HashSet<&str> = t.dependencies().collect();
        for dep in deps {
            if let Some(&j) = index.get(dep) {
                pending[i] += 1;
                dependents[j].push(i);
            }
        }
    }

    let mut done = vec![false; catalog.tables.len()];
    let mut order = Vec::with_capacity(catalog.tables.len());
    while order.len() < catalog.tables.len() {
        let Some(next) = (0..catalog.tables.len()).find(|&i| !done[i] && pending[i] == 0) else {
            let stuck = catalog
                .tables
                .iter()
                .enumerate()
                .filter(|(i, _)| !done[*i])
                .map(|(_, t)| t.name.clone())
                .collect();
            return Err(ConfigError::DependencyCycle(stuck));
        };
        done[next] = true;
        for &d in &dependents[next] {
            pending[d] -= 1;
        }
        order.push(&catalog.tables[next]);
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{ColumnDef, PrimaryKeyDef};

    fn table(name: &str, refs: &[&str]) -> TableDef {
        let mut columns = vec![ColumnDef::new("id", "SERIAL").not_null()];
        for r in refs {
            columns.push(ColumnDef::new(&format!("{}_id", r), "INTEGER").references(r, "id", None));
        }
        TableDef {
            name: name.into(),
            columns,
            primary_key: PrimaryKeyDef::Single("id".into()),
            unique: vec![],
            check: vec![],
            comment: None,
        }
    }

    fn catalog(tables: Vec<TableDef>) -> Catalog {
        Catalog {
            schema: "public".into(),
            tables,
        }
    }

    fn names(tables: Vec<&TableDef>) -> Vec<&str> {
        tables.into_iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn referenced_tables_come_first() {
        let c = catalog(vec![table("items", &["orders"]), table("orders", &["clients"]), table("clients", &[])]);
        validate(&c).unwrap();
        assert_eq!(names(creation_order(&c).unwrap()), vec!["clients", "orders", "items"]);
    }

    #[test]
    fn independent_tables_keep_declaration_order() {
        let c = catalog(vec![table("b", &[]), table("a", &[]), table("c", &[])]);
        assert_eq!(names(creation_order(&c).unwrap()), vec!["b", "a", "c"]);
    }

    #[test]
    fn cycle_is_rejected() {
        let c = catalog(vec![table("a", &["b"]), table("b", &["a"]), table("c", &[])]);
        match creation_order(&c) {
            Err(ConfigError::DependencyCycle(tables)) => assert_eq!(tables, vec!["a", "b"]),
            other => panic!("expected cycle, got {:?}", other.map(names)),
        }
    }

    #[test]
    fn self_reference_is_allowed() {
        let c = catalog(vec![table("node", &["node"])]);
        validate(&c).unwrap();
        assert_eq!(names(creation_order(&c).unwrap()), vec!["node"]);
    }

    #[test]
    fn unknown_foreign_table() {
        let c = catalog(vec![table("orders", &["ghosts"])]);
        assert!(matches!(
            validate(&c),
            Err(ConfigError::MissingReference { kind: "table", .. })
        ));
    }

    #[test]
    fn duplicate_table_and_column() {
        let c = catalog(vec![table("a", &[]), table("a", &[])]);
        assert!(matches!(validate(&c), Err(ConfigError::DuplicateTable(t)) if t == "a"));

        let mut t = table("a", &[]);
        t.columns.push(ColumnDef::new("id", "TEXT"));
        assert!(matches!(
            validate(&catalog(vec![t])),
            Err(ConfigError::DuplicateColumn { .. })
        ));
    }

    #[test]
    fn primary_key_must_exist() {
        let mut t = table("a", &[]);
        t.primary_key = PrimaryKeyDef::Single("missing".into());
        assert!(matches!(
            validate(&catalog(vec![t])),
            Err(ConfigError::InvalidPrimaryKey { .. })
        ));
    }

    #[test]
    fn identifiers_are_checked() {
        assert!(check_identifier("order_items").is_ok());
        assert!(check_identifier("_x1").is_ok());
        assert!(check_identifier("1abc").is_err());
        assert!(check_identifier("drop table; --").is_err());
        assert!(check_identifier(&"a".repeat(64)).is_err());
    }

    #[test]
    fn unknown_on_delete_action() {
        let mut t = table("a", &["a"]);
        t.columns[1].references.as_mut().unwrap().on_delete = Some("EXPLODE".into());
        assert!(matches!(validate(&catalog(vec![t])), Err(ConfigError::Load(_))));
    }
}
