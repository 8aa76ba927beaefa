//! DDL rendering for catalog tables. Every statement is idempotent (IF NOT EXISTS).

use crate::schema::types::TableDef;

pub fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub fn create_schema_sql(schema: &str) -> String {
    format!("CREATE SCHEMA IF NOT EXISTS {}", quote(schema))
}

pub fn create_table_sql(schema: &str, t: &TableDef) -> String {
    let full_name = format!("{}.{}", quote(schema), quote(&t.name));

    let mut defs: Vec<String> = Vec::new();
    for c in &t.columns {
        let mut def = format!("{} {}", quote(&c.name), c.type_);
        if !c.nullable {
            def.push_str(" NOT NULL");
        }
        if let Some(ref d) = c.default {
            def.push_str(" DEFAULT ");
            def.push_str(d);
        }
        if let Some(ref fk) = c.references {
            def.push_str(&format!(
                " REFERENCES {}.{} ({})",
                quote(schema),
                quote(&fk.table),
                quote(&fk.column)
            ));
            if let Some(ref action) = fk.on_delete {
                def.push_str(&format!(" ON DELETE {}", action.to_uppercase()));
            }
        }
        defs.push(def);
    }

    let pk: Vec<String> = t.primary_key.columns().into_iter().map(quote).collect();
    defs.push(format!("PRIMARY KEY ({})", pk.join(", ")));

    for u in &t.unique {
        let cols: Vec<String> = u.iter().map(|s| quote(s)).collect();
        defs.push(format!("UNIQUE ({})", cols.join(", ")));
    }
    for ch in &t.check {
        defs.push(format!("CONSTRAINT {} CHECK ({})", quote(&ch.name), ch.expression));
    }

    format!("CREATE TABLE IF NOT EXISTS {} (\n  {}\n)", full_name, defs.join(",\n  "))
}

pub fn comment_sql(schema: &str, t: &TableDef) -> Option<String> {
    t.comment.as_ref().map(|c| {
        format!(
            "COMMENT ON TABLE {}.{} IS '{}'",
            quote(schema),
            quote(&t.name),
            c.replace('\'', "''")
        )
    })
}
