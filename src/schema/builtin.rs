//! Tables of the order backend: clients, their users, orders and order items.

use crate::schema::types::{Catalog, CheckDef, ColumnDef, PrimaryKeyDef, TableDef};

/// Catalog used when no `SCHEMA_CATALOG` file is configured.
pub fn default_catalog(schema: &str) -> Catalog {
    Catalog {
        schema: schema.into(),
        tables: vec![clientes(), users(), orders(), order_items()],
    }
}

fn table(name: &str, columns: Vec<ColumnDef>) -> TableDef {
    TableDef {
        name: name.into(),
        columns,
        primary_key: PrimaryKeyDef::Single("id".into()),
        unique: vec![],
        check: vec![],
        comment: None,
    }
}

fn clientes() -> TableDef {
    let mut t = table(
        "clientes",
        vec![
            ColumnDef::new("id", "SERIAL").not_null(),
            ColumnDef::new("nome", "TEXT").not_null(),
            ColumnDef::new("email", "TEXT").not_null(),
            ColumnDef::new("plano", "TEXT").not_null(),
            ColumnDef::new("ativo", "BOOLEAN").not_null().default_expr("TRUE"),
        ],
    );
    t.unique.push(vec!["email".into()]);
    t
}

fn users() -> TableDef {
    let mut t = table(
        "users",
        vec![
            ColumnDef::new("id", "SERIAL").not_null(),
            ColumnDef::new("nome", "TEXT").not_null(),
            ColumnDef::new("email", "TEXT").not_null(),
            ColumnDef::new("hashed_password", "TEXT").not_null(),
            ColumnDef::new("role", "TEXT").not_null().default_expr("'cliente'"),
            ColumnDef::new("cliente_id", "INTEGER").references("clientes", "id", Some("SET NULL")),
        ],
    );
    t.unique.push(vec!["email".into()]);
    t.check.push(CheckDef {
        name: "users_role_check".into(),
        expression: "role IN ('admin', 'cliente')".into(),
    });
    t
}

fn orders() -> TableDef {
    table(
        "orders",
        vec![
            ColumnDef::new("id", "SERIAL").not_null(),
            ColumnDef::new("cliente_id", "INTEGER")
                .not_null()
                .references("clientes", "id", Some("CASCADE")),
            ColumnDef::new("dados_do_pedido", "JSONB").not_null(),
            ColumnDef::new("created_at", "TIMESTAMPTZ").not_null().default_expr("NOW()"),
        ],
    )
}

fn order_items() -> TableDef {
    let mut t = table(
        "order_items",
        vec![
            ColumnDef::new("id", "SERIAL").not_null(),
            ColumnDef::new("order_id", "INTEGER")
                .not_null()
                .references("orders", "id", Some("CASCADE")),
            ColumnDef::new("nome", "TEXT").not_null(),
            ColumnDef::new("quantidade", "INTEGER").not_null().default_expr("1"),
            ColumnDef::new("preco", "NUMERIC(10, 2)").not_null(),
        ],
    );
    t.check.push(CheckDef {
        name: "order_items_quantidade_check".into(),
        expression: "quantidade > 0".into(),
    });
    t
}
