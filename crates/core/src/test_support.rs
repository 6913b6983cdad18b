use crate::loader::{ColumnInfo, ColumnsByTable, SchemaInfo, TableInfo};
use crate::node::DatabaseId;
use crate::path::TreePath;
use crate::registry::RegistryEntry;
use crate::tree::TreeState;

pub(crate) fn path(indices: &[usize]) -> TreePath {
    TreePath::from_slice(indices).expect("test paths are 1..=4 long")
}

pub(crate) fn schemas(names: &[&str]) -> Vec<SchemaInfo> {
    names
        .iter()
        .map(|name| SchemaInfo {
            name: (*name).to_string(),
        })
        .collect()
}

pub(crate) fn tables(names: &[&str]) -> Vec<TableInfo> {
    names
        .iter()
        .map(|name| TableInfo {
            name: (*name).to_string(),
        })
        .collect()
}

/// `(table, "col col ...")` pairs; every column is an `int`.
pub(crate) fn columns(listing: &[(&str, &str)]) -> ColumnsByTable {
    listing
        .iter()
        .map(|(table, names)| {
            let columns = names
                .split_whitespace()
                .map(|name| ColumnInfo {
                    name: name.to_string(),
                    data_type: "int".to_string(),
                    max_length: None,
                })
                .collect();
            ((*table).to_string(), columns)
        })
        .collect()
}

pub(crate) fn entries() -> Vec<RegistryEntry> {
    vec![
        RegistryEntry::new("db0", "127.0.0.1:3306", "app"),
        RegistryEntry::new("db1", "127.0.0.1:3307", "analytics"),
    ]
}

/// `db0` and `db1`, both unmaterialized.
pub(crate) fn two_databases() -> TreeState {
    TreeState::from_entries(&[
        RegistryEntry::new("db0", "localhost", "db0"),
        RegistryEntry::new("db1", "localhost", "db1"),
    ])
}

/// ```text
/// app                      [0]
///   public                 [0,0]
///     users                [0,0,0]
///       id                 [0,0,0,0]
///       email              [0,0,0,1]
///     orders (collapsed)   [0,0,1]
///   sales                  [0,1]
///     coordinates (unloaded)
///     invoices (unloaded)
/// analytics (unloaded)     [1]
/// ```
pub(crate) fn sample_tree() -> TreeState {
    let mut tree = TreeState::from_entries(&entries());
    let db0 = DatabaseId::new("db0");
    tree.set_schemas(&db0, schemas(&["public", "sales"]))
        .expect("db0 exists");
    tree.set_tables(&db0, "public", tables(&["users", "orders"]))
        .expect("public exists");
    tree.set_columns(
        &db0,
        "public",
        columns(&[("users", "id email"), ("orders", "id user_id total")]),
        Some("users"),
    )
    .expect("users exists");
    tree.set_tables(&db0, "sales", tables(&["coordinates", "invoices"]))
        .expect("sales exists");
    tree
}
