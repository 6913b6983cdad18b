use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use async_trait::async_trait;
use dbnav_core::loader::{
    ColumnInfo, ColumnsByTable, LoadError, MetadataLoader, SchemaInfo, TableInfo,
};
use dbnav_core::node::DatabaseId;
use dbnav_core::registry::RegistryEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticTable {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticSchema {
    pub name: String,
    pub tables: Vec<StaticTable>,
}

impl StaticSchema {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
        }
    }

    /// Adds a table; `columns` are `(name, data_type, max_length)`.
    #[must_use]
    pub fn with_table(mut self, name: &str, columns: &[(&str, &str, Option<u64>)]) -> Self {
        self.tables.push(StaticTable {
            name: name.to_string(),
            columns: columns
                .iter()
                .map(|(column, data_type, max_length)| ColumnInfo {
                    name: (*column).to_string(),
                    data_type: (*data_type).to_string(),
                    max_length: *max_length,
                })
                .collect(),
        });
        self
    }
}

/// Serves metadata from memory. Used by demo mode and by tests that need a
/// loader without a server.
#[derive(Debug, Clone, Default)]
pub struct StaticMetadataLoader {
    databases: BTreeMap<DatabaseId, Vec<StaticSchema>>,
    unreachable: BTreeSet<DatabaseId>,
    latency: Option<Duration>,
}

impl StaticMetadataLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_database(mut self, id: impl Into<String>, schemas: Vec<StaticSchema>) -> Self {
        self.databases.insert(DatabaseId::new(id), schemas);
        self
    }

    /// Every load for `id` fails as if the server refused the connection.
    #[must_use]
    pub fn with_unreachable(mut self, id: impl Into<String>) -> Self {
        self.unreachable.insert(DatabaseId::new(id));
        self
    }

    /// Delays every load, so pending markers are visible.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    async fn schemas(&self, database: &DatabaseId) -> Result<&[StaticSchema], LoadError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.unreachable.contains(database) {
            return Err(LoadError::backend(format!(
                "can't connect to server for `{database}`"
            )));
        }
        self.databases
            .get(database)
            .map(Vec::as_slice)
            .ok_or_else(|| LoadError::UnknownDatabase(database.clone()))
    }

    async fn schema(&self, database: &DatabaseId, name: &str) -> Result<&StaticSchema, LoadError> {
        self.schemas(database)
            .await?
            .iter()
            .find(|schema| schema.name == name)
            .ok_or_else(|| LoadError::backend(format!("unknown schema `{name}` in `{database}`")))
    }
}

#[async_trait]
impl MetadataLoader for StaticMetadataLoader {
    async fn load_schemas(&self, database: &DatabaseId) -> Result<Vec<SchemaInfo>, LoadError> {
        Ok(self
            .schemas(database)
            .await?
            .iter()
            .map(|schema| SchemaInfo {
                name: schema.name.clone(),
            })
            .collect())
    }

    async fn load_tables(
        &self,
        database: &DatabaseId,
        schema: &str,
    ) -> Result<Vec<TableInfo>, LoadError> {
        Ok(self
            .schema(database, schema)
            .await?
            .tables
            .iter()
            .map(|table| TableInfo {
                name: table.name.clone(),
            })
            .collect())
    }

    async fn load_columns(
        &self,
        database: &DatabaseId,
        schema: &str,
    ) -> Result<ColumnsByTable, LoadError> {
        Ok(self
            .schema(database, schema)
            .await?
            .tables
            .iter()
            .map(|table| (table.name.clone(), table.columns.clone()))
            .collect())
    }
}

/// Registry entries matching [`demo_loader`].
#[must_use]
pub fn demo_entries() -> Vec<RegistryEntry> {
    vec![
        RegistryEntry::new("shop", "localhost:3306", "shop"),
        RegistryEntry::new("analytics", "warehouse.local:3306", "analytics"),
        RegistryEntry::new("legacy", "10.0.0.12:3306", "legacy"),
    ]
}

/// A small catalog with a slow server and one that never answers.
#[must_use]
pub fn demo_loader() -> StaticMetadataLoader {
    StaticMetadataLoader::new()
        .with_latency(Duration::from_millis(250))
        .with_database(
            "shop",
            vec![
                StaticSchema::new("public")
                    .with_table(
                        "users",
                        &[
                            ("id", "bigint", None),
                            ("email", "varchar", Some(255)),
                            ("display_name", "varchar", Some(64)),
                            ("created_at", "datetime", None),
                        ],
                    )
                    .with_table(
                        "orders",
                        &[
                            ("id", "bigint", None),
                            ("user_id", "bigint", None),
                            ("status", "enum", Some(9)),
                            ("total", "decimal", None),
                        ],
                    )
                    .with_table(
                        "order_items",
                        &[
                            ("order_id", "bigint", None),
                            ("sku", "char", Some(12)),
                            ("quantity", "int", None),
                        ],
                    ),
                StaticSchema::new("sales")
                    .with_table(
                        "coordinates",
                        &[("lat", "double", None), ("lng", "double", None)],
                    )
                    .with_table(
                        "invoices",
                        &[
                            ("id", "bigint", None),
                            ("order_id", "bigint", None),
                            ("issued_on", "date", None),
                        ],
                    ),
            ],
        )
        .with_database(
            "analytics",
            vec![
                StaticSchema::new("events").with_table(
                    "page_views",
                    &[
                        ("id", "bigint", None),
                        ("path", "varchar", Some(2048)),
                        ("viewed_at", "timestamp", None),
                    ],
                ),
                StaticSchema::new("rollups"),
            ],
        )
        .with_unreachable("legacy")
}
