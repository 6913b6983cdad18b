use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::node::{ColumnNode, DatabaseId, SchemaNode, TableNode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaInfo {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub max_length: Option<u64>,
}

impl From<SchemaInfo> for SchemaNode {
    fn from(info: SchemaInfo) -> Self {
        SchemaNode::new(info.name)
    }
}

impl From<TableInfo> for TableNode {
    fn from(info: TableInfo) -> Self {
        TableNode::new(info.name)
    }
}

impl From<ColumnInfo> for ColumnNode {
    fn from(info: ColumnInfo) -> Self {
        ColumnNode {
            name: info.name,
            data_type: info.data_type,
            max_length: info.max_length,
        }
    }
}

pub type ColumnsByTable = HashMap<String, Vec<ColumnInfo>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("no connection configured for `{0}`")]
    UnknownDatabase(DatabaseId),
    #[error("{0}")]
    Backend(String),
}

impl LoadError {
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

/// Source of tree metadata. Implementations run off the UI loop and only
/// return owned values; they never see tree nodes.
#[async_trait]
pub trait MetadataLoader: Send + Sync {
    async fn load_schemas(&self, database: &DatabaseId) -> Result<Vec<SchemaInfo>, LoadError>;

    async fn load_tables(
        &self,
        database: &DatabaseId,
        schema: &str,
    ) -> Result<Vec<TableInfo>, LoadError>;

    async fn load_columns(
        &self,
        database: &DatabaseId,
        schema: &str,
    ) -> Result<ColumnsByTable, LoadError>;
}

/// A pending child load, addressed by identifiers rather than indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LoadRequest {
    Schemas {
        database: DatabaseId,
    },
    Tables {
        database: DatabaseId,
        schema: String,
    },
    /// Columns arrive for the whole schema; `table` is the node to expand.
    Columns {
        database: DatabaseId,
        schema: String,
        table: String,
    },
}

impl LoadRequest {
    #[must_use]
    pub fn database(&self) -> &DatabaseId {
        match self {
            Self::Schemas { database }
            | Self::Tables { database, .. }
            | Self::Columns { database, .. } => database,
        }
    }

    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Schemas { database } => format!("schemas of {database}"),
            Self::Tables { database, schema } => format!("tables of {database}.{schema}"),
            Self::Columns {
                database,
                schema,
                table,
            } => format!("columns of {database}.{schema}.{table}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadedChildren {
    Schemas(Vec<SchemaInfo>),
    Tables(Vec<TableInfo>),
    Columns(ColumnsByTable),
}

/// Result message delivered back to the update loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadCompletion {
    pub request: LoadRequest,
    pub result: Result<LoadedChildren, LoadError>,
}

pub async fn run_load<L: MetadataLoader + ?Sized>(
    loader: &L,
    request: LoadRequest,
) -> LoadCompletion {
    log::debug!("loading {}", request.describe());
    let result = match &request {
        LoadRequest::Schemas { database } => loader
            .load_schemas(database)
            .await
            .map(LoadedChildren::Schemas),
        LoadRequest::Tables { database, schema } => loader
            .load_tables(database, schema)
            .await
            .map(LoadedChildren::Tables),
        LoadRequest::Columns {
            database, schema, ..
        } => loader
            .load_columns(database, schema)
            .await
            .map(LoadedChildren::Columns),
    };
    LoadCompletion { request, result }
}
