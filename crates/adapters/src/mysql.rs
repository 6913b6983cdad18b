use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use dbnav_core::loader::{
    ColumnInfo, ColumnsByTable, LoadError, MetadataLoader, SchemaInfo, TableInfo,
};
use dbnav_core::node::DatabaseId;
use dbnav_core::registry::{ConnectionProfile, PasswordSource, TlsMode};
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, OptsBuilder, Pool, SslOpts};

pub const PASSWORD_ENV: &str = "DBNAV_DB_PASSWORD";

const SCHEMAS_SQL: &str = "SELECT SCHEMA_NAME \
     FROM information_schema.SCHEMATA \
     ORDER BY SCHEMA_NAME";

const TABLES_SQL: &str = "SELECT TABLE_NAME \
     FROM information_schema.TABLES \
     WHERE TABLE_SCHEMA = ? \
     ORDER BY TABLE_NAME";

const COLUMNS_SQL: &str = "SELECT TABLE_NAME, COLUMN_NAME, DATA_TYPE, CHARACTER_MAXIMUM_LENGTH \
     FROM information_schema.COLUMNS \
     WHERE TABLE_SCHEMA = ? \
     ORDER BY TABLE_NAME, ORDINAL_POSITION";

/// Loads tree metadata from `information_schema`. Each configured profile
/// gets its own pool, created on first use.
#[derive(Debug, Default)]
pub struct MysqlMetadataLoader {
    profiles: HashMap<DatabaseId, ConnectionProfile>,
    pools: Mutex<HashMap<DatabaseId, Pool>>,
}

impl MysqlMetadataLoader {
    #[must_use]
    pub fn new(profiles: impl IntoIterator<Item = ConnectionProfile>) -> Self {
        Self {
            profiles: profiles
                .into_iter()
                .map(|profile| (profile.id(), profile))
                .collect(),
            pools: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn profile(&self, database: &DatabaseId) -> Option<&ConnectionProfile> {
        self.profiles.get(database)
    }

    pub async fn disconnect_all(&self) {
        let pools = match self.pools.lock() {
            Ok(mut pools) => pools.drain().collect::<Vec<_>>(),
            Err(_) => return,
        };
        for (database, pool) in pools {
            if let Err(error) = pool.disconnect().await {
                log::warn!("failed to close pool for {database}: {error}");
            }
        }
    }

    fn pool(&self, database: &DatabaseId) -> Result<Pool, LoadError> {
        let profile = self
            .profiles
            .get(database)
            .ok_or_else(|| LoadError::UnknownDatabase(database.clone()))?;
        let mut pools = self
            .pools
            .lock()
            .map_err(|_| LoadError::backend("connection pool lock poisoned"))?;
        let pool = pools.entry(database.clone()).or_insert_with(|| {
            log::info!(
                "opening pool for {database} at {}:{}",
                profile.host,
                profile.port
            );
            Pool::new(opts_from_profile(profile))
        });
        Ok(pool.clone())
    }

    async fn conn(&self, database: &DatabaseId) -> Result<Conn, LoadError> {
        self.pool(database)?
            .get_conn()
            .await
            .map_err(to_load_error)
    }
}

#[async_trait]
impl MetadataLoader for MysqlMetadataLoader {
    async fn load_schemas(&self, database: &DatabaseId) -> Result<Vec<SchemaInfo>, LoadError> {
        let mut conn = self.conn(database).await?;
        conn.query_map(SCHEMAS_SQL, |name: String| SchemaInfo { name })
            .await
            .map_err(to_load_error)
    }

    async fn load_tables(
        &self,
        database: &DatabaseId,
        schema: &str,
    ) -> Result<Vec<TableInfo>, LoadError> {
        let mut conn = self.conn(database).await?;
        conn.exec_map(TABLES_SQL, (schema,), |name: String| TableInfo { name })
            .await
            .map_err(to_load_error)
    }

    async fn load_columns(
        &self,
        database: &DatabaseId,
        schema: &str,
    ) -> Result<ColumnsByTable, LoadError> {
        let mut conn = self.conn(database).await?;
        let rows = conn
            .exec_map(
                COLUMNS_SQL,
                (schema,),
                |(table, name, data_type, max_length): (String, String, String, Option<u64>)| {
                    (
                        table,
                        ColumnInfo {
                            name,
                            data_type,
                            max_length,
                        },
                    )
                },
            )
            .await
            .map_err(to_load_error)?;
        Ok(group_columns(rows))
    }
}

/// Rows arrive sorted by table then ordinal position; grouping keeps that
/// order within each table.
fn group_columns(rows: Vec<(String, ColumnInfo)>) -> ColumnsByTable {
    let mut grouped = ColumnsByTable::new();
    for (table, column) in rows {
        grouped.entry(table).or_default().push(column);
    }
    grouped
}

fn opts_from_profile(profile: &ConnectionProfile) -> OptsBuilder {
    let mut builder = OptsBuilder::default()
        .ip_or_hostname(profile.host.clone())
        .tcp_port(profile.port)
        .user(Some(profile.user.clone()));

    if let Some(password) = resolve_password(profile) {
        builder = builder.pass(Some(password));
    }

    if let Some(ssl_opts) = ssl_opts_from_profile(profile) {
        builder = builder.ssl_opts(ssl_opts);
    }

    if matches!(profile.tls_mode, TlsMode::Disabled) {
        builder = builder.prefer_socket(false);
    }

    builder
}

fn resolve_password(profile: &ConnectionProfile) -> Option<String> {
    let env_password = std::env::var(PASSWORD_ENV)
        .ok()
        .filter(|pw| !pw.is_empty());

    match profile.password_source {
        PasswordSource::EnvVar => env_password,
        PasswordSource::Keyring => {
            if let Some(password) = load_keyring_password(profile) {
                return Some(password);
            }

            if let Some(password) = env_password {
                store_keyring_password(profile, &password);
                return Some(password);
            }

            None
        }
    }
}

fn ssl_opts_from_profile(profile: &ConnectionProfile) -> Option<SslOpts> {
    if !profile_requests_tls(profile) {
        return None;
    }

    let mut ssl_opts =
        SslOpts::default().with_danger_accept_invalid_certs(profile.tls_accept_invalid_certs);

    if let Some(ca_cert_path) = non_empty(profile.tls_ca_cert_path.as_deref()) {
        ssl_opts = ssl_opts.with_root_certs(vec![PathBuf::from(ca_cert_path).into()]);
    }

    Some(ssl_opts)
}

fn profile_requests_tls(profile: &ConnectionProfile) -> bool {
    match profile.tls_mode {
        TlsMode::Disabled => false,
        TlsMode::Prefer => {
            non_empty(profile.tls_ca_cert_path.as_deref()).is_some()
                || profile.tls_accept_invalid_certs
        }
        TlsMode::Require => true,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    })
}

#[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
fn load_keyring_password(profile: &ConnectionProfile) -> Option<String> {
    let entry = keyring_entry(profile)?;
    entry.get_password().ok().filter(|pw| !pw.is_empty())
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn load_keyring_password(_profile: &ConnectionProfile) -> Option<String> {
    None
}

#[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
fn store_keyring_password(profile: &ConnectionProfile, password: &str) {
    if password.is_empty() {
        return;
    }
    if let Some(entry) = keyring_entry(profile) {
        if let Err(error) = entry.set_password(password) {
            log::warn!("could not store password for {}: {error}", profile.name);
        }
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn store_keyring_password(_profile: &ConnectionProfile, _password: &str) {}

#[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
fn keyring_entry(profile: &ConnectionProfile) -> Option<keyring::Entry> {
    let (service, account) = keyring_key(profile);
    keyring::Entry::new(service, account).ok()
}

fn keyring_key(profile: &ConnectionProfile) -> (&str, &str) {
    let service = non_empty(profile.keyring_service.as_deref()).unwrap_or("dbnav");
    let account = non_empty(profile.keyring_account.as_deref()).unwrap_or(profile.name.as_str());
    (service, account)
}

fn to_load_error(error: mysql_async::Error) -> LoadError {
    LoadError::backend(error.to_string())
}
