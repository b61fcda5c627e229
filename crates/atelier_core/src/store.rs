/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - Atelier Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Relational store adapter.
//!
//! Two engines sit behind [`StoreAdapter`]: SQLite (a fresh file connection
//! per unit of work) and PostgreSQL (a deadpool pool). Every dialect
//! difference lives in [`Dialect`]; stores build their SQL from it and never
//! ask which engine they are talking to.

use bytes::BytesMut;
use deadpool::managed::QueueMode;
use deadpool_postgres::{ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime, Timeouts};
use rusqlite::types::{ToSqlOutput, ValueRef};
use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio_postgres::types::{to_sql_checked, IsNull, ToSql as PgToSql, Type};
use tokio_postgres::NoTls;
use tracing::{debug, warn};

use crate::error::StoreError;

/// Backend-neutral parameter and cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Bool(bool),
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

impl rusqlite::ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            SqlValue::Integer(v) => ToSqlOutput::from(*v),
            SqlValue::Real(v) => ToSqlOutput::from(*v),
            SqlValue::Text(v) => ToSqlOutput::from(v.as_str()),
            SqlValue::Bool(v) => ToSqlOutput::from(*v),
        })
    }
}

impl PgToSql for SqlValue {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            SqlValue::Null => Ok(IsNull::Yes),
            SqlValue::Integer(v) => match *ty {
                Type::INT2 => i16::try_from(*v)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*v)?.to_sql(ty, out),
                Type::BOOL => (*v != 0).to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            SqlValue::Real(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            SqlValue::Text(v) => v.to_sql(ty, out),
            SqlValue::Bool(v) => v.to_sql(ty, out),
        }
    }

    // The column type decides the wire encoding above.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// One result row as a column-name mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: BTreeMap<String, SqlValue>,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns.get(column)
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        match self.columns.get(column) {
            Some(SqlValue::Text(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn integer(&self, column: &str) -> Option<i64> {
        match self.columns.get(column) {
            Some(SqlValue::Integer(v)) => Some(*v),
            Some(SqlValue::Bool(v)) => Some(i64::from(*v)),
            _ => None,
        }
    }

    /// SQLite has no boolean storage class; non-zero integers read as true.
    pub fn boolean(&self, column: &str) -> Option<bool> {
        match self.columns.get(column) {
            Some(SqlValue::Bool(v)) => Some(*v),
            Some(SqlValue::Integer(v)) => Some(*v != 0),
            _ => None,
        }
    }

    fn insert(&mut self, column: String, value: SqlValue) {
        self.columns.insert(column, value);
    }
}

impl FromIterator<(String, SqlValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, SqlValue)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

/// A single acquired connection. Writes open a transaction lazily; dropping a
/// connection with an open transaction rolls it back.
pub trait StoreConnection: Send {
    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, StoreError>;

    fn query_opt(&mut self, sql: &str, params: &[SqlValue]) -> Result<Option<Row>, StoreError> {
        Ok(self.query(sql, params)?.into_iter().next())
    }

    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, StoreError>;

    fn execute_batch(&mut self, sql: &str) -> Result<(), StoreError>;

    fn table_exists(&mut self, table: &str) -> Result<bool, StoreError>;

    fn commit(&mut self) -> Result<(), StoreError>;

    fn rollback(&mut self) -> Result<(), StoreError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

impl Dialect {
    /// Positional parameter marker, 1-based.
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Sqlite => format!("?{index}"),
            Dialect::Postgres => format!("${index}"),
        }
    }

    /// `count` comma-separated markers starting at `start`.
    pub fn placeholders(self, start: usize, count: usize) -> String {
        (start..start + count)
            .map(|i| self.placeholder(i))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn autoincrement_primary_key(self) -> &'static str {
        match self {
            Dialect::Sqlite => "INTEGER PRIMARY KEY AUTOINCREMENT",
            Dialect::Postgres => "SERIAL PRIMARY KEY",
        }
    }

    pub fn bool_literal(self, value: bool) -> &'static str {
        match (self, value) {
            (Dialect::Sqlite, true) => "1",
            (Dialect::Sqlite, false) => "0",
            (Dialect::Postgres, true) => "TRUE",
            (Dialect::Postgres, false) => "FALSE",
        }
    }

    /// Equality operator that also matches NULL to NULL.
    pub fn null_safe_eq(self) -> &'static str {
        match self {
            Dialect::Sqlite => "IS",
            Dialect::Postgres => "IS NOT DISTINCT FROM",
        }
    }

    /// Insert-or-replace keyed on `conflict_columns`.
    pub fn upsert_sql(
        self,
        table: &str,
        conflict_columns: &[&str],
        columns: &[&str],
    ) -> Result<String, StoreError> {
        if columns.is_empty() {
            return Err(StoreError::query(format!("upsert into {table}: no columns")));
        }
        for ident in std::iter::once(&table).chain(conflict_columns).chain(columns) {
            if !is_identifier(ident) {
                return Err(StoreError::query(format!("invalid identifier: {ident:?}")));
            }
        }
        if let Some(missing) = conflict_columns.iter().find(|c| !columns.contains(c)) {
            return Err(StoreError::query(format!(
                "upsert into {table}: conflict column {missing} has no value"
            )));
        }
        let column_list = columns.join(", ");
        let values = self.placeholders(1, columns.len());
        Ok(match self {
            Dialect::Sqlite => format!("INSERT OR REPLACE INTO {table} ({column_list}) VALUES ({values})"),
            Dialect::Postgres => {
                let updates = columns
                    .iter()
                    .filter(|c| !conflict_columns.contains(c))
                    .map(|c| format!("{c} = EXCLUDED.{c}"))
                    .collect::<Vec<_>>();
                let action = if updates.is_empty() {
                    "DO NOTHING".to_string()
                } else {
                    format!("DO UPDATE SET {}", updates.join(", "))
                };
                format!(
                    "INSERT INTO {table} ({column_list}) VALUES ({values}) ON CONFLICT ({}) {action}",
                    conflict_columns.join(", ")
                )
            }
        })
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// The one seam between the engine and a concrete database.
pub trait StoreAdapter: Send + Sync {
    /// Every caller releases what it acquires; see [`with_unit_of_work`].
    fn acquire(&self) -> Result<Box<dyn StoreConnection>, StoreError>;

    fn dialect(&self) -> Dialect;

    fn placeholder(&self, index: usize) -> String {
        self.dialect().placeholder(index)
    }

    /// True for PostgreSQL, the production engine.
    fn is_primary_backend(&self) -> bool {
        self.dialect() == Dialect::Postgres
    }

    fn upsert(
        &self,
        conn: &mut dyn StoreConnection,
        table: &str,
        conflict_columns: &[&str],
        values: &[(&str, SqlValue)],
    ) -> Result<u64, StoreError> {
        let columns = values.iter().map(|(c, _)| *c).collect::<Vec<_>>();
        let sql = self.dialect().upsert_sql(table, conflict_columns, &columns)?;
        let params = values.iter().map(|(_, v)| v.clone()).collect::<Vec<_>>();
        conn.execute(&sql, &params)
    }
}

/// Acquire, run `f`, then commit on success or roll back on error. The
/// connection is released on every path, including unwinding.
pub fn with_unit_of_work<T, E, F>(adapter: &dyn StoreAdapter, f: F) -> Result<T, E>
where
    F: FnOnce(&mut dyn StoreConnection) -> Result<T, E>,
    E: From<StoreError>,
{
    let mut conn = adapter.acquire()?;
    match f(&mut *conn) {
        Ok(value) => {
            conn.commit()?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = conn.rollback() {
                warn!("rollback failed: {rollback_err}");
            }
            Err(err)
        }
    }
}

#[derive(Clone, Debug)]
pub struct SqliteAdapter {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: Duration::from_millis(2000),
        }
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    fn open(&self) -> rusqlite::Result<rusqlite::Connection> {
        let conn = rusqlite::Connection::open(&self.path)?;
        let _ = conn.pragma_update(None, "journal_mode", "WAL");
        let _ = conn.pragma_update(None, "temp_store", "MEMORY");
        conn.busy_timeout(self.busy_timeout)?;
        Ok(conn)
    }
}

impl StoreAdapter for SqliteAdapter {
    fn acquire(&self) -> Result<Box<dyn StoreConnection>, StoreError> {
        let conn = self.open().map_err(|e| {
            StoreError::unavailable(format!("open sqlite {}: {e}", self.path.display()))
        })?;
        Ok(Box::new(SqliteConnection { conn, in_tx: false }))
    }

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }
}

pub struct SqliteConnection {
    conn: rusqlite::Connection,
    in_tx: bool,
}

impl SqliteConnection {
    fn begin_if_needed(&mut self) -> Result<(), StoreError> {
        if !self.in_tx {
            self.conn.execute_batch("BEGIN").map_err(StoreError::query)?;
            self.in_tx = true;
        }
        Ok(())
    }
}

impl StoreConnection for SqliteConnection {
    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, StoreError> {
        let mut stmt = self.conn.prepare(sql).map_err(StoreError::query)?;
        let names = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        let mut rows = stmt
            .query(rusqlite::params_from_iter(params.iter()))
            .map_err(StoreError::query)?;
        let mut out = Vec::new();
        while let Some(r) = rows.next().map_err(StoreError::query)? {
            let mut row = Row::default();
            for (idx, name) in names.iter().enumerate() {
                let value = match r.get_ref(idx).map_err(StoreError::query)? {
                    ValueRef::Null => SqlValue::Null,
                    ValueRef::Integer(v) => SqlValue::Integer(v),
                    ValueRef::Real(v) => SqlValue::Real(v),
                    ValueRef::Text(v) | ValueRef::Blob(v) => {
                        SqlValue::Text(String::from_utf8_lossy(v).into_owned())
                    }
                };
                row.insert(name.clone(), value);
            }
            out.push(row);
        }
        Ok(out)
    }

    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, StoreError> {
        self.begin_if_needed()?;
        let n = self
            .conn
            .execute(sql, rusqlite::params_from_iter(params.iter()))
            .map_err(StoreError::query)?;
        Ok(n as u64)
    }

    fn execute_batch(&mut self, sql: &str) -> Result<(), StoreError> {
        self.begin_if_needed()?;
        self.conn.execute_batch(sql).map_err(StoreError::query)
    }

    fn table_exists(&mut self, table: &str) -> Result<bool, StoreError> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [table],
                |r| r.get(0),
            )
            .map_err(StoreError::query)?;
        Ok(count > 0)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if self.in_tx {
            self.conn.execute_batch("COMMIT").map_err(StoreError::query)?;
            self.in_tx = false;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        if self.in_tx {
            self.in_tx = false;
            self.conn.execute_batch("ROLLBACK").map_err(StoreError::query)?;
        }
        Ok(())
    }
}

impl Drop for SqliteConnection {
    fn drop(&mut self) {
        if self.in_tx {
            let _ = self.conn.execute_batch("ROLLBACK");
        }
    }
}

#[derive(Clone, Debug)]
pub struct PgPoolOptions {
    pub url: String,
    pub max_size: usize,
    pub wait_ms: Option<u64>,
    pub create_timeout_ms: Option<u64>,
    pub queue_mode: QueueMode,
}

pub struct PostgresAdapter {
    pool: Pool,
}

impl PostgresAdapter {
    /// Builds the pool; connections are opened lazily on first acquire.
    pub fn connect(opts: &PgPoolOptions) -> Result<Self, StoreError> {
        let mut cfg = deadpool_postgres::Config::new();
        cfg.url = Some(opts.url.clone());
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        let mut pool_cfg = PoolConfig::new(opts.max_size);
        pool_cfg.queue_mode = opts.queue_mode;
        pool_cfg.timeouts = Timeouts {
            wait: opts.wait_ms.map(Duration::from_millis),
            create: opts.create_timeout_ms.map(Duration::from_millis),
            recycle: None,
        };
        cfg.pool = Some(pool_cfg);
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| StoreError::unavailable(format!("postgres pool: {e}")))?;
        debug!(max_size = opts.max_size, "postgres pool created");
        Ok(Self { pool })
    }
}

impl StoreAdapter for PostgresAdapter {
    fn acquire(&self) -> Result<Box<dyn StoreConnection>, StoreError> {
        let client = block_on(self.pool.get())?
            .map_err(|e| StoreError::unavailable(format!("postgres: {e}")))?;
        Ok(Box::new(PgConnection { client, in_tx: false }))
    }

    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }
}

pub struct PgConnection {
    client: deadpool_postgres::Object,
    in_tx: bool,
}

impl PgConnection {
    fn begin_if_needed(&mut self) -> Result<(), StoreError> {
        if !self.in_tx {
            block_on(self.client.batch_execute("BEGIN"))?.map_err(StoreError::query)?;
            self.in_tx = true;
        }
        Ok(())
    }
}

fn pg_params(params: &[SqlValue]) -> Vec<&(dyn PgToSql + Sync)> {
    params.iter().map(|p| p as &(dyn PgToSql + Sync)).collect()
}

fn pg_row(row: &tokio_postgres::Row) -> Result<Row, StoreError> {
    let mut out = Row::default();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = match *column.type_() {
            Type::BOOL => row
                .try_get::<_, Option<bool>>(idx)
                .map(|v| v.map(SqlValue::Bool)),
            Type::INT2 => row
                .try_get::<_, Option<i16>>(idx)
                .map(|v| v.map(|n| SqlValue::Integer(i64::from(n)))),
            Type::INT4 => row
                .try_get::<_, Option<i32>>(idx)
                .map(|v| v.map(|n| SqlValue::Integer(i64::from(n)))),
            Type::INT8 => row
                .try_get::<_, Option<i64>>(idx)
                .map(|v| v.map(SqlValue::Integer)),
            Type::FLOAT4 => row
                .try_get::<_, Option<f32>>(idx)
                .map(|v| v.map(|n| SqlValue::Real(f64::from(n)))),
            Type::FLOAT8 => row
                .try_get::<_, Option<f64>>(idx)
                .map(|v| v.map(SqlValue::Real)),
            _ => row
                .try_get::<_, Option<String>>(idx)
                .map(|v| v.map(SqlValue::Text)),
        }
        .map_err(|e| StoreError::query(format!("column {}: {e}", column.name())))?;
        out.insert(column.name().to_string(), value.unwrap_or(SqlValue::Null));
    }
    Ok(out)
}

impl StoreConnection for PgConnection {
    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, StoreError> {
        let refs = pg_params(params);
        let rows = block_on(self.client.query(sql, &refs))?.map_err(StoreError::query)?;
        rows.iter().map(pg_row).collect()
    }

    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, StoreError> {
        self.begin_if_needed()?;
        let refs = pg_params(params);
        block_on(self.client.execute(sql, &refs))?.map_err(StoreError::query)
    }

    fn execute_batch(&mut self, sql: &str) -> Result<(), StoreError> {
        self.begin_if_needed()?;
        block_on(self.client.batch_execute(sql))?.map_err(StoreError::query)
    }

    fn table_exists(&mut self, table: &str) -> Result<bool, StoreError> {
        let row = self.query_opt(
            "SELECT COUNT(*) AS n FROM information_schema.tables WHERE table_schema = current_schema() AND table_name::text = $1",
            &[SqlValue::from(table)],
        )?;
        Ok(row.and_then(|r| r.integer("n")).unwrap_or(0) > 0)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if self.in_tx {
            block_on(self.client.batch_execute("COMMIT"))?.map_err(StoreError::query)?;
            self.in_tx = false;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        if self.in_tx {
            self.in_tx = false;
            block_on(self.client.batch_execute("ROLLBACK"))?.map_err(StoreError::query)?;
        }
        Ok(())
    }
}

impl Drop for PgConnection {
    fn drop(&mut self) {
        // A pooled client must not go back with a transaction still open.
        if self.in_tx {
            if let Ok(Err(e)) = block_on(self.client.batch_execute("ROLLBACK")) {
                warn!("postgres rollback on release failed: {e}");
            }
        }
    }
}

/// Drives a pool/client future to completion from synchronous code. Inside a
/// tokio context this needs the multi-threaded runtime.
fn block_on<F: Future>(fut: F) -> Result<F::Output, StoreError> {
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        Ok(tokio::task::block_in_place(|| handle.block_on(fut)))
    } else {
        let rt = tokio::runtime::Runtime::new().map_err(StoreError::unavailable)?;
        Ok(rt.block_on(fut))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Adapter whose connections can never be acquired.
    pub(crate) struct UnavailableAdapter;

    impl StoreAdapter for UnavailableAdapter {
        fn acquire(&self) -> Result<Box<dyn StoreConnection>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        fn dialect(&self) -> Dialect {
            Dialect::Postgres
        }
    }

    fn temp_adapter() -> (tempfile::TempDir, SqliteAdapter) {
        let dir = tempfile::tempdir().unwrap();
        let adapter = SqliteAdapter::new(dir.path().join("store.db"));
        (dir, adapter)
    }

    #[test]
    fn null_safe_comparison_per_dialect() {
        assert_eq!(Dialect::Sqlite.null_safe_eq(), "IS");
        assert_eq!(Dialect::Postgres.null_safe_eq(), "IS NOT DISTINCT FROM");
    }

    #[test]
    fn placeholders_per_dialect() {
        assert_eq!(Dialect::Sqlite.placeholder(1), "?1");
        assert_eq!(Dialect::Postgres.placeholder(3), "$3");
        assert_eq!(Dialect::Postgres.placeholders(2, 3), "$2, $3, $4");
        assert_eq!(Dialect::Sqlite.placeholders(1, 0), "");
    }

    #[test]
    fn dialect_literals() {
        assert_eq!(Dialect::Sqlite.bool_literal(true), "1");
        assert_eq!(Dialect::Postgres.bool_literal(false), "FALSE");
        assert_eq!(Dialect::Postgres.autoincrement_primary_key(), "SERIAL PRIMARY KEY");
        assert!(Dialect::Sqlite.autoincrement_primary_key().contains("AUTOINCREMENT"));
    }

    #[test]
    fn upsert_sql_per_dialect() {
        let cols = ["plugin_id", "user_id", "key", "value"];
        let conflict = ["plugin_id", "user_id", "key"];
        assert_eq!(
            Dialect::Sqlite.upsert_sql("plugin_data", &conflict, &cols).unwrap(),
            "INSERT OR REPLACE INTO plugin_data (plugin_id, user_id, key, value) VALUES (?1, ?2, ?3, ?4)"
        );
        assert_eq!(
            Dialect::Postgres.upsert_sql("plugin_data", &conflict, &cols).unwrap(),
            "INSERT INTO plugin_data (plugin_id, user_id, key, value) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (plugin_id, user_id, key) DO UPDATE SET value = EXCLUDED.value"
        );
        assert_eq!(
            Dialect::Postgres.upsert_sql("tags", &["name"], &["name"]).unwrap(),
            "INSERT INTO tags (name) VALUES ($1) ON CONFLICT (name) DO NOTHING"
        );
    }

    #[test]
    fn upsert_sql_rejects_bad_identifiers() {
        assert!(Dialect::Sqlite.upsert_sql("settings; DROP", &["key"], &["key"]).is_err());
        assert!(Dialect::Sqlite.upsert_sql("settings", &["id"], &["key"]).is_err());
        assert!(Dialect::Sqlite.upsert_sql("settings", &[], &[]).is_err());
    }

    #[test]
    fn sqlite_rows_become_mappings() {
        let (_dir, adapter) = temp_adapter();
        let mut conn = adapter.acquire().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER, name TEXT, score REAL, flag BOOLEAN)")
            .unwrap();
        conn.execute(
            "INSERT INTO t (id, name, score, flag) VALUES (?1, ?2, ?3, ?4)",
            &[SqlValue::Integer(7), "seven".into(), SqlValue::Real(1.5), true.into()],
        )
        .unwrap();
        conn.execute("INSERT INTO t (id) VALUES (?1)", &[8i64.into()]).unwrap();
        conn.commit().unwrap();

        let rows = conn.query("SELECT id, name, score, flag FROM t ORDER BY id", &[]).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].integer("id"), Some(7));
        assert_eq!(rows[0].text("name"), Some("seven"));
        assert_eq!(rows[0].get("score"), Some(&SqlValue::Real(1.5)));
        assert_eq!(rows[0].boolean("flag"), Some(true));
        assert_eq!(rows[1].get("name"), Some(&SqlValue::Null));
        assert_eq!(rows[1].text("name"), None);
    }

    #[test]
    fn unit_of_work_commits_on_success() {
        let (_dir, adapter) = temp_adapter();
        with_unit_of_work(&adapter, |conn| {
            conn.execute_batch("CREATE TABLE t (k TEXT PRIMARY KEY, v TEXT)")?;
            adapter.upsert(conn, "t", &["k"], &[("k", "a".into()), ("v", "1".into())])?;
            adapter.upsert(conn, "t", &["k"], &[("k", "a".into()), ("v", "2".into())])
        })
        .unwrap();

        let mut conn = adapter.acquire().unwrap();
        let rows = conn.query("SELECT v FROM t", &[]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text("v"), Some("2"));
    }

    #[test]
    fn unit_of_work_rolls_back_on_error() {
        let (_dir, adapter) = temp_adapter();
        with_unit_of_work(&adapter, |conn| conn.execute_batch("CREATE TABLE t (v TEXT)")).unwrap();

        let res: Result<(), StoreError> = with_unit_of_work(&adapter, |conn| {
            conn.execute("INSERT INTO t (v) VALUES (?1)", &["x".into()])?;
            conn.execute("INSERT INTO missing_table (v) VALUES (?1)", &["y".into()])?;
            Ok(())
        });
        assert!(matches!(res, Err(StoreError::QueryFailed(_))));

        let mut conn = adapter.acquire().unwrap();
        assert!(conn.query("SELECT v FROM t", &[]).unwrap().is_empty());
    }

    #[test]
    fn dropped_connection_discards_open_transaction() {
        let (_dir, adapter) = temp_adapter();
        with_unit_of_work(&adapter, |conn| conn.execute_batch("CREATE TABLE t (v TEXT)")).unwrap();
        {
            let mut conn = adapter.acquire().unwrap();
            conn.execute("INSERT INTO t (v) VALUES (?1)", &["x".into()]).unwrap();
        }
        let mut conn = adapter.acquire().unwrap();
        assert!(conn.query("SELECT v FROM t", &[]).unwrap().is_empty());
    }

    #[test]
    fn table_exists_reports_schema() {
        let (_dir, adapter) = temp_adapter();
        let mut conn = adapter.acquire().unwrap();
        assert!(!conn.table_exists("settings").unwrap());
        conn.execute_batch("CREATE TABLE settings (key TEXT PRIMARY KEY, value TEXT)").unwrap();
        conn.commit().unwrap();
        assert!(conn.table_exists("settings").unwrap());
    }

    #[test]
    fn unavailable_store_fails_acquire() {
        let res: Result<(), StoreError> = with_unit_of_work(&UnavailableAdapter, |_| Ok(()));
        assert!(matches!(res, Err(StoreError::Unavailable(_))));
    }

    #[test]
    fn adapter_identity() {
        let (_dir, adapter) = temp_adapter();
        assert!(!adapter.is_primary_backend());
        assert_eq!(adapter.placeholder(2), "?2");
        assert!(UnavailableAdapter.is_primary_backend());
    }
}
