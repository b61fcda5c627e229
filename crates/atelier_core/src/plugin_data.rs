/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - Atelier Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Per-(plugin, user, key) value cells.
//!
//! Values are stored as text. Objects and arrays are written as JSON and come
//! back as [`Decoded::Structured`]; text that does not parse as JSON comes back
//! unchanged as [`Decoded::Raw`]. Writes are last-writer-wins.

use atelier_protocol::Decoded;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{PluginDataError, StoreError};
use crate::store::{with_unit_of_work, SqlValue, StoreAdapter, StoreConnection};

/// Key prefix marking cells meant for anonymous visitors.
pub const PUBLIC_PREFIX: &str = "public_";

pub fn encode_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

pub fn decode_cell(value: Option<&SqlValue>) -> Decoded {
    match value {
        Some(SqlValue::Text(text)) => Decoded::decode(text),
        Some(SqlValue::Integer(n)) => Decoded::Structured(Value::from(*n)),
        Some(SqlValue::Real(n)) => Decoded::Structured(Value::from(*n)),
        Some(SqlValue::Bool(b)) => Decoded::Structured(Value::Bool(*b)),
        Some(SqlValue::Null) | None => Decoded::Structured(Value::Null),
    }
}

fn like_prefix(prefix: &str) -> String {
    let mut out = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

#[derive(Clone)]
pub struct PluginDataStore {
    adapter: Arc<dyn StoreAdapter>,
}

impl PluginDataStore {
    pub fn new(adapter: Arc<dyn StoreAdapter>) -> Self {
        Self { adapter }
    }

    /// Administrative write path: its own unit of work, rolled back and
    /// reported as `PersistFailed` on any store error. `user_id` is `None` for
    /// cells no user owns.
    pub fn upsert_value(
        &self,
        plugin_id: &str,
        user_id: Option<i64>,
        key: &str,
        value: &Value,
    ) -> Result<(), PluginDataError> {
        if plugin_id.trim().is_empty() {
            return Err(PluginDataError::MissingField("plugin_id"));
        }
        if key.trim().is_empty() {
            return Err(PluginDataError::MissingField("key"));
        }
        with_unit_of_work(self.adapter.as_ref(), |conn| {
            self.upsert_value_in(conn, plugin_id, user_id, key, value)
        })
        .map_err(|source| {
            warn!(plugin_id, ?user_id, key, "plugin data write failed: {source}");
            PluginDataError::PersistFailed { source }
        })
    }

    /// Same write on a caller-managed connection.
    pub fn upsert_value_in(
        &self,
        conn: &mut dyn StoreConnection,
        plugin_id: &str,
        user_id: Option<i64>,
        key: &str,
        value: &Value,
    ) -> Result<(), StoreError> {
        match user_id {
            Some(owner) => {
                self.adapter.upsert(
                    conn,
                    "plugin_data",
                    &["plugin_id", "user_id", "key"],
                    &[
                        ("plugin_id", SqlValue::from(plugin_id)),
                        ("user_id", SqlValue::from(owner)),
                        ("key", SqlValue::from(key)),
                        ("value", encode_value(value)),
                    ],
                )?;
            }
            // NULL never conflicts with NULL, so replace by hand.
            None => {
                let delete = format!(
                    "DELETE FROM plugin_data WHERE plugin_id = {} AND user_id IS NULL AND key = {}",
                    self.adapter.placeholder(1),
                    self.adapter.placeholder(2)
                );
                conn.execute(&delete, &[SqlValue::from(plugin_id), SqlValue::from(key)])?;
                let insert = format!(
                    "INSERT INTO plugin_data (plugin_id, user_id, key, value) VALUES ({}, NULL, {}, {})",
                    self.adapter.placeholder(1),
                    self.adapter.placeholder(2),
                    self.adapter.placeholder(3)
                );
                conn.execute(
                    &insert,
                    &[SqlValue::from(plugin_id), SqlValue::from(key), encode_value(value)],
                )?;
            }
        }
        debug!(plugin_id, ?user_id, key, "plugin data stored");
        Ok(())
    }

    /// `None` when the cell does not exist.
    pub fn get_value(
        &self,
        conn: &mut dyn StoreConnection,
        plugin_id: &str,
        user_id: Option<i64>,
        key: &str,
    ) -> Result<Option<Decoded>, StoreError> {
        let sql = format!(
            "SELECT value FROM plugin_data WHERE plugin_id = {} AND user_id {} {} AND key = {}",
            self.adapter.placeholder(1),
            self.adapter.dialect().null_safe_eq(),
            self.adapter.placeholder(2),
            self.adapter.placeholder(3)
        );
        let row = conn.query_opt(
            &sql,
            &[SqlValue::from(plugin_id), SqlValue::from(user_id), SqlValue::from(key)],
        )?;
        Ok(row.map(|r| decode_cell(r.get("value"))))
    }

    /// All cells of one owner whose key starts with `prefix`, keyed by the
    /// remainder. Each value decodes independently. Cells are read in
    /// (plugin_id, key) order, so on a key shared by two plugins the later
    /// plugin id wins.
    pub fn list_by_prefix(
        &self,
        conn: &mut dyn StoreConnection,
        user_id: Option<i64>,
        prefix: &str,
    ) -> Result<BTreeMap<String, Decoded>, StoreError> {
        let sql = format!(
            "SELECT key, value FROM plugin_data WHERE user_id {} {} AND key LIKE {} ESCAPE '\\' ORDER BY plugin_id, key",
            self.adapter.dialect().null_safe_eq(),
            self.adapter.placeholder(1),
            self.adapter.placeholder(2)
        );
        let rows = conn.query(&sql, &[SqlValue::from(user_id), SqlValue::from(like_prefix(prefix))])?;
        let mut out = BTreeMap::new();
        for row in &rows {
            // SQLite LIKE ignores ASCII case.
            let Some(stripped) = row.text("key").and_then(|k| k.strip_prefix(prefix)) else {
                continue;
            };
            out.insert(stripped.to_string(), decode_cell(row.get("value")));
        }
        Ok(out)
    }

    pub fn delete_for_user(
        &self,
        conn: &mut dyn StoreConnection,
        user_id: i64,
    ) -> Result<u64, StoreError> {
        let sql = format!(
            "DELETE FROM plugin_data WHERE user_id = {}",
            self.adapter.placeholder(1)
        );
        conn.execute(&sql, &[SqlValue::from(user_id)])
    }
}
