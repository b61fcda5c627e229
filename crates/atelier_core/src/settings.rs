/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - Atelier Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::StoreError;
use crate::store::{SqlValue, StoreAdapter, StoreConnection};

/// A full read of the settings table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    values: HashMap<String, String>,
}

impl Settings {
    /// Falls back only when the key is absent; a stored empty string wins.
    pub fn get<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.values.get(key).map(String::as_str).unwrap_or(default)
    }

    pub fn get_opt(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Treats an empty value like a missing one.
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.get_opt(key).filter(|v| !v.is_empty())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Settings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

#[derive(Clone)]
pub struct SettingsStore {
    adapter: Arc<dyn StoreAdapter>,
}

impl SettingsStore {
    pub fn new(adapter: Arc<dyn StoreAdapter>) -> Self {
        Self { adapter }
    }

    /// Empty (never an error) before the schema exists. Rows with a NULL
    /// value are left out.
    pub fn get_all(&self, conn: &mut dyn StoreConnection) -> Result<Settings, StoreError> {
        if !conn.table_exists("settings")? {
            return Ok(Settings::default());
        }
        let rows = conn.query("SELECT key, value FROM settings", &[])?;
        Ok(rows
            .iter()
            .filter_map(|r| Some((r.text("key")?.to_string(), r.text("value")?.to_string())))
            .collect())
    }

    pub fn get(
        &self,
        conn: &mut dyn StoreConnection,
        key: &str,
        default: &str,
    ) -> Result<String, StoreError> {
        if !conn.table_exists("settings")? {
            return Ok(default.to_string());
        }
        let sql = format!("SELECT value FROM settings WHERE key = {}", self.adapter.placeholder(1));
        let row = conn.query_opt(&sql, &[SqlValue::from(key)])?;
        Ok(row
            .as_ref()
            .and_then(|r| r.text("value"))
            .unwrap_or(default)
            .to_string())
    }

    /// Idempotent per key.
    pub fn set(
        &self,
        conn: &mut dyn StoreConnection,
        key: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        self.adapter.upsert(
            conn,
            "settings",
            &["key"],
            &[("key", SqlValue::from(key)), ("value", SqlValue::from(value))],
        )?;
        Ok(())
    }
}
