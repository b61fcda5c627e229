/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - Atelier Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use atelier_protocol::{PluginInfo, PluginScope};
use std::sync::Arc;

use crate::error::StoreError;
use crate::store::{Row, SqlValue, StoreAdapter, StoreConnection};

#[derive(Debug, Clone)]
pub struct NewPlugin {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
    pub code: String,
    pub is_active: bool,
    pub scope: PluginScope,
}

fn plugin_from_row(row: &Row) -> Option<PluginInfo> {
    Some(PluginInfo {
        id: row.text("id")?.to_string(),
        code: row.text("code").unwrap_or_default().to_string(),
        is_active: row.boolean("is_active").unwrap_or(false),
        scope: PluginScope::from_db(row.text("scope").unwrap_or_default()),
    })
}

#[derive(Clone)]
pub struct PluginRegistry {
    adapter: Arc<dyn StoreAdapter>,
}

impl PluginRegistry {
    pub fn new(adapter: Arc<dyn StoreAdapter>) -> Self {
        Self { adapter }
    }

    /// Active plugins of one scope, in storage order. Callers must not rely on
    /// that order for anything but display.
    pub fn list_active(
        &self,
        conn: &mut dyn StoreConnection,
        scope: PluginScope,
    ) -> Result<Vec<PluginInfo>, StoreError> {
        let sql = format!(
            "SELECT id, code, is_active, scope FROM plugins WHERE is_active = {} AND scope = {}",
            self.adapter.dialect().bool_literal(true),
            self.adapter.placeholder(1)
        );
        let rows = conn.query(&sql, &[SqlValue::from(scope.as_str())])?;
        Ok(rows.iter().filter_map(plugin_from_row).collect())
    }

    pub fn get(
        &self,
        conn: &mut dyn StoreConnection,
        id: &str,
    ) -> Result<Option<PluginInfo>, StoreError> {
        let sql = format!(
            "SELECT id, code, is_active, scope FROM plugins WHERE id = {}",
            self.adapter.placeholder(1)
        );
        Ok(conn
            .query_opt(&sql, &[SqlValue::from(id)])?
            .as_ref()
            .and_then(plugin_from_row))
    }

    /// Inserts or replaces a plugin by id.
    pub fn register(
        &self,
        conn: &mut dyn StoreConnection,
        plugin: &NewPlugin,
    ) -> Result<(), StoreError> {
        self.adapter.upsert(
            conn,
            "plugins",
            &["id"],
            &[
                ("id", SqlValue::from(plugin.id.as_str())),
                ("name", SqlValue::from(plugin.name.as_str())),
                ("description", SqlValue::from(plugin.description.clone())),
                ("version", SqlValue::from(plugin.version.clone())),
                ("code", SqlValue::from(plugin.code.as_str())),
                ("is_active", SqlValue::from(plugin.is_active)),
                ("scope", SqlValue::from(plugin.scope.as_str())),
            ],
        )?;
        Ok(())
    }

    pub fn set_active(
        &self,
        conn: &mut dyn StoreConnection,
        id: &str,
        active: bool,
    ) -> Result<bool, StoreError> {
        let sql = format!(
            "UPDATE plugins SET is_active = {} WHERE id = {}",
            self.adapter.placeholder(1),
            self.adapter.placeholder(2)
        );
        let n = conn.execute(&sql, &[SqlValue::from(active), SqlValue::from(id)])?;
        Ok(n > 0)
    }
}
