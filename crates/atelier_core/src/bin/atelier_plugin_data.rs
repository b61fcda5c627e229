/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - Atelier Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use anyhow::Context;
use atelier_core::schema::initialize;
use atelier_core::{build_adapter, with_unit_of_work, PluginDataStore, StoreConfig};
use serde_json::Value;
use std::env;

const USAGE: &str = "usage: atelier_plugin_data set <plugin_id> <user_id> <key> <value>\n       atelier_plugin_data get <plugin_id> <user_id> <key>\n       atelier_plugin_data list <user_id> <prefix>";

/// `-` or `none` addresses cells no user owns.
fn parse_user(raw: Option<&String>) -> anyhow::Result<Option<i64>> {
    let raw = raw.context(USAGE)?.trim();
    if raw == "-" || raw.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    let id = raw.parse::<i64>().context("user_id must be an integer, '-' or 'none'")?;
    Ok(Some(id))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let args = env::args().skip(1).collect::<Vec<_>>();
    let cmd = args.first().map(String::as_str).unwrap_or_default();

    let cfg = StoreConfig::from_env();
    let adapter = build_adapter(&cfg)?;
    initialize(adapter.as_ref(), &cfg.seed).context("initialize schema")?;
    let store = PluginDataStore::new(adapter.clone());

    match cmd {
        "set" => {
            let (plugin_id, key, raw) = match (args.get(1), args.get(3), args.get(4)) {
                (Some(p), Some(k), Some(v)) => (p, k, v),
                _ => anyhow::bail!(USAGE),
            };
            let user_id = parse_user(args.get(2))?;
            let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.clone()));
            store.upsert_value(plugin_id, user_id, key, &value)?;
            println!("ok");
        }
        "get" => {
            let (plugin_id, key) = match (args.get(1), args.get(3)) {
                (Some(p), Some(k)) => (p, k),
                _ => anyhow::bail!(USAGE),
            };
            let user_id = parse_user(args.get(2))?;
            let value = with_unit_of_work(adapter.as_ref(), |conn| {
                store.get_value(conn, plugin_id, user_id, key)
            })?;
            match value {
                Some(v) => println!("{}", serde_json::to_string_pretty(&v)?),
                None => println!("(absent)"),
            }
        }
        "list" => {
            let user_id = parse_user(args.get(1))?;
            let prefix = args.get(2).map(String::as_str).unwrap_or_default();
            let cells = with_unit_of_work(adapter.as_ref(), |conn| {
                store.list_by_prefix(conn, user_id, prefix)
            })?;
            println!("{}", serde_json::to_string_pretty(&cells)?);
        }
        _ => anyhow::bail!(USAGE),
    }
    Ok(())
}
