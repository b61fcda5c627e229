/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - Atelier Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use anyhow::{Context, Result};
use deadpool::managed::QueueMode;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::schema::SeedValues;
use crate::store::{PgPoolOptions, PostgresAdapter, SqliteAdapter, StoreAdapter};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbDriver {
    Sqlite,
    Postgres,
}

#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub driver: DbDriver,
    pub sqlite_path: PathBuf,
    pub db_url: Option<String>,
    pub busy_timeout_ms: u64,
    pub pg_pool_max_size: usize,
    pub pg_pool_wait_ms: Option<u64>,
    pub pg_pool_create_timeout_ms: Option<u64>,
    pub pg_pool_queue_mode: QueueMode,
    pub seed: SeedValues,
}

impl StoreConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let db_url = non_empty("DATABASE_URL");
        let driver = non_empty("ATELIER_DB_DRIVER")
            .map(|v| v.to_ascii_lowercase())
            .and_then(|v| match v.as_str() {
                "postgres" | "postgresql" | "pg" => Some(DbDriver::Postgres),
                "sqlite" | "sqlite3" => Some(DbDriver::Sqlite),
                _ => None,
            })
            .unwrap_or(if db_url.is_some() {
                DbDriver::Postgres
            } else {
                DbDriver::Sqlite
            });
        let sqlite_path = non_empty("ATELIER_DB_PATH").unwrap_or_else(|| "atelier.db".to_string());
        let busy_timeout_ms = non_empty("ATELIER_DB_BUSY_TIMEOUT_MS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(2000)
            .min(60_000);
        let pg_pool_max_size = non_empty("ATELIER_PG_POOL_MAX_SIZE")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(16)
            .clamp(1, 256);
        let pg_pool_wait_ms = non_empty("ATELIER_PG_POOL_WAIT_MS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0);
        let pg_pool_create_timeout_ms = non_empty("ATELIER_PG_POOL_CREATE_TIMEOUT_MS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0);
        let pg_pool_queue_mode = non_empty("ATELIER_PG_POOL_QUEUE_MODE")
            .map(|v| v.to_ascii_lowercase())
            .and_then(|v| match v.as_str() {
                "lifo" => Some(QueueMode::Lifo),
                "fifo" => Some(QueueMode::Fifo),
                _ => None,
            })
            .unwrap_or(QueueMode::Fifo);
        let seed = SeedValues {
            paypal_email: lookup("PAYPAL_EMAIL").unwrap_or_default(),
            paypal_hosted_button_id: lookup("PAYPAL_HOSTED_BUTTON_ID").unwrap_or_default(),
            telegram_bot_token: lookup("TELEGRAM_BOT_TOKEN").unwrap_or_default(),
            telegram_chat_id: lookup("TELEGRAM_CHAT_ID").unwrap_or_default(),
        };
        Self {
            driver,
            sqlite_path: PathBuf::from(sqlite_path),
            db_url,
            busy_timeout_ms,
            pg_pool_max_size,
            pg_pool_wait_ms,
            pg_pool_create_timeout_ms,
            pg_pool_queue_mode,
            seed,
        }
    }
}

/// Selects the backend once; everything downstream only sees the trait.
pub fn build_adapter(cfg: &StoreConfig) -> Result<Arc<dyn StoreAdapter>> {
    match cfg.driver {
        DbDriver::Sqlite => {
            info!("store backend: sqlite ({})", cfg.sqlite_path.display());
            let adapter = SqliteAdapter::new(cfg.sqlite_path.clone())
                .with_busy_timeout(Duration::from_millis(cfg.busy_timeout_ms));
            Ok(Arc::new(adapter))
        }
        DbDriver::Postgres => {
            let url = cfg
                .db_url
                .clone()
                .context("DATABASE_URL is required for postgres")?;
            info!("store backend: postgres");
            let adapter = PostgresAdapter::connect(&PgPoolOptions {
                url,
                max_size: cfg.pg_pool_max_size,
                wait_ms: cfg.pg_pool_wait_ms,
                create_timeout_ms: cfg.pg_pool_create_timeout_ms,
                queue_mode: cfg.pg_pool_queue_mode,
            })?;
            Ok(Arc::new(adapter))
        }
    }
}
