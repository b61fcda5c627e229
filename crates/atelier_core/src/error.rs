/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - Atelier Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use thiserror::Error;

/// Failures raised by the relational store adapter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A connection could not be acquired.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A statement failed to prepare or execute.
    #[error("query failed: {0}")]
    QueryFailed(String),
}

impl StoreError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        StoreError::Unavailable(err.to_string())
    }

    pub fn query(err: impl std::fmt::Display) -> Self {
        StoreError::QueryFailed(err.to_string())
    }
}

/// Failures surfaced to the plugin data write path.
#[derive(Debug, Error)]
pub enum PluginDataError {
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The upsert failed and its transaction was rolled back.
    #[error("persist failed: {source}")]
    PersistFailed {
        #[source]
        source: StoreError,
    },
}
