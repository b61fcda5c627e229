/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - Atelier Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

pub mod config;
pub mod error;
pub mod plugin_data;
pub mod plugins;
pub mod profiles;
pub mod schema;
pub mod settings;
pub mod site_context;
pub mod store;

pub use config::{build_adapter, DbDriver, StoreConfig};
pub use error::{PluginDataError, StoreError};
pub use plugin_data::PluginDataStore;
pub use plugins::{NewPlugin, PluginRegistry};
pub use profiles::{ArtistProfile, ProfileStore};
pub use settings::{Settings, SettingsStore};
pub use site_context::{SessionView, SiteContextResolver};
pub use store::{with_unit_of_work, StoreAdapter, StoreConnection};
