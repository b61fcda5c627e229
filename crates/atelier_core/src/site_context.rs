/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - Atelier Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Per-request site context resolution.
//!
//! Each call re-reads settings, the primary artist, plugins and the artist's
//! public plugin data on one connection, without a transaction spanning the
//! reads and without caching. Store failures turn into
//! [`RenderContext::degraded`] so a page render never fails on its context.

use atelier_protocol::{
    PluginScope, RenderContext, SiteContext, DEFAULT_SITE_MODE, DEGRADED_ARTIST_NAME,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::plugin_data::{PluginDataStore, PUBLIC_PREFIX};
use crate::plugins::PluginRegistry;
use crate::profiles::{ArtistProfile, ProfileStore};
use crate::settings::{Settings, SettingsStore};
use crate::store::{with_unit_of_work, StoreAdapter, StoreConnection};

pub const DEFAULT_STUDIO_NAME: &str = "Nome do Estúdio";
pub const DEFAULT_ARTIST_EMAIL: &str = "contato@email.com";
pub const DEFAULT_ARTIST_LOCATION: &str = "Localização Padrão";
pub const DEFAULT_ARTIST_PROCESS: &str = "Processo criativo padrão.";
pub const DEFAULT_ARTIST_INSPIRATIONS: &str = "Inspirações padrão.";
pub const DEFAULT_HOME_HEADLINE: &str = "Bem-vindo à Galeria";
pub const DEFAULT_HOME_SUBHEADLINE: &str = "Explore as obras.";
pub const DEFAULT_CURRENCY_CODE: &str = "BRL";

/// The slice of session state resolution reads. Never written here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionView {
    pub is_admin: bool,
    pub avatar_url: Option<String>,
}

impl SessionView {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn admin() -> Self {
        Self {
            is_admin: true,
            avatar_url: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SiteMode {
    Individual,
    Studio,
}

impl SiteMode {
    /// Anything other than `individual` is a studio.
    pub fn from_setting(value: &str) -> Self {
        if value == DEFAULT_SITE_MODE {
            SiteMode::Individual
        } else {
            SiteMode::Studio
        }
    }
}

/// Identity fields after profile/settings precedence is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayFields {
    pub name: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub links_json: Option<String>,
}

fn profile_field<'a>(
    artist: Option<&'a ArtistProfile>,
    pick: impl Fn(&'a ArtistProfile) -> Option<&'a str>,
) -> Option<&'a str> {
    artist.and_then(pick).filter(|v| !v.is_empty())
}

impl DisplayFields {
    pub fn resolve(mode: SiteMode, artist: Option<&ArtistProfile>, settings: &Settings) -> Self {
        match mode {
            SiteMode::Individual => Self {
                name: profile_field(artist, |a| Some(a.username.as_str()))
                    .or_else(|| settings.non_empty("artist_name"))
                    .unwrap_or(DEGRADED_ARTIST_NAME)
                    .to_string(),
                avatar: profile_field(artist, |a| a.artist_avatar.as_deref())
                    .or_else(|| settings.non_empty("artist_avatar"))
                    .map(str::to_string),
                bio: profile_field(artist, |a| a.artist_bio.as_deref())
                    .or_else(|| settings.non_empty("artist_bio"))
                    .map(str::to_string),
                links_json: profile_field(artist, |a| a.social_links.as_deref())
                    .or_else(|| settings.non_empty("social_links"))
                    .map(str::to_string),
            },
            SiteMode::Studio => Self {
                name: settings.get("studio_name", DEFAULT_STUDIO_NAME).to_string(),
                avatar: settings.non_empty("artist_avatar").map(str::to_string),
                bio: settings.non_empty("artist_bio").map(str::to_string),
                links_json: settings.non_empty("social_links").map(str::to_string),
            },
        }
    }
}

/// A JSON array becomes the link list; anything else yields no links.
pub fn decode_social_links(text: Option<&str>) -> Vec<Value> {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return Vec::new();
    };
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => items,
        Ok(other) => {
            debug!("social_links is not a list: {other}");
            Vec::new()
        }
        Err(e) => {
            debug!("social_links is not valid JSON: {e}");
            Vec::new()
        }
    }
}

#[derive(Clone)]
pub struct SiteContextResolver {
    adapter: Arc<dyn StoreAdapter>,
    settings: SettingsStore,
    profiles: ProfileStore,
    plugins: PluginRegistry,
    plugin_data: PluginDataStore,
}

impl SiteContextResolver {
    pub fn new(adapter: Arc<dyn StoreAdapter>) -> Self {
        Self {
            settings: SettingsStore::new(adapter.clone()),
            profiles: ProfileStore::new(adapter.clone()),
            plugins: PluginRegistry::new(adapter.clone()),
            plugin_data: PluginDataStore::new(adapter.clone()),
            adapter,
        }
    }

    /// Never fails: store errors yield the degraded context.
    pub fn resolve(&self, session: &SessionView) -> RenderContext {
        match self.try_resolve(session) {
            Ok(ctx) => ctx.into(),
            Err(err) => {
                warn!("site context degraded (store may not be initialized yet): {err}");
                RenderContext::degraded()
            }
        }
    }

    pub fn try_resolve(&self, session: &SessionView) -> Result<SiteContext, StoreError> {
        with_unit_of_work(self.adapter.as_ref(), |conn| self.resolve_with(conn, session))
    }

    fn resolve_with(
        &self,
        conn: &mut dyn StoreConnection,
        session: &SessionView,
    ) -> Result<SiteContext, StoreError> {
        let settings = self.settings.get_all(conn)?;
        let artist = self.profiles.primary_artist(conn)?;

        let site_mode = settings.get("site_mode", DEFAULT_SITE_MODE).to_string();
        let display = DisplayFields::resolve(SiteMode::from_setting(&site_mode), artist.as_ref(), &settings);
        let social_links = decode_social_links(display.links_json.as_deref());

        let public_plugins = self.plugins.list_active(conn, PluginScope::Public)?;
        let admin_plugins = if session.is_admin {
            self.plugins.list_active(conn, PluginScope::Admin)?
        } else {
            Vec::new()
        };

        let public_plugin_data = match &artist {
            Some(a) => self.plugin_data.list_by_prefix(conn, Some(a.id), PUBLIC_PREFIX)?,
            None => BTreeMap::new(),
        };
        debug!(
            site_mode = %site_mode,
            public_plugins = public_plugins.len(),
            admin_plugins = admin_plugins.len(),
            plugin_data = public_plugin_data.len(),
            "site context resolved"
        );

        let owned = |key: &str, default: &str| settings.get(key, default).to_string();
        let opt = |key: &str| settings.get_opt(key).map(str::to_string);
        Ok(SiteContext {
            artist_name: display.name,
            site_mode,
            social_links,
            public_plugins,
            admin_plugins,
            artist_avatar: display.avatar,
            artist_bio: display.bio,
            session_avatar_url: session.avatar_url.clone(),
            artist_email: owned("artist_email", DEFAULT_ARTIST_EMAIL),
            artist_location: owned("artist_location", DEFAULT_ARTIST_LOCATION),
            artist_process: owned("artist_process", DEFAULT_ARTIST_PROCESS),
            artist_inspirations: owned("artist_inspirations", DEFAULT_ARTIST_INSPIRATIONS),
            home_headline: owned("home_headline", DEFAULT_HOME_HEADLINE),
            home_subheadline: owned("home_subheadline", DEFAULT_HOME_SUBHEADLINE),
            public_plugin_data,
            custom_css: opt("custom_css_theme"),
            paypal_email: opt("paypal_email"),
            paypal_hosted_button_id: opt("paypal_hosted_button_id"),
            pix_key: opt("pix_key"),
            payment_currency_code: owned("payment_currency_code", DEFAULT_CURRENCY_CODE),
        })
    }
}
