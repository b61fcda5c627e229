/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - Atelier Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Who may see a plugin's presence in the rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginScope {
    Public,
    Admin,
}

impl PluginScope {
    pub fn as_str(self) -> &'static str {
        match self {
            PluginScope::Public => "public",
            PluginScope::Admin => "admin",
        }
    }

    /// Unknown scope text is never shown to anonymous sessions.
    pub fn from_db(value: &str) -> Self {
        value.parse().unwrap_or(PluginScope::Admin)
    }
}

impl fmt::Display for PluginScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PluginScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(PluginScope::Public),
            "admin" => Ok(PluginScope::Admin),
            other => Err(format!("unknown plugin scope: {other}")),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PluginInfo {
    pub id: String,
    pub code: String,
    pub is_active: bool,
    pub scope: PluginScope,
}

/// A plugin data value read back from its text column.
///
/// Text that parses as JSON is `Structured`; anything else is kept verbatim as
/// `Raw`. Serializes transparently as the inner value.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Decoded {
    Structured(serde_json::Value),
    Raw(String),
}

impl Decoded {
    pub fn decode(text: &str) -> Self {
        match serde_json::from_str::<serde_json::Value>(text) {
            Ok(value) => Decoded::Structured(value),
            Err(_) => Decoded::Raw(text.to_string()),
        }
    }
}

pub const DEGRADED_ARTIST_NAME: &str = "Site de Arte";
pub const DEFAULT_SITE_MODE: &str = "individual";

/// The merged, read-only context handed to every page render.
///
/// Field names are part of the template contract: every key is always
/// serialized, absent values as `null`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SiteContext {
    pub artist_name: String,
    pub site_mode: String,
    pub social_links: Vec<serde_json::Value>,
    pub public_plugins: Vec<PluginInfo>,
    pub admin_plugins: Vec<PluginInfo>,
    pub artist_avatar: Option<String>,
    pub artist_bio: Option<String>,
    pub session_avatar_url: Option<String>,
    pub artist_email: String,
    pub artist_location: String,
    pub artist_process: String,
    pub artist_inspirations: String,
    pub home_headline: String,
    pub home_subheadline: String,
    pub public_plugin_data: BTreeMap<String, Decoded>,
    pub custom_css: Option<String>,
    pub paypal_email: Option<String>,
    pub paypal_hosted_button_id: Option<String>,
    pub pix_key: Option<String>,
    pub payment_currency_code: String,
}

/// Fallback used when resolution cannot reach the store. Carries only the
/// keys every template can rely on.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DegradedContext {
    pub artist_name: String,
    pub site_mode: String,
    pub social_links: Vec<serde_json::Value>,
    pub public_plugins: Vec<PluginInfo>,
    pub admin_plugins: Vec<PluginInfo>,
}

impl Default for DegradedContext {
    fn default() -> Self {
        Self {
            artist_name: DEGRADED_ARTIST_NAME.to_string(),
            site_mode: DEFAULT_SITE_MODE.to_string(),
            social_links: Vec::new(),
            public_plugins: Vec::new(),
            admin_plugins: Vec::new(),
        }
    }
}

/// What a page render receives. Serializes as the inner mapping.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum RenderContext {
    Degraded(DegradedContext),
    Resolved(Box<SiteContext>),
}

impl RenderContext {
    pub fn degraded() -> Self {
        RenderContext::Degraded(DegradedContext::default())
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, RenderContext::Degraded(_))
    }

    pub fn resolved(&self) -> Option<&SiteContext> {
        match self {
            RenderContext::Resolved(ctx) => Some(&**ctx),
            RenderContext::Degraded(_) => None,
        }
    }

    pub fn artist_name(&self) -> &str {
        match self {
            RenderContext::Resolved(ctx) => &ctx.artist_name,
            RenderContext::Degraded(ctx) => &ctx.artist_name,
        }
    }

    pub fn site_mode(&self) -> &str {
        match self {
            RenderContext::Resolved(ctx) => &ctx.site_mode,
            RenderContext::Degraded(ctx) => &ctx.site_mode,
        }
    }
}

impl From<SiteContext> for RenderContext {
    fn from(ctx: SiteContext) -> Self {
        RenderContext::Resolved(Box::new(ctx))
    }
}
