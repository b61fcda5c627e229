/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - Atelier Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use atelier_core::schema::{initialize, SeedValues};
use atelier_core::{
    build_adapter, with_unit_of_work, NewPlugin, PluginDataStore, PluginRegistry, ProfileStore,
    SessionView, SettingsStore, SiteContextResolver, StoreAdapter, StoreConfig, StoreError,
};
use atelier_protocol::{PluginScope, RenderContext};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

fn sqlite_adapter(dir: &tempfile::TempDir) -> Arc<dyn StoreAdapter> {
    let vars: HashMap<&str, String> = HashMap::from([
        ("ATELIER_DB_PATH", dir.path().join("site.db").display().to_string()),
        ("PAYPAL_EMAIL", "pay@example.com".to_string()),
    ]);
    let cfg = StoreConfig::from_lookup(|k| vars.get(k).cloned());
    let adapter = build_adapter(&cfg).unwrap();
    initialize(adapter.as_ref(), &cfg.seed).unwrap();
    adapter
}

fn plugin(id: &str, scope: PluginScope) -> NewPlugin {
    NewPlugin {
        id: id.to_string(),
        name: id.to_string(),
        description: Some(format!("{id} plugin")),
        version: Some("0.1".into()),
        code: format!("init_{id}();"),
        is_active: true,
        scope,
    }
}

#[test]
fn full_site_context_for_an_individual_artist() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = sqlite_adapter(&dir);

    let profiles = ProfileStore::new(adapter.clone());
    let registry = PluginRegistry::new(adapter.clone());
    let artist_id = with_unit_of_work(adapter.as_ref(), |conn| {
        let id = profiles.insert_user(conn, "mara", true)?;
        profiles.update_artist_profile(
            conn,
            id,
            Some("/static/avatars/mara.png"),
            Some("Pinto murais."),
            Some(r#"[{"network":"instagram","url":"https://instagram.com/mara"}]"#),
        )?;
        registry.register(conn, &plugin("gallery", PluginScope::Public))?;
        registry.register(conn, &plugin("sales", PluginScope::Admin))?;
        Ok::<_, StoreError>(id)
    })
    .unwrap();

    let data = PluginDataStore::new(adapter.clone());
    data.upsert_value("contacts", Some(artist_id), "public_links", &json!([{"a": 1}, {"b": 2}]))
        .unwrap();
    data.upsert_value("contacts", Some(artist_id), "internal_notes", &json!("hidden"))
        .unwrap();

    let resolver = SiteContextResolver::new(adapter.clone());
    let rendered = resolver.resolve(&SessionView {
        is_admin: true,
        avatar_url: Some("/static/avatars/mara.png".into()),
    });
    let ctx = rendered.resolved().unwrap();

    assert_eq!(ctx.artist_name, "mara");
    assert_eq!(ctx.site_mode, "individual");
    assert_eq!(ctx.artist_bio.as_deref(), Some("Pinto murais."));
    assert_eq!(ctx.social_links.len(), 1);
    assert_eq!(ctx.paypal_email.as_deref(), Some("pay@example.com"));
    assert_eq!(ctx.payment_currency_code, "BRL");
    assert_eq!(ctx.admin_plugins.len(), 1);
    assert_eq!(ctx.public_plugins[0].code, "init_gallery();");

    let json = serde_json::to_value(&rendered).unwrap();
    assert_eq!(json.as_object().unwrap().len(), 20);
    assert_eq!(json["public_plugin_data"], json!({"links": [{"a": 1}, {"b": 2}]}));
    assert_eq!(json["session_avatar_url"], "/static/avatars/mara.png");
    assert_eq!(json["social_links"][0]["network"], "instagram");
    assert_eq!(json["public_plugins"][0]["scope"], "public");
}

#[test]
fn settings_changes_are_visible_on_the_next_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = sqlite_adapter(&dir);
    let resolver = SiteContextResolver::new(adapter.clone());
    let settings = SettingsStore::new(adapter.clone());

    assert_eq!(resolver.resolve(&SessionView::anonymous()).site_mode(), "individual");
    with_unit_of_work(adapter.as_ref(), |conn| {
        settings.set(conn, "site_mode", "studio")?;
        settings.set(conn, "studio_name", "Coletivo Sul")
    })
    .unwrap();

    let ctx = resolver.try_resolve(&SessionView::anonymous()).unwrap();
    assert_eq!(ctx.site_mode, "studio");
    assert_eq!(ctx.artist_name, "Coletivo Sul");
    assert!(ctx.admin_plugins.is_empty());
}

#[test]
fn reinitializing_keeps_existing_settings() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = sqlite_adapter(&dir);
    let settings = SettingsStore::new(adapter.clone());
    with_unit_of_work(adapter.as_ref(), |conn| settings.set(conn, "artist_name", "Outra"))
        .unwrap();

    assert_eq!(initialize(adapter.as_ref(), &SeedValues::default()).unwrap(), 0);
    let ctx = SiteContextResolver::new(adapter)
        .try_resolve(&SessionView::anonymous())
        .unwrap();
    assert_eq!(ctx.artist_name, "Outra");
    assert_eq!(ctx.paypal_email.as_deref(), Some("pay@example.com"));
}

#[test]
fn degraded_context_serializes_to_five_keys() {
    let json = serde_json::to_value(RenderContext::degraded()).unwrap();
    let Value::Object(map) = json else {
        panic!("context must serialize to an object");
    };
    let mut keys = map.keys().cloned().collect::<Vec<_>>();
    keys.sort();
    assert_eq!(
        keys,
        vec!["admin_plugins", "artist_name", "public_plugins", "site_mode", "social_links"]
    );
}

#[test]
fn plugin_data_without_an_owner_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = sqlite_adapter(&dir);
    let data = PluginDataStore::new(adapter.clone());
    data.upsert_value("banner", None, "public_text", &json!("first")).unwrap();
    data.upsert_value("banner", None, "public_text", &json!({"text": "second"}))
        .unwrap();

    let cells = with_unit_of_work(adapter.as_ref(), |conn| {
        data.list_by_prefix(conn, None, "public_")
    })
    .unwrap();
    assert_eq!(cells.len(), 1);
    assert_eq!(serde_json::to_value(&cells).unwrap(), json!({"text": {"text": "second"}}));
}
