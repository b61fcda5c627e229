/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - Atelier Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use serde_json::json;
use tracing::info;

use crate::error::StoreError;
use crate::store::{with_unit_of_work, Dialect, SqlValue, StoreAdapter, StoreConnection};

/// Deployment-provided values folded into the first-boot settings.
#[derive(Clone, Debug, Default)]
pub struct SeedValues {
    pub paypal_email: String,
    pub paypal_hosted_button_id: String,
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
}

pub fn schema_sql(dialect: Dialect) -> String {
    let serial = dialect.autoincrement_primary_key();
    let no = dialect.bool_literal(false);
    // PostgreSQL forces primary key columns NOT NULL; cells may have no owner.
    let cell_key = match dialect {
        Dialect::Sqlite => "PRIMARY KEY",
        Dialect::Postgres => "UNIQUE",
    };
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS users (
          id {serial},
          username TEXT NOT NULL UNIQUE,
          password_hash TEXT NOT NULL DEFAULT '',
          created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
          is_admin BOOLEAN NOT NULL DEFAULT {no},
          artist_avatar TEXT,
          social_links TEXT,
          artist_bio TEXT
        );
        CREATE TABLE IF NOT EXISTS settings (
          key TEXT PRIMARY KEY NOT NULL,
          value TEXT
        );
        CREATE TABLE IF NOT EXISTS plugins (
          id TEXT PRIMARY KEY NOT NULL,
          name TEXT NOT NULL,
          description TEXT,
          version TEXT,
          code TEXT NOT NULL,
          is_active BOOLEAN NOT NULL DEFAULT {no},
          scope TEXT NOT NULL DEFAULT 'admin',
          created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        );
        CREATE TABLE IF NOT EXISTS plugin_data (
          plugin_id TEXT NOT NULL,
          user_id INTEGER,
          key TEXT NOT NULL,
          value TEXT,
          {cell_key} (plugin_id, user_id, key)
        );
        "#
    )
}

pub fn default_settings(seed: &SeedValues) -> Vec<(&'static str, String)> {
    let phases = json!([
        {"name": "Esboço", "revisions_limit": 3},
        {"name": "Arte Final", "revisions_limit": 1}
    ]);
    vec![
        ("site_mode", "individual".to_string()),
        ("studio_name", "Nome do Estúdio".to_string()),
        ("artist_name", "Seu Nome Artístico".to_string()),
        ("artist_email", "contato@seu-site.com".to_string()),
        ("artist_location", "Sua Cidade, Seu Estado".to_string()),
        (
            "artist_bio",
            "Bem-vindo ao meu portfólio! Sou um artista apaixonado por criar obras únicas. Explore minha galeria para conhecer mais sobre meu trabalho.".to_string(),
        ),
        (
            "artist_process",
            "Meu processo criativo envolve uma combinação de técnicas digitais e tradicionais para dar vida às minhas ideias.".to_string(),
        ),
        (
            "artist_inspirations",
            "Minhas inspirações vêm da natureza, da cultura pop e das emoções humanas.".to_string(),
        ),
        ("home_headline", "Bem-vindo à minha Galeria Digital".to_string()),
        ("home_subheadline", "Explore um universo de cores e formas.".to_string()),
        ("social_links", "[]".to_string()),
        ("commission_types", "[]".to_string()),
        ("commission_extras", "[]".to_string()),
        ("default_phases", phases.to_string()),
        (
            "refund_policy",
            "Pedidos cancelados antes do início da fase de esboço são elegíveis para um reembolso de 50%.".to_string(),
        ),
        (
            "revision_alert_text",
            "Você possui <strong>{revisions_left} de {revisions_limit}</strong> revisões restantes para esta fase.".to_string(),
        ),
        ("custom_css_theme", String::new()),
        ("paypal_email", seed.paypal_email.clone()),
        ("paypal_hosted_button_id", seed.paypal_hosted_button_id.clone()),
        ("payment_currency_code", "BRL".to_string()),
        ("pix_key", String::new()),
        ("TELEGRAM_ENABLED", "false".to_string()),
        ("TELEGRAM_BOT_TOKEN", seed.telegram_bot_token.clone()),
        ("TELEGRAM_CHAT_ID", seed.telegram_chat_id.clone()),
        (
            "TELEGRAM_TEMPLATE_CONTACT",
            "🔔 *Nova mensagem de contato!*\n\n*De:* {name}\n*Email:* {email}\n\n*Mensagem:*\n{message}".to_string(),
        ),
        (
            "TELEGRAM_TEMPLATE_NEW_COMMISSION",
            "🎨 *Novo Pedido Recebido!*\n\n*ID:* {commission_id}\n*Cliente:* {client_name}\n*Tipo:* {commission_type}\n*Valor:* R$ {price}".to_string(),
        ),
    ]
}

/// Creates any missing table and seeds the settings on first boot. Safe to
/// run on every start: existing tables and settings are left untouched.
pub fn initialize(adapter: &dyn StoreAdapter, seed: &SeedValues) -> Result<usize, StoreError> {
    with_unit_of_work(adapter, |conn| {
        conn.execute_batch(&schema_sql(adapter.dialect()))?;
        info!("tables verified");
        seed_settings(adapter, conn, seed)
    })
}

fn seed_settings(
    adapter: &dyn StoreAdapter,
    conn: &mut dyn StoreConnection,
    seed: &SeedValues,
) -> Result<usize, StoreError> {
    let existing = conn
        .query_opt("SELECT COUNT(*) AS n FROM settings", &[])?
        .and_then(|r| r.integer("n"))
        .unwrap_or(0);
    if existing > 0 {
        info!("settings already populated ({existing} keys)");
        return Ok(0);
    }
    let sql = format!(
        "INSERT INTO settings (key, value) VALUES ({}, {})",
        adapter.placeholder(1),
        adapter.placeholder(2)
    );
    let defaults = default_settings(seed);
    for (key, value) in &defaults {
        conn.execute(&sql, &[SqlValue::from(*key), SqlValue::from(value.as_str())])?;
    }
    info!("default settings inserted ({} keys)", defaults.len());
    Ok(defaults.len())
}
