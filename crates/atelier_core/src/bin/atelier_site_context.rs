/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - Atelier Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use anyhow::Context;
use atelier_core::schema::initialize;
use atelier_core::{build_adapter, SessionView, SiteContextResolver, StoreConfig};
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let mut session = SessionView::anonymous();
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--admin" => session.is_admin = true,
            "--avatar" => session.avatar_url = args.next().filter(|v| !v.trim().is_empty()),
            other => anyhow::bail!("usage: atelier_site_context [--admin] [--avatar <url>] (unexpected {other})"),
        }
    }

    let cfg = StoreConfig::from_env();
    let adapter = build_adapter(&cfg)?;
    initialize(adapter.as_ref(), &cfg.seed).context("initialize schema")?;

    let ctx = SiteContextResolver::new(adapter).resolve(&session);
    println!("{}", serde_json::to_string_pretty(&ctx)?);
    Ok(())
}
