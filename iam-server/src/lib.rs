pub mod config;

use std::sync::Arc;

use anyhow::Result;
use axum::routing::get;
use axum::Router;
use iam_auth::{JwtSigner, LocalRegistration, SignerOptions};
use iam_axum::{AxumApp, IamState};
use iam_core::{ConfigSnapshot, ContextResolver, IamSettings, MemoryStore};

/// Wire the in-memory stores, the signer and the registration flow into
/// an app. Organizations listed in `seed.organizations` are created up front.
pub fn build(cfg: &ConfigSnapshot) -> Result<AxumApp> {
    let settings = IamSettings::from_snapshot(cfg)?;
    let signer = JwtSigner::new(SignerOptions::from_snapshot(cfg)?)?;

    let store = Arc::new(MemoryStore::new());
    for slug in cfg.get_list("seed.organizations").unwrap_or_default() {
        store.add_organization(&slug, &slug, None)?;
    }

    tracing::info!(
        roles = ?settings.roles.names(),
        email_verification = %settings.email_verification,
        "iam.configured"
    );

    let resolver = ContextResolver::new(settings.roles.clone(), store.clone(), store.clone());
    let state = IamState::new(
        settings,
        resolver,
        Arc::new(signer),
        store.clone(),
        store.clone(),
        Arc::new(LocalRegistration::new(store)),
    );

    let ax = AxumApp::new(state).merge(Router::new().route("/health", get(|| async { "ok" })));
    Ok(ax)
}

/// `host:port` to bind.
pub fn bind_addr(cfg: &ConfigSnapshot) -> String {
    let host = cfg.get("http.host").unwrap_or("127.0.0.1");
    let port = cfg.get("http.port").unwrap_or("3000");
    format!("{host}:{port}")
}
