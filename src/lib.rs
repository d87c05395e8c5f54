pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod errors;
pub mod geo;
pub mod handlers;
pub mod provider;
pub mod services;
pub mod state;
pub mod storage;
pub mod validate;

use std::sync::Arc;

use crate::auth::oauth::OAuthIdentityProvider;
use crate::auth::token::TokenVerifier;
use crate::config::{AppConfig, DataBackend};
use crate::errors::AppError;
use crate::geo::MapboxGeocoder;
use crate::provider::DataProvider;
use crate::provider::memory::MemoryProvider;
use crate::provider::postgres::PgProvider;
use crate::state::AppState;
use crate::storage::FsObjectStore;

/// Connect collaborators named by the configuration.
pub async fn build_state(config: &AppConfig) -> Result<AppState, AppError> {
    let provider: Arc<dyn DataProvider> = match &config.backend {
        DataBackend::Postgres {
            url,
            max_connections,
            rls_role,
        } => {
            let pool = db::init_pool(url, *max_connections).await?;
            db::run_migrations(&pool).await?;
            Arc::new(PgProvider::new(pool, rls_role)?)
        }
        DataBackend::Memory => {
            log::warn!("Using in-memory data backend; nothing is persisted");
            Arc::new(MemoryProvider::new())
        }
    };

    std::fs::create_dir_all(&config.upload_dir)
        .map_err(|e| AppError::Config(format!("UPLOAD_DIR {}: {e}", config.upload_dir)))?;

    Ok(AppState {
        provider,
        geocoder: Arc::new(MapboxGeocoder::new(
            &config.geocoder_url,
            &config.geocoder_api_key,
        )?),
        identity: Arc::new(OAuthIdentityProvider::new(
            &config.oauth,
            &config.redirect_url(),
        )?),
        storage: Arc::new(FsObjectStore::new(
            &config.upload_dir,
            &config.storage_url(),
        )),
        tokens: TokenVerifier::new(config.jwt_secret.as_bytes(), config.jwt_ttl_secs),
        frontend_url: config.frontend_url.clone(),
        max_photo_bytes: config.max_photo_bytes,
    })
}
