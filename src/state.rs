use std::sync::Arc;

use crate::auth::oauth::IdentityProvider;
use crate::auth::token::TokenVerifier;
use crate::geo::Geocoder;
use crate::provider::DataProvider;
use crate::storage::ObjectStore;

/// Shared application state, cloned into every worker via `web::Data`.
/// Collaborators sit behind traits so tests can swap in fakes.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn DataProvider>,
    pub geocoder: Arc<dyn Geocoder>,
    pub identity: Arc<dyn IdentityProvider>,
    pub storage: Arc<dyn ObjectStore>,
    pub tokens: TokenVerifier,
    pub frontend_url: String,
    pub max_photo_bytes: usize,
}
