//! Shared test infrastructure for HTTP-level tests.
//!
//! Every test builds a `Harness`: the in-memory data provider, a fake
//! geocoder and identity provider, and a temporary upload directory wired
//! into a real `AppState`. `init_app!` turns it into a test service with the
//! production route table.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};
use tempfile::TempDir;
use uuid::Uuid;

use chapter_portal::auth::oauth::{AuthorizationRequest, Identity, IdentityProvider};
use chapter_portal::auth::principal::Role;
use chapter_portal::auth::token::TokenVerifier;
use chapter_portal::errors::AppError;
use chapter_portal::geo::{Coordinates, Geocoder};
use chapter_portal::provider::{MemoryProvider, Row, Table};
use chapter_portal::state::AppState;
use chapter_portal::storage::FsObjectStore;

// ============================================================================
// TEST CONSTANTS
// ============================================================================

pub const JWT_SECRET: &[u8] = b"integration-test-secret-0123456789abcdef";
pub const FRONTEND_URL: &str = "http://frontend.test";
pub const STORAGE_URL: &str = "http://portal.test/storage";
pub const MAX_PHOTO_BYTES: usize = 1024;

pub const OAUTH_STATE: &str = "fixed-state";
pub const OAUTH_VERIFIER: &str = "fixed-verifier";
pub const OAUTH_CODE: &str = "good-code";

/// Venue used by seeded events.
pub const VENUE: Coordinates = Coordinates {
    lat: 40.4237,
    lon: -86.9212,
};

/// About 2 km north of `VENUE`.
pub const FAR_AWAY: Coordinates = Coordinates {
    lat: 40.4417,
    lon: -86.9212,
};

// ============================================================================
// FAKE COLLABORATORS
// ============================================================================

/// Geocoder returning a fixed answer and counting calls.
pub struct FakeGeocoder {
    answer: Mutex<Result<Coordinates, String>>,
    calls: AtomicUsize,
}

impl FakeGeocoder {
    pub fn returning(coords: Coordinates) -> Arc<Self> {
        Arc::new(Self {
            answer: Mutex::new(Ok(coords)),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Mutex::new(Err(message.to_string())),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn geocode(&self, _address: &str) -> Result<Coordinates, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer
            .lock()
            .unwrap()
            .clone()
            .map_err(AppError::GeocodeFailure)
    }
}

/// Identity provider that accepts one code and returns one identity.
pub struct FakeIdentity {
    pub identity: Identity,
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    fn authorization_request(&self) -> AuthorizationRequest {
        AuthorizationRequest {
            url: format!("https://idp.test/authorize?state={OAUTH_STATE}"),
            state: OAUTH_STATE.to_string(),
            pkce_verifier: OAUTH_VERIFIER.to_string(),
        }
    }

    async fn exchange_code(&self, code: &str, pkce_verifier: &str) -> Result<Identity, AppError> {
        if code == OAUTH_CODE && pkce_verifier == OAUTH_VERIFIER {
            Ok(self.identity.clone())
        } else {
            Err(AppError::Unauthenticated)
        }
    }
}

// ============================================================================
// HARNESS
// ============================================================================

pub struct Harness {
    pub provider: Arc<MemoryProvider>,
    pub geocoder: Arc<FakeGeocoder>,
    pub identity: Identity,
    pub uploads: TempDir,
    pub state: AppState,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_geocoder(FakeGeocoder::returning(VENUE))
    }

    pub fn with_geocoder(geocoder: Arc<FakeGeocoder>) -> Self {
        let provider = Arc::new(MemoryProvider::new());
        let uploads = TempDir::new().expect("Failed to create temp dir");
        let identity = Identity {
            id: Uuid::new_v4(),
            email: Some("newcomer@example.edu".to_string()),
            full_name: Some("New Comer".to_string()),
        };
        let state = AppState {
            provider: provider.clone(),
            geocoder: geocoder.clone(),
            identity: Arc::new(FakeIdentity {
                identity: identity.clone(),
            }),
            storage: Arc::new(FsObjectStore::new(uploads.path(), STORAGE_URL)),
            tokens: TokenVerifier::new(JWT_SECRET, 3600),
            frontend_url: FRONTEND_URL.to_string(),
            max_photo_bytes: MAX_PHOTO_BYTES,
        };
        Self {
            provider,
            geocoder,
            identity,
            uploads,
            state,
        }
    }

    pub fn seed(&self, table: Table, value: Value) -> Row {
        let Value::Object(row) = value else {
            panic!("seed rows must be JSON objects");
        };
        self.provider.seed(table, row).expect("Failed to seed row")
    }

    /// Create a user with an optional stored role; returns the user id.
    pub fn add_user(&self, role: Option<Role>) -> Uuid {
        let id = Uuid::new_v4();
        self.seed(
            Table::Users,
            json!({ "id": id, "email": format!("{id}@example.edu") }),
        );
        if let Some(role) = role {
            let company = match &role {
                Role::Sponsor { company } => Value::from(company.as_str()),
                _ => Value::Null,
            };
            self.seed(
                Table::UserRoles,
                json!({ "user_id": id, "role": role.kind().as_str(), "company_name": company }),
            );
        }
        id
    }

    pub fn token_for(&self, id: Uuid) -> String {
        self.state
            .tokens
            .issue(id, Some(&format!("{id}@example.edu")), &[])
            .expect("Failed to issue token")
            .access_token
    }

    pub fn bearer(&self, id: Uuid) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", self.token_for(id)))
    }

    /// Seed an event; returns its id.
    pub fn add_event(&self, location: &str, coords: Option<Coordinates>) -> i64 {
        let row = self.seed(
            Table::Events,
            json!({
                "name": "Chapter meeting",
                "location": location,
                "lat": coords.map(|c| c.lat),
                "lon": coords.map(|c| c.lon),
            }),
        );
        row["id"].as_i64().expect("event id")
    }
}

/// Build a test service over `$harness` with the production routes and a
/// cookie session.
#[macro_export]
macro_rules! init_app {
    ($harness:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(
                    actix_session::SessionMiddleware::builder(
                        actix_session::storage::CookieSessionStore::default(),
                        actix_web::cookie::Key::from(&[7u8; 64]),
                    )
                    .cookie_secure(false)
                    .build(),
                )
                .app_data(actix_web::web::Data::new($harness.state.clone()))
                .configure(|cfg| {
                    chapter_portal::handlers::configure(cfg, common::MAX_PHOTO_BYTES)
                }),
        )
        .await
    };
}
