//! Sign-in through an external OAuth identity provider.
//!
//! `/auth/login` stores a random state and PKCE verifier in the cookie
//! session and redirects to the provider. `/auth/callback` checks the
//! returned state, exchanges the code and reads the userinfo endpoint.

use actix_session::Session;
use async_trait::async_trait;
use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, Scope as OAuthScope, TokenResponse, TokenUrl,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::config::OAuthConfig;
use crate::errors::AppError;

const STATE_KEY: &str = "oauth_state";
const VERIFIER_KEY: &str = "oauth_pkce_verifier";

/// Identity returned by the provider after a successful exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
    pub pkce_verifier: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn authorization_request(&self) -> AuthorizationRequest;

    async fn exchange_code(&self, code: &str, pkce_verifier: &str) -> Result<Identity, AppError>;
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Users are keyed by UUID; providers whose subjects are not UUIDs get a
/// stable name-based one.
pub fn identity_id(issuer: &str, sub: &str) -> Uuid {
    Uuid::parse_str(sub)
        .unwrap_or_else(|_| Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("{issuer}#{sub}").as_bytes()))
}

fn invalid_url(name: &'static str) -> impl Fn(oauth2::url::ParseError) -> AppError {
    move |e| AppError::Config(format!("{name}: {e}"))
}

pub struct OAuthIdentityProvider {
    client: BasicClient,
    userinfo_url: String,
    http: reqwest::Client,
}

impl OAuthIdentityProvider {
    pub fn new(config: &OAuthConfig, redirect_url: &str) -> Result<Self, AppError> {
        let client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            AuthUrl::new(config.auth_url.clone()).map_err(invalid_url("OAUTH_AUTH_URL"))?,
            Some(TokenUrl::new(config.token_url.clone()).map_err(invalid_url("OAUTH_TOKEN_URL"))?),
        )
        .set_redirect_uri(RedirectUrl::new(redirect_url.to_string()).map_err(invalid_url("PUBLIC_URL"))?);

        Ok(Self {
            client,
            userinfo_url: config.userinfo_url.clone(),
            http: reqwest::Client::new(),
        })
    }
}

#[async_trait]
impl IdentityProvider for OAuthIdentityProvider {
    fn authorization_request(&self) -> AuthorizationRequest {
        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
        let (url, state) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scope(OAuthScope::new("openid".to_string()))
            .add_scope(OAuthScope::new("email".to_string()))
            .add_scope(OAuthScope::new("profile".to_string()))
            .set_pkce_challenge(challenge)
            .url();
        AuthorizationRequest {
            url: url.to_string(),
            state: state.secret().clone(),
            pkce_verifier: verifier.secret().clone(),
        }
    }

    async fn exchange_code(&self, code: &str, pkce_verifier: &str) -> Result<Identity, AppError> {
        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| {
                log::warn!("OAuth code exchange failed: {e}");
                AppError::Unauthenticated
            })?;

        let info: UserInfo = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(token.access_token().secret())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| {
                log::warn!("Userinfo request failed: {e}");
                AppError::Unauthenticated
            })?
            .json()
            .await
            .map_err(|e| {
                log::warn!("Userinfo response unreadable: {e}");
                AppError::Unauthenticated
            })?;

        Ok(Identity {
            id: identity_id(&self.userinfo_url, &info.sub),
            email: info.email,
            full_name: info.name,
        })
    }
}

/// Remember the pending sign-in in the cookie session.
pub fn store_pending(session: &Session, request: &AuthorizationRequest) -> Result<(), AppError> {
    session.insert(STATE_KEY, &request.state)?;
    session.insert(VERIFIER_KEY, &request.pkce_verifier)?;
    Ok(())
}

/// Consume the pending sign-in. The returned state must match the stored
/// one; the PKCE verifier is handed back for the code exchange.
pub fn take_pending(session: &Session, returned_state: &str) -> Result<String, AppError> {
    let state = session.remove_as::<String>(STATE_KEY).and_then(Result::ok);
    let verifier = session.remove_as::<String>(VERIFIER_KEY).and_then(Result::ok);

    match state.zip(verifier) {
        Some((state, verifier)) if constant_time_eq(&state, returned_state) => Ok(verifier),
        Some(_) => {
            log::warn!("OAuth callback state mismatch");
            Err(AppError::Unauthenticated)
        }
        None => {
            log::warn!("OAuth callback without a pending sign-in");
            Err(AppError::Unauthenticated)
        }
    }
}

/// Constant-time string comparison.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
