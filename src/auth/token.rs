//! Bearer token extraction, verification and issuance.
//!
//! Every protected route goes through [`TokenVerifier::verify`], which checks
//! the HS256 signature and expiry. There is no decode-only path.

use actix_web::http::header::{AUTHORIZATION, HeaderMap};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::auth::principal::{Principal, Role};
use crate::errors::AppError;

/// Audience stamped on issued tokens and required on verified ones.
pub const AUDIENCE: &str = "authenticated";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_metadata: Option<UserMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Value>,
    /// Every stored role; `role` repeats the first for single-role readers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<Value>,
}

impl Claims {
    /// Top-level email, falling back to the nested metadata copy.
    pub fn email(&self) -> Option<String> {
        self.email
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .or_else(|| {
                self.user_metadata
                    .as_ref()
                    .and_then(|m| m.email.as_deref())
                    .filter(|e| !e.trim().is_empty())
            })
            .map(str::to_string)
    }

    /// Roles from the `roles` array, or the single `role` claim when the
    /// array is absent. Unrecognised entries are skipped.
    pub fn roles(&self) -> Vec<Role> {
        if self.roles.is_empty() {
            return self.role.iter().filter_map(Role::from_claim).collect();
        }
        self.roles.iter().filter_map(Role::from_claim).collect()
    }
}

/// Parse an `Authorization` header value. Exactly two space-separated parts
/// with the `Bearer` scheme; anything else yields `None`.
pub fn parse_authorization(value: &str) -> Option<&str> {
    let mut parts = value.split(' ');
    let scheme = parts.next()?;
    let token = parts.next()?;
    if parts.next().is_some() || scheme != "Bearer" || token.is_empty() {
        return None;
    }
    Some(token)
}

/// Pull the bearer token from request headers. Never fails; absent or
/// malformed headers yield `None`.
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    parse_authorization(value)
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct TokenVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl TokenVerifier {
    pub fn new(secret: &[u8], ttl_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[AUDIENCE]);
        validation.set_required_spec_claims(&["exp", "sub", "aud"]);
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl_secs,
        }
    }

    /// Verify signature and expiry, then build the principal.
    pub fn verify(&self, token: &str) -> Result<Principal, AppError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            log::debug!("Rejected bearer token: {e}");
            AppError::Unauthenticated
        })?;
        let claims = data.claims;
        let id = Uuid::parse_str(&claims.sub).map_err(|_| {
            log::debug!("Rejected bearer token: subject is not a user id");
            AppError::Unauthenticated
        })?;
        Ok(Principal {
            id,
            email: claims.email(),
            roles: claims.roles(),
        })
    }

    pub fn issue(
        &self,
        id: Uuid,
        email: Option<&str>,
        roles: &[Role],
    ) -> Result<IssuedToken, AppError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: id.to_string(),
            aud: AUDIENCE.to_string(),
            exp: now + self.ttl_secs,
            iat: now,
            email: email.map(str::to_string),
            user_metadata: None,
            role: roles.first().map(Role::to_claim),
            roles: roles.iter().map(Role::to_claim).collect(),
        };
        self.sign(&claims).map(|access_token| IssuedToken {
            access_token,
            token_type: "bearer",
            expires_in: self.ttl_secs,
        })
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AppError::Session(format!("Failed to sign token: {e}")))
    }
}
