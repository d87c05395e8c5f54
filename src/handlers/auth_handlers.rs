use actix_session::Session;
use actix_web::http::header::LOCATION;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::auth::oauth;
use crate::auth::principal::{Principal, Role};
use crate::errors::AppError;
use crate::services::{user, user_role};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub profile_photo_url: Option<String>,
    pub roles: Vec<Value>,
}

/// GET /auth/login - Redirect to the identity provider
pub async fn login(
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let request = state.identity.authorization_request();
    oauth::store_pending(&session, &request)?;
    Ok(HttpResponse::SeeOther()
        .insert_header((LOCATION, request.url))
        .finish())
}

/// GET /auth/callback - Finish sign-in and hand the session token to the frontend
pub async fn callback(
    state: web::Data<AppState>,
    session: Session,
    query: web::Query<CallbackQuery>,
) -> Result<HttpResponse, AppError> {
    if let Some(error) = &query.error {
        log::warn!("Identity provider returned error: {error}");
        return Err(AppError::Unauthenticated);
    }
    let (Some(code), Some(returned_state)) = (&query.code, &query.state) else {
        return Err(AppError::Unauthenticated);
    };

    let verifier = oauth::take_pending(&session, returned_state)?;
    let identity = state.identity.exchange_code(code, &verifier).await?;

    let provider = state.provider.as_ref();
    let account = user::upsert(
        provider,
        identity.id,
        identity.email.as_deref(),
        identity.full_name.as_deref(),
    )
    .await?;
    let roles = user_role::roles_for_user(provider, account.id).await?;
    let issued = state
        .tokens
        .issue(account.id, account.email.as_deref(), &roles)?;

    let fragment = serde_urlencoded::to_string(&issued)
        .map_err(|e| AppError::Session(format!("Failed to encode token: {e}")))?;
    log::info!("User {} signed in", account.id);
    Ok(HttpResponse::SeeOther()
        .insert_header((
            LOCATION,
            format!("{}/auth/callback#{fragment}", state.frontend_url),
        ))
        .finish())
}

/// GET /auth/me - Current user with stored roles
pub async fn me(
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<HttpResponse, AppError> {
    let provider = state.provider.as_ref();
    let account = user::find(provider, principal.id).await?;
    let roles = user_role::roles_for_user(provider, principal.id).await?;

    let (full_name, profile_photo_url, email) = match account {
        Some(u) => (u.full_name, u.profile_photo_url, u.email.or(principal.email)),
        None => (None, None, principal.email),
    };
    Ok(HttpResponse::Ok().json(MeResponse {
        id: principal.id,
        email,
        full_name,
        profile_photo_url,
        roles: roles.iter().map(Role::to_claim).collect(),
    }))
}
