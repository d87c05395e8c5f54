use actix_web::http::header::CONTENT_TYPE;
use actix_web::{HttpRequest, HttpResponse, web};

use crate::auth::principal::Principal;
use crate::errors::AppError;
use crate::services::profile_photo;
use crate::state::AppState;

/// POST /profile/photo - Raw image body
pub async fn upload_photo(
    req: HttpRequest,
    state: web::Data<AppState>,
    principal: Principal,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let updated = profile_photo::upload(
        state.provider.as_ref(),
        state.storage.as_ref(),
        &principal,
        content_type,
        &body,
        state.max_photo_bytes,
    )
    .await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// DELETE /profile/photo
pub async fn remove_photo(
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<HttpResponse, AppError> {
    let updated =
        profile_photo::remove(state.provider.as_ref(), state.storage.as_ref(), &principal).await?;
    Ok(HttpResponse::Ok().json(updated))
}
