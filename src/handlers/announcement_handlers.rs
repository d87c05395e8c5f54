use actix_web::{HttpResponse, web};

use crate::auth::authorize::require_role;
use crate::auth::principal::{Principal, RoleKind};
use crate::errors::AppError;
use crate::services::announcement::{self, AnnouncementEdit, NewAnnouncement};
use crate::state::AppState;

/// GET /announcements
pub async fn list(
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<HttpResponse, AppError> {
    let items = announcement::crud(state.provider.as_ref(), principal.scope())
        .list()
        .await?;
    Ok(HttpResponse::Ok().json(items))
}

/// GET /announcements/{id}
pub async fn read(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let item = announcement::crud(state.provider.as_ref(), principal.scope())
        .get_by_id(path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(item))
}

/// POST /announcements (e-board)
pub async fn create(
    state: web::Data<AppState>,
    principal: Principal,
    body: web::Json<NewAnnouncement>,
) -> Result<HttpResponse, AppError> {
    let row = body.into_inner().into_row(principal.id)?;
    require_role(&state, &principal, &[RoleKind::EBoard]).await?;

    let created = announcement::crud(state.provider.as_ref(), principal.scope())
        .add(row)
        .await?;
    Ok(HttpResponse::Created().json(created))
}

/// PUT /announcements - Edit announcement named by `announcement_id` (e-board)
pub async fn update(
    state: web::Data<AppState>,
    principal: Principal,
    body: web::Json<AnnouncementEdit>,
) -> Result<HttpResponse, AppError> {
    let changes = body.changes()?;
    require_role(&state, &principal, &[RoleKind::EBoard]).await?;

    let updated = announcement::crud(state.provider.as_ref(), principal.scope())
        .edit(body.announcement_id, changes)
        .await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// DELETE /announcements/{id} (e-board)
pub async fn delete(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_role(&state, &principal, &[RoleKind::EBoard]).await?;
    announcement::crud(state.provider.as_ref(), principal.scope())
        .delete(path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
