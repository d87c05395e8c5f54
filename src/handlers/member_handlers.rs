use actix_web::{HttpResponse, web};
use uuid::Uuid;

use crate::auth::authorize::{require_role, require_self_or_role};
use crate::auth::principal::{Principal, RoleKind};
use crate::errors::AppError;
use crate::services::member_info::{self, MemberInfoEdit, NewMemberInfo};
use crate::state::AppState;

/// GET /members - Member directory (e-board, sponsor)
pub async fn list(
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<HttpResponse, AppError> {
    require_role(&state, &principal, &[RoleKind::EBoard, RoleKind::Sponsor]).await?;
    let members = member_info::crud(state.provider.as_ref(), principal.scope())
        .list()
        .await?;
    Ok(HttpResponse::Ok().json(members))
}

/// GET /members/{user_id} - Own profile, or any with e-board / sponsor role
pub async fn read(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let owner = path.into_inner();
    require_self_or_role(&state, &principal, owner, &[RoleKind::EBoard, RoleKind::Sponsor])
        .await?;
    let info = member_info::crud(state.provider.as_ref(), principal.scope())
        .get_by_id(owner.to_string())
        .await?;
    Ok(HttpResponse::Ok().json(info))
}

/// POST /members - Create profile for self (or anyone, e-board)
pub async fn create(
    state: web::Data<AppState>,
    principal: Principal,
    body: web::Json<NewMemberInfo>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let owner = body.owner(principal.id);
    let row = body.into_row(owner)?;
    require_self_or_role(&state, &principal, owner, &[RoleKind::EBoard]).await?;

    let created = member_info::crud(state.provider.as_ref(), principal.scope())
        .add(row)
        .await?;
    Ok(HttpResponse::Created().json(created))
}

/// PUT /members - Edit profile named by `user_id` (self or e-board)
pub async fn update(
    state: web::Data<AppState>,
    principal: Principal,
    body: web::Json<MemberInfoEdit>,
) -> Result<HttpResponse, AppError> {
    let changes = body.changes()?;
    require_self_or_role(&state, &principal, body.user_id, &[RoleKind::EBoard]).await?;

    let updated = member_info::crud(state.provider.as_ref(), principal.scope())
        .edit(body.user_id.to_string(), changes)
        .await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// DELETE /members/{user_id} (e-board)
pub async fn delete(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    require_role(&state, &principal, &[RoleKind::EBoard]).await?;
    member_info::crud(state.provider.as_ref(), principal.scope())
        .delete(path.into_inner().to_string())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
