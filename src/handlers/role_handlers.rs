use actix_web::{HttpResponse, web};
use uuid::Uuid;

use crate::auth::authorize::{require_role, require_self_or_role};
use crate::auth::principal::{Principal, RoleKind};
use crate::errors::AppError;
use crate::services::user_role::{self, NewUserRole, UserRoleEdit};
use crate::state::AppState;

const MANAGERS: &[RoleKind] = &[RoleKind::EBoard];

/// GET /roles - All role assignments
pub async fn list(
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<HttpResponse, AppError> {
    require_role(&state, &principal, MANAGERS).await?;
    let rows = user_role::crud(state.provider.as_ref(), principal.scope())
        .list()
        .await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// GET /roles/{id}
pub async fn read(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_role(&state, &principal, MANAGERS).await?;
    let row = user_role::crud(state.provider.as_ref(), principal.scope())
        .get_by_id(path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(row))
}

/// GET /roles/user/{user_id} - Assignments of one user (self or e-board)
pub async fn for_user(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let owner = path.into_inner();
    require_self_or_role(&state, &principal, owner, MANAGERS).await?;
    let rows =
        user_role::assignments_for_user(state.provider.as_ref(), principal.scope(), owner).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// POST /roles - Assign a role
pub async fn create(
    state: web::Data<AppState>,
    principal: Principal,
    body: web::Json<NewUserRole>,
) -> Result<HttpResponse, AppError> {
    let row = body.into_inner().into_row()?;
    require_role(&state, &principal, MANAGERS).await?;

    let created = user_role::crud(state.provider.as_ref(), principal.scope())
        .add(row)
        .await?;
    log::info!(
        "User {} assigned role {} to {}",
        principal.id,
        created.role,
        created.user_id
    );
    Ok(HttpResponse::Created().json(created))
}

/// PUT /roles - Edit assignment named by `id`
pub async fn update(
    state: web::Data<AppState>,
    principal: Principal,
    body: web::Json<UserRoleEdit>,
) -> Result<HttpResponse, AppError> {
    let changes = body.changes()?;
    require_role(&state, &principal, MANAGERS).await?;

    let updated = user_role::crud(state.provider.as_ref(), principal.scope())
        .edit(body.id, changes)
        .await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// DELETE /roles/{id}
pub async fn delete(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_role(&state, &principal, MANAGERS).await?;
    let id = path.into_inner();
    user_role::crud(state.provider.as_ref(), principal.scope())
        .delete(id)
        .await?;
    log::info!("User {} removed role assignment {id}", principal.id);
    Ok(HttpResponse::NoContent().finish())
}
