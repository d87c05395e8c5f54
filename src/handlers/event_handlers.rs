use actix_web::{HttpResponse, web};

use crate::auth::authorize::require_role;
use crate::auth::principal::{Principal, RoleKind};
use crate::errors::AppError;
use crate::services::attendance::{self, CheckInRequest};
use crate::services::event::{self, EventEdit, NewEvent};
use crate::state::AppState;

/// GET /events - List events
pub async fn list(
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<HttpResponse, AppError> {
    let events = event::crud(state.provider.as_ref(), principal.scope())
        .list()
        .await?;
    Ok(HttpResponse::Ok().json(events))
}

/// GET /events/{id} - Get single event
pub async fn read(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let found = event::crud(state.provider.as_ref(), principal.scope())
        .get_by_id(path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(found))
}

/// POST /events - Create event (e-board)
pub async fn create(
    state: web::Data<AppState>,
    principal: Principal,
    body: web::Json<NewEvent>,
) -> Result<HttpResponse, AppError> {
    let row = body.into_inner().into_row(principal.id)?;
    require_role(&state, &principal, &[RoleKind::EBoard]).await?;

    let created = event::crud(state.provider.as_ref(), principal.scope())
        .add(row)
        .await?;
    log::info!("User {} created event {}", principal.id, created.id);
    Ok(HttpResponse::Created().json(created))
}

/// PUT /events - Edit event named by `event_id` (e-board)
pub async fn update(
    state: web::Data<AppState>,
    principal: Principal,
    body: web::Json<EventEdit>,
) -> Result<HttpResponse, AppError> {
    let changes = body.changes()?;
    require_role(&state, &principal, &[RoleKind::EBoard]).await?;

    let updated = event::crud(state.provider.as_ref(), principal.scope())
        .edit(body.event_id, changes)
        .await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// DELETE /events/{id} - Delete event (e-board)
pub async fn delete(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_role(&state, &principal, &[RoleKind::EBoard]).await?;
    let id = path.into_inner();
    event::crud(state.provider.as_ref(), principal.scope())
        .delete(id)
        .await?;
    log::info!("User {} deleted event {id}", principal.id);
    Ok(HttpResponse::NoContent().finish())
}

/// POST /events/checkin/{id} - Check in from the caller's current position
pub async fn check_in(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
    body: web::Json<CheckInRequest>,
) -> Result<HttpResponse, AppError> {
    let receipt = attendance::check_in(
        state.provider.as_ref(),
        state.geocoder.as_ref(),
        &principal,
        path.into_inner(),
        body.into_inner().into(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(receipt))
}

/// POST /events/rsvp/{id} - Record intent to attend
pub async fn rsvp(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let created = attendance::rsvp(state.provider.as_ref(), &principal, path.into_inner()).await?;
    Ok(HttpResponse::Created().json(created))
}

/// GET /events/{id}/attendance - Who checked in (e-board)
pub async fn attendance(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_role(&state, &principal, &[RoleKind::EBoard]).await?;
    let rows = attendance::attendance_for_event(
        state.provider.as_ref(),
        principal.scope(),
        path.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(rows))
}
