//! Geo-validated check-in and RSVP recording.
//!
//! A check-in walks four steps and stops at the first failure:
//!
//! ```text
//! lookup event ──► resolve coordinates ──► distance ≤ radius ──► insert attendance
//!   NotFound        GeocodeFailure           TooFar               AlreadyCheckedIn /
//!                   (backfill is best-effort)                     Persistence
//! ```
//!
//! Nothing is written before the distance check passes, except the lazy
//! coordinate backfill, which later check-ins reuse instead of geocoding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::principal::Principal;
use crate::errors::AppError;
use crate::geo::{Coordinates, Geocoder, within_checkin_radius};
use crate::provider::{DataProvider, Filter, ProviderError, Scope, Table};
use crate::services::crud::{ChangeSet, Crud, Resource};
use crate::services::event::{self, Event};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendance {
    pub id: i64,
    pub user_id: Uuid,
    pub event_id: i64,
    pub checked_in_at: Option<DateTime<Utc>>,
}

pub struct AttendanceRows;

impl Resource for AttendanceRows {
    const TABLE: Table = Table::Attendance;
    type Record = Attendance;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rsvp {
    pub id: i64,
    pub user_id: Uuid,
    pub event_id: i64,
    pub created_at: Option<DateTime<Utc>>,
}

pub struct Rsvps;

impl Resource for Rsvps {
    const TABLE: Table = Table::Rsvps;
    type Record = Rsvp;
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CheckInRequest {
    pub lat: f64,
    pub lon: f64,
}

impl From<CheckInRequest> for Coordinates {
    fn from(r: CheckInRequest) -> Self {
        Coordinates::new(r.lat, r.lon)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckInReceipt {
    pub checked_in: bool,
    pub event_id: i64,
    pub distance_m: f64,
}

/// Stored coordinates, or geocode the event's location and persist them.
/// Persisting is best-effort: a failed write is logged and the resolved
/// coordinates are still used for this check-in.
pub async fn resolve_coordinates(
    provider: &dyn DataProvider,
    geocoder: &dyn Geocoder,
    event: &Event,
) -> Result<Coordinates, AppError> {
    if let Some(coords) = event.coordinates() {
        return Ok(coords);
    }

    let location = event.location.as_deref().unwrap_or_default();
    let coords = geocoder.geocode(location).await.map_err(|e| match e {
        AppError::GeocodeFailure(_) => e,
        other => AppError::GeocodeFailure(other.to_string()),
    })?;

    match event::set_coordinates(provider, event.id, coords).await {
        Ok(()) => log::info!(
            "Backfilled coordinates for event {} ({:.5}, {:.5})",
            event.id,
            coords.lat,
            coords.lon
        ),
        Err(e) => log::warn!("Could not persist coordinates for event {}: {e}", event.id),
    }
    Ok(coords)
}

pub async fn check_in(
    provider: &dyn DataProvider,
    geocoder: &dyn Geocoder,
    principal: &Principal,
    event_id: i64,
    caller: Coordinates,
) -> Result<CheckInReceipt, AppError> {
    let scope = principal.scope();

    let event = event::crud(provider, scope.clone()).get_by_id(event_id).await?;
    caller.validate()?;
    let venue = resolve_coordinates(provider, geocoder, &event).await?;

    let distance_m = caller.distance_to(&venue);
    if !within_checkin_radius(distance_m) {
        log::info!(
            "Rejected check-in of user {} to event {event_id}: {distance_m:.0} m away",
            principal.id
        );
        return Err(AppError::TooFar { distance_m });
    }

    let row = ChangeSet::new()
        .value("user_id", Some(&principal.id))
        .value("event_id", Some(&event_id))
        .into_row();
    match provider.insert(&scope, Table::Attendance, row).await {
        Ok(_) => {}
        Err(ProviderError::Conflict(_)) => return Err(AppError::AlreadyCheckedIn),
        Err(e) => return Err(AppError::Persistence(e.to_string())),
    }

    log::info!(
        "User {} checked in to event {event_id} ({distance_m:.0} m)",
        principal.id
    );
    Ok(CheckInReceipt {
        checked_in: true,
        event_id,
        distance_m,
    })
}

/// Record intent to attend. No location check and no duplicate guard.
pub async fn rsvp(
    provider: &dyn DataProvider,
    principal: &Principal,
    event_id: i64,
) -> Result<Rsvp, AppError> {
    let scope = principal.scope();
    event::crud(provider, scope.clone()).get_by_id(event_id).await?;

    let row = ChangeSet::new()
        .value("user_id", Some(&principal.id))
        .value("event_id", Some(&event_id))
        .into_row();
    let created = Crud::<Rsvps>::new(provider, scope)
        .add(row)
        .await
        .map_err(|e| match e {
            AppError::NotFound => AppError::NotFound,
            other => AppError::Persistence(other.to_string()),
        })?;

    log::info!("User {} RSVP'd to event {event_id}", principal.id);
    Ok(created)
}

pub async fn attendance_for_event(
    provider: &dyn DataProvider,
    scope: Scope,
    event_id: i64,
) -> Result<Vec<Attendance>, AppError> {
    Crud::<AttendanceRows>::new(provider, scope)
        .find(&[Filter::eq("event_id", event_id)])
        .await
}
