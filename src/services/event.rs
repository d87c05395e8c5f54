use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::geo::Coordinates;
use crate::provider::{DataProvider, Filter, Row, Scope, Table};
use crate::services::crud::{ChangeSet, Crud, Resource, check, deserialize_id};
use crate::validate::{validate_optional, validate_required};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub created_by: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Event {
    /// Stored coordinates, present only when both columns are set.
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_pair(self.lat, self.lon)
    }
}

pub struct Events;

impl Resource for Events {
    const TABLE: Table = Table::Events;
    type Record = Event;
}

pub fn crud(provider: &dyn DataProvider, scope: Scope) -> Crud<'_, Events> {
    Crud::new(provider, scope)
}

/// Both-or-neither, and in range when present.
fn check_pair(lat: Option<f64>, lon: Option<f64>) -> Result<Option<Coordinates>, AppError> {
    match (lat, lon) {
        (None, None) => Ok(None),
        (Some(lat), Some(lon)) => {
            let coords = Coordinates::new(lat, lon);
            coords.validate()?;
            Ok(Some(coords))
        }
        _ => Err(AppError::InvalidArgument(
            "lat and lon must be given together".to_string(),
        )),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    pub name: String,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub location: String,
    pub description: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl NewEvent {
    pub fn into_row(self, created_by: Uuid) -> Result<Row, AppError> {
        check(vec![
            validate_required(&self.name, "Name", 200),
            validate_required(&self.location, "Location", 300),
            validate_optional(self.time.as_deref(), "Time", 50),
            validate_optional(self.description.as_deref(), "Description", 5000),
        ])?;
        let coords = check_pair(self.lat, self.lon)?;

        Ok(ChangeSet::new()
            .text("name", Some(self.name.as_str()))
            .value("date", self.date.as_ref())
            .text("time", self.time.as_deref())
            .text("location", Some(self.location.as_str()))
            .text("description", self.description.as_deref())
            .value("lat", coords.as_ref().map(|c| &c.lat))
            .value("lon", coords.as_ref().map(|c| &c.lon))
            .value("created_by", Some(&created_by))
            .into_row())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventEdit {
    #[serde(deserialize_with = "deserialize_id")]
    pub event_id: i64,
    pub name: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl EventEdit {
    /// Present, non-empty fields only. A new location without coordinates
    /// clears the stored pair so the next check-in geocodes again.
    pub fn changes(&self) -> Result<Row, AppError> {
        check(vec![
            validate_optional(self.name.as_deref(), "Name", 200),
            validate_optional(self.location.as_deref(), "Location", 300),
            validate_optional(self.time.as_deref(), "Time", 50),
            validate_optional(self.description.as_deref(), "Description", 5000),
        ])?;
        let coords = check_pair(self.lat, self.lon)?;

        let mut changes = ChangeSet::new()
            .text("name", self.name.as_deref())
            .value("date", self.date.as_ref())
            .text("time", self.time.as_deref())
            .text("location", self.location.as_deref())
            .text("description", self.description.as_deref());
        match coords {
            Some(c) => {
                changes = changes
                    .value("lat", Some(&c.lat))
                    .value("lon", Some(&c.lon));
            }
            None if changes.contains("location") => {
                changes = changes.force("lat", Value::Null).force("lon", Value::Null);
            }
            None => {}
        }
        changes.finish()
    }
}

/// Lazy coordinate backfill.
pub async fn set_coordinates(
    provider: &dyn DataProvider,
    event_id: i64,
    coords: Coordinates,
) -> Result<(), AppError> {
    let changes = ChangeSet::new()
        .value("lat", Some(&coords.lat))
        .value("lon", Some(&coords.lon))
        .finish()?;
    let updated = provider
        .update(
            &Scope::Service,
            Table::Events,
            &[Filter::eq("id", event_id)],
            changes,
        )
        .await?;
    if updated.is_empty() {
        return Err(AppError::NotFound);
    }
    Ok(())
}
