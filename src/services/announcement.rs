use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::provider::{DataProvider, Row, Scope, Table};
use crate::services::crud::{ChangeSet, Crud, Resource, check, deserialize_id};
use crate::validate::{validate_optional, validate_required};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
}

pub struct Announcements;

impl Resource for Announcements {
    const TABLE: Table = Table::Announcements;
    type Record = Announcement;
}

pub fn crud(provider: &dyn DataProvider, scope: Scope) -> Crud<'_, Announcements> {
    Crud::new(provider, scope)
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAnnouncement {
    pub title: String,
    pub description: Option<String>,
}

impl NewAnnouncement {
    pub fn into_row(self, created_by: Uuid) -> Result<Row, AppError> {
        check(vec![
            validate_required(&self.title, "Title", 200),
            validate_optional(self.description.as_deref(), "Description", 10_000),
        ])?;
        Ok(ChangeSet::new()
            .text("title", Some(self.title.as_str()))
            .text("description", self.description.as_deref())
            .value("created_by", Some(&created_by))
            .into_row())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnnouncementEdit {
    #[serde(deserialize_with = "deserialize_id")]
    pub announcement_id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl AnnouncementEdit {
    pub fn changes(&self) -> Result<Row, AppError> {
        check(vec![
            validate_optional(self.title.as_deref(), "Title", 200),
            validate_optional(self.description.as_deref(), "Description", 10_000),
        ])?;
        ChangeSet::new()
            .text("title", self.title.as_deref())
            .text("description", self.description.as_deref())
            .finish()
    }
}
