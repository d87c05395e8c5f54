use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::provider::{DataProvider, Row, Scope, Table};
use crate::services::crud::{ChangeSet, Crud, Resource, check};
use crate::validate::{validate_optional, validate_range, validate_required, validate_url};

const MIN_YEAR: i32 = 1950;
const MAX_YEAR: i32 = 2100;

/// Chapter profile of one member, keyed by user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberInfo {
    pub user_id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub major: Option<String>,
    pub graduation_year: Option<i32>,
    pub volunteer_hours: Option<f64>,
    pub bio: Option<String>,
    pub linkedin_url: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

pub struct Members;

impl Resource for Members {
    const TABLE: Table = Table::MemberInfo;
    type Record = MemberInfo;
}

pub fn crud(provider: &dyn DataProvider, scope: Scope) -> Crud<'_, Members> {
    Crud::new(provider, scope)
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMemberInfo {
    /// Defaults to the caller.
    pub user_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub major: Option<String>,
    pub graduation_year: Option<i32>,
    pub volunteer_hours: Option<f64>,
    pub bio: Option<String>,
    pub linkedin_url: Option<String>,
}

impl NewMemberInfo {
    pub fn owner(&self, caller: Uuid) -> Uuid {
        self.user_id.unwrap_or(caller)
    }

    pub fn into_row(self, owner: Uuid) -> Result<Row, AppError> {
        check(vec![
            validate_required(&self.first_name, "First name", 100),
            validate_required(&self.last_name, "Last name", 100),
            validate_optional(self.major.as_deref(), "Major", 200),
            validate_optional(self.bio.as_deref(), "Bio", 2000),
            validate_url(self.linkedin_url.as_deref(), "LinkedIn URL"),
            validate_range(self.graduation_year, "Graduation year", MIN_YEAR, MAX_YEAR),
            validate_range(self.volunteer_hours, "Volunteer hours", 0.0, 10_000.0),
        ])?;
        Ok(ChangeSet::new()
            .value("user_id", Some(&owner))
            .text("first_name", Some(self.first_name.as_str()))
            .text("last_name", Some(self.last_name.as_str()))
            .text("major", self.major.as_deref())
            .value("graduation_year", self.graduation_year.as_ref())
            .value("volunteer_hours", self.volunteer_hours.as_ref())
            .text("bio", self.bio.as_deref())
            .text("linkedin_url", self.linkedin_url.as_deref())
            .into_row())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemberInfoEdit {
    pub user_id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub major: Option<String>,
    pub graduation_year: Option<i32>,
    pub volunteer_hours: Option<f64>,
    pub bio: Option<String>,
    pub linkedin_url: Option<String>,
}

impl MemberInfoEdit {
    pub fn changes(&self) -> Result<Row, AppError> {
        check(vec![
            validate_optional(self.first_name.as_deref(), "First name", 100),
            validate_optional(self.last_name.as_deref(), "Last name", 100),
            validate_optional(self.major.as_deref(), "Major", 200),
            validate_optional(self.bio.as_deref(), "Bio", 2000),
            validate_url(self.linkedin_url.as_deref(), "LinkedIn URL"),
            validate_range(self.graduation_year, "Graduation year", MIN_YEAR, MAX_YEAR),
            validate_range(self.volunteer_hours, "Volunteer hours", 0.0, 10_000.0),
        ])?;
        let stamp = chrono::Utc::now();
        let changes = ChangeSet::new()
            .text("first_name", self.first_name.as_deref())
            .text("last_name", self.last_name.as_deref())
            .text("major", self.major.as_deref())
            .value("graduation_year", self.graduation_year.as_ref())
            .value("volunteer_hours", self.volunteer_hours.as_ref())
            .text("bio", self.bio.as_deref())
            .text("linkedin_url", self.linkedin_url.as_deref());
        if changes.is_empty() {
            return changes.finish();
        }
        changes.value("updated_at", Some(&stamp)).finish()
    }
}
