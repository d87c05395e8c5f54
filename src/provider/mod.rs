//! Interface to the hosted identity & data provider.
//!
//! Every domain service talks to storage through [`DataProvider`], a
//! table-scoped select/insert/update/delete surface modelled on the hosted
//! backend's REST client. Rows travel as JSON objects so the services own
//! their record shapes and the provider only owns the table catalogue.
//!
//! Each call carries a [`Scope`]: `Service` runs with the provider's own
//! credential, `Caller` activates row-level policy for one authenticated user.

pub mod memory;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

pub use memory::MemoryProvider;
pub use postgres::PgProvider;

/// One row as returned by the provider.
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Users,
    Events,
    Announcements,
    MemberInfo,
    UserRoles,
    Attendance,
    Rsvps,
}

impl Table {
    pub const ALL: [Table; 7] = [
        Table::Users,
        Table::Events,
        Table::Announcements,
        Table::MemberInfo,
        Table::UserRoles,
        Table::Attendance,
        Table::Rsvps,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Events => "events",
            Table::Announcements => "announcements",
            Table::MemberInfo => "member_info",
            Table::UserRoles => "user_roles",
            Table::Attendance => "attendance",
            Table::Rsvps => "rsvps",
        }
    }

    pub fn primary_key(self) -> &'static str {
        match self {
            Table::MemberInfo => "user_id",
            _ => "id",
        }
    }

    /// True when the primary key is a bigserial assigned by the provider.
    pub fn generates_key(self) -> bool {
        !matches!(self, Table::Users | Table::MemberInfo)
    }

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Table::Users => &["id", "email", "full_name", "profile_photo_url", "created_at"],
            Table::Events => &[
                "id",
                "name",
                "date",
                "time",
                "location",
                "description",
                "lat",
                "lon",
                "created_by",
                "created_at",
            ],
            Table::Announcements => &["id", "title", "description", "created_by", "created_at"],
            Table::MemberInfo => &[
                "user_id",
                "first_name",
                "last_name",
                "major",
                "graduation_year",
                "volunteer_hours",
                "bio",
                "linkedin_url",
                "updated_at",
            ],
            Table::UserRoles => &["id", "user_id", "role", "company_name", "created_at"],
            Table::Attendance => &["id", "user_id", "event_id", "checked_in_at"],
            Table::Rsvps => &["id", "user_id", "event_id", "created_at"],
        }
    }

    /// Column the provider stamps with the current time on insert.
    pub fn timestamp_column(self) -> Option<&'static str> {
        match self {
            Table::MemberInfo => Some("updated_at"),
            Table::Attendance => Some("checked_in_at"),
            _ => Some("created_at"),
        }
    }

    /// Unique keys beyond the primary key.
    pub fn unique_keys(self) -> &'static [&'static [&'static str]] {
        match self {
            Table::Attendance => &[&["user_id", "event_id"]],
            _ => &[],
        }
    }

    pub fn has_column(self, column: &str) -> bool {
        self.columns().contains(&column)
    }

    /// Reject rows naming columns outside the table's catalogue.
    pub fn check_columns<'a>(
        self,
        columns: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), ProviderError> {
        for column in columns {
            if !self.has_column(column) {
                return Err(ProviderError::InvalidColumn(format!(
                    "{}.{column}",
                    self.name()
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Equality filter on one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: &'static str,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }
}

/// Text form of a filter value, as compared against `column::text`.
/// `None` means SQL NULL, which never equals anything.
pub fn filter_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Claims forwarded to the provider so row-level policy applies per caller.
#[derive(Debug, Clone, PartialEq)]
pub struct CallerClaims {
    pub sub: Uuid,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scope {
    Service,
    Caller(CallerClaims),
}

impl Scope {
    pub fn caller(sub: Uuid, email: Option<String>) -> Self {
        Scope::Caller(CallerClaims { sub, email })
    }

    pub fn is_caller(&self) -> bool {
        matches!(self, Scope::Caller(_))
    }
}

#[async_trait]
pub trait DataProvider: Send + Sync {
    async fn select(
        &self,
        scope: &Scope,
        table: Table,
        filters: &[Filter],
    ) -> Result<Vec<Row>, ProviderError>;

    async fn insert(&self, scope: &Scope, table: Table, row: Row) -> Result<Row, ProviderError>;

    /// Apply `changes` to every matching row and return the updated rows.
    async fn update(
        &self,
        scope: &Scope,
        table: Table,
        filters: &[Filter],
        changes: Row,
    ) -> Result<Vec<Row>, ProviderError>;

    /// Delete every matching row, returning how many were removed.
    async fn delete(
        &self,
        scope: &Scope,
        table: Table,
        filters: &[Filter],
    ) -> Result<u64, ProviderError>;
}

#[derive(Debug)]
pub enum ProviderError {
    NotFound,
    Conflict(String),
    InvalidColumn(String),
    EmptyChanges,
    Database(String),
    Decode(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::NotFound => write!(f, "Row not found"),
            ProviderError::Conflict(e) => write!(f, "Conflict: {e}"),
            ProviderError::InvalidColumn(c) => write!(f, "Unknown column: {c}"),
            ProviderError::EmptyChanges => write!(f, "Update carries no changes"),
            ProviderError::Database(e) => write!(f, "Database error: {e}"),
            ProviderError::Decode(e) => write!(f, "Decode error: {e}"),
        }
    }
}

impl std::error::Error for ProviderError {}

pub(crate) fn into_row(value: Value) -> Result<Row, ProviderError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ProviderError::Decode(format!("expected object, got {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_text_matches_sql_text_cast() {
        assert_eq!(filter_text(&json!(5)), Some("5".to_string()));
        assert_eq!(filter_text(&json!("abc")), Some("abc".to_string()));
        assert_eq!(filter_text(&json!(true)), Some("true".to_string()));
        assert_eq!(filter_text(&Value::Null), None);
    }

    #[test]
    fn check_columns_rejects_unknown() {
        assert!(Table::Events.check_columns(["name", "lat"]).is_ok());
        let err = Table::Events.check_columns(["name", "password"]).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidColumn(c) if c == "events.password"));
    }

    #[test]
    fn every_table_lists_its_primary_key() {
        for table in Table::ALL {
            assert!(table.has_column(table.primary_key()), "{table}");
            if let Some(ts) = table.timestamp_column() {
                assert!(table.has_column(ts), "{table}.{ts}");
            }
        }
    }

    #[test]
    fn member_info_is_keyed_by_user() {
        assert_eq!(Table::MemberInfo.primary_key(), "user_id");
        assert_eq!(Table::Users.primary_key(), "id");
        assert_eq!(Table::Events.primary_key(), "id");
    }
}
