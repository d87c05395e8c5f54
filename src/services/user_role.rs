use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::principal::{Role, RoleKind};
use crate::errors::AppError;
use crate::provider::{DataProvider, Filter, Row, Scope, Table};
use crate::services::crud::{ChangeSet, Crud, Resource, check, deserialize_id};
use crate::validate::validate_optional;

/// One role assignment. A user may hold several.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRole {
    pub id: i64,
    pub user_id: Uuid,
    pub role: String,
    pub company_name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl UserRole {
    /// `None` for names the application does not recognise.
    pub fn to_role(&self) -> Option<Role> {
        Role::from_parts(&self.role, self.company_name.as_deref())
    }
}

pub struct UserRoles;

impl Resource for UserRoles {
    const TABLE: Table = Table::UserRoles;
    type Record = UserRole;
}

pub fn crud(provider: &dyn DataProvider, scope: Scope) -> Crud<'_, UserRoles> {
    Crud::new(provider, scope)
}

/// Recognised roles assigned to `user_id`, read with the service credential.
pub async fn roles_for_user(
    provider: &dyn DataProvider,
    user_id: Uuid,
) -> Result<Vec<Role>, AppError> {
    let rows = assignments_for_user(provider, Scope::Service, user_id).await?;
    Ok(rows.iter().filter_map(UserRole::to_role).collect())
}

pub async fn assignments_for_user(
    provider: &dyn DataProvider,
    scope: Scope,
    user_id: Uuid,
) -> Result<Vec<UserRole>, AppError> {
    crud(provider, scope)
        .find(&[Filter::eq("user_id", user_id.to_string())])
        .await
}

fn check_company(role: RoleKind, company: Option<&str>) -> Option<String> {
    let company = company.map(str::trim).unwrap_or_default();
    match role {
        RoleKind::Sponsor if company.is_empty() => {
            Some("Company name is required for sponsors".to_string())
        }
        RoleKind::Sponsor => validate_optional(Some(company), "Company name", 200),
        _ if !company.is_empty() => Some("Only sponsors carry a company name".to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUserRole {
    pub user_id: Uuid,
    pub role: RoleKind,
    pub company_name: Option<String>,
}

impl NewUserRole {
    pub fn into_row(self) -> Result<Row, AppError> {
        check(vec![check_company(self.role, self.company_name.as_deref())])?;
        Ok(ChangeSet::new()
            .value("user_id", Some(&self.user_id))
            .text("role", Some(self.role.as_str()))
            .text("company_name", self.company_name.as_deref())
            .into_row())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserRoleEdit {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: i64,
    pub role: Option<RoleKind>,
    pub company_name: Option<String>,
}

impl UserRoleEdit {
    /// A role change away from sponsor also clears the company name.
    pub fn changes(&self) -> Result<Row, AppError> {
        let mut changes = ChangeSet::new()
            .text("role", self.role.map(RoleKind::as_str))
            .text("company_name", self.company_name.as_deref());
        if let Some(kind) = self.role {
            check(vec![check_company(kind, self.company_name.as_deref())])?;
            if kind != RoleKind::Sponsor {
                changes = changes.force("company_name", serde_json::Value::Null);
            }
        }
        changes.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sponsor_needs_company() {
        let new = NewUserRole {
            user_id: Uuid::new_v4(),
            role: RoleKind::Sponsor,
            company_name: None,
        };
        assert!(new.into_row().is_err());
    }

    #[test]
    fn members_cannot_carry_company() {
        let new = NewUserRole {
            user_id: Uuid::new_v4(),
            role: RoleKind::GeneralMember,
            company_name: Some("Acme".to_string()),
        };
        assert!(new.into_row().is_err());
    }

    #[test]
    fn role_names_deserialize_from_wire_form() {
        let new: NewUserRole = serde_json::from_value(json!({
            "user_id": Uuid::new_v4(), "role": "e-board"
        }))
        .unwrap();
        assert_eq!(new.role, RoleKind::EBoard);
        assert_eq!(new.into_row().unwrap()["role"], json!("e-board"));
    }

    #[test]
    fn demotion_from_sponsor_clears_company() {
        let edit: UserRoleEdit =
            serde_json::from_value(json!({"id": "4", "role": "general-member"})).unwrap();
        let row = edit.changes().unwrap();
        assert_eq!(row["role"], json!("general-member"));
        assert_eq!(row["company_name"], serde_json::Value::Null);
    }

    #[test]
    fn unknown_stored_role_is_ignored() {
        let row = UserRole {
            id: 1,
            user_id: Uuid::new_v4(),
            role: "admin".to_string(),
            company_name: None,
            created_at: None,
        };
        assert_eq!(row.to_role(), None);
    }

    #[test]
    fn empty_edit_is_invalid() {
        let edit: UserRoleEdit = serde_json::from_value(json!({"id": 4})).unwrap();
        assert!(matches!(edit.changes(), Err(AppError::InvalidArgument(_))));
    }
}
