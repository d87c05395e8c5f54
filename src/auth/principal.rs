use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::provider::Scope;

/// Role without its payload; used for allow-lists and path policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleKind {
    #[serde(rename = "student")]
    Student,
    #[serde(rename = "general-member")]
    GeneralMember,
    #[serde(rename = "e-board")]
    EBoard,
    #[serde(rename = "sponsor")]
    Sponsor,
}

impl RoleKind {
    pub const ALL: [RoleKind; 4] = [
        RoleKind::Student,
        RoleKind::GeneralMember,
        RoleKind::EBoard,
        RoleKind::Sponsor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RoleKind::Student => "student",
            RoleKind::GeneralMember => "general-member",
            RoleKind::EBoard => "e-board",
            RoleKind::Sponsor => "sponsor",
        }
    }

    pub fn parse(name: &str) -> Option<RoleKind> {
        RoleKind::ALL
            .into_iter()
            .find(|k| k.as_str() == name.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Student,
    GeneralMember,
    EBoard,
    Sponsor { company: String },
}

impl Role {
    /// Build a role from a stored name and optional company.
    /// Unrecognised names yield `None`.
    pub fn from_parts(name: &str, company: Option<&str>) -> Option<Role> {
        Some(match RoleKind::parse(name)? {
            RoleKind::Student => Role::Student,
            RoleKind::GeneralMember => Role::GeneralMember,
            RoleKind::EBoard => Role::EBoard,
            RoleKind::Sponsor => Role::Sponsor {
                company: company.unwrap_or_default().trim().to_string(),
            },
        })
    }

    pub fn kind(&self) -> RoleKind {
        match self {
            Role::Student => RoleKind::Student,
            Role::GeneralMember => RoleKind::GeneralMember,
            Role::EBoard => RoleKind::EBoard,
            Role::Sponsor { .. } => RoleKind::Sponsor,
        }
    }

    /// Decode the `role` claim: a flat name, or an object carrying the
    /// sponsor's company.
    pub fn from_claim(claim: &Value) -> Option<Role> {
        match claim {
            Value::String(name) => Role::from_parts(name, None),
            Value::Object(map) => {
                let name = map.get("role").and_then(Value::as_str)?;
                let company = map.get("company_name").and_then(Value::as_str);
                Role::from_parts(name, company)
            }
            _ => None,
        }
    }

    pub fn to_claim(&self) -> Value {
        match self {
            Role::Sponsor { company } => json!({
                "role": RoleKind::Sponsor.as_str(),
                "company_name": company,
            }),
            other => Value::from(other.kind().as_str()),
        }
    }
}

/// Authenticated identity attached to one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    pub id: Uuid,
    pub email: Option<String>,
    /// Roles carried by the token. Informational; authorization reads
    /// stored role rows.
    pub roles: Vec<Role>,
}

impl Principal {
    /// Provider scope that applies row-level policy for this caller.
    pub fn scope(&self) -> Scope {
        Scope::caller(self.id, self.email.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names_round_trip_through_kind() {
        for kind in RoleKind::ALL {
            assert_eq!(RoleKind::parse(kind.as_str()), Some(kind));
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, Value::from(kind.as_str()));
        }
        assert_eq!(RoleKind::parse("admin"), None);
        assert_eq!(RoleKind::parse(""), None);
    }

    #[test]
    fn flat_claim_decodes() {
        assert_eq!(Role::from_claim(&json!("e-board")), Some(Role::EBoard));
        assert_eq!(Role::from_claim(&json!("authenticated")), None);
        assert_eq!(Role::from_claim(&json!(42)), None);
    }

    #[test]
    fn sponsor_claim_carries_company() {
        let claim = json!({"role": "sponsor", "company_name": "Acme"});
        let role = Role::from_claim(&claim).unwrap();
        assert_eq!(
            role,
            Role::Sponsor {
                company: "Acme".to_string()
            }
        );
        assert_eq!(role.to_claim(), claim);
    }

    #[test]
    fn flat_sponsor_claim_has_empty_company() {
        assert_eq!(
            Role::from_claim(&json!("sponsor")),
            Some(Role::Sponsor {
                company: String::new()
            })
        );
    }
}
