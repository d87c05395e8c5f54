//! Navigation policy for the frontend.
//!
//! Advisory only: it decides what to render, while the HTTP handlers check
//! stored roles on every request.

use crate::auth::principal::RoleKind;
use crate::client::session::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteRequirement {
    Public,
    /// Signed in with any recognised role.
    SignedIn,
    Role(RoleKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Allow,
    RedirectToLogin,
    Unauthorized,
}

pub const LOGIN_PATH: &str = "/login";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

const PUBLIC_PATHS: &[&str] = &["/", LOGIN_PATH, "/auth/callback", UNAUTHORIZED_PATH];

const ROLE_PREFIXES: &[(&str, RoleKind)] = &[
    ("/admin", RoleKind::EBoard),
    ("/sponsor", RoleKind::Sponsor),
    ("/member", RoleKind::GeneralMember),
];

pub fn route_requirement(path: &str) -> RouteRequirement {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    if PUBLIC_PATHS.contains(&path) {
        return RouteRequirement::Public;
    }
    ROLE_PREFIXES
        .iter()
        .find(|(prefix, _)| under_prefix(path, prefix))
        .map_or(RouteRequirement::SignedIn, |&(_, kind)| {
            RouteRequirement::Role(kind)
        })
}

/// `path` is `prefix` itself or lies below it on a segment boundary.
fn under_prefix(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

pub fn navigate(session: &SessionState, path: &str) -> Navigation {
    let requirement = route_requirement(path);
    if requirement == RouteRequirement::Public {
        return Navigation::Allow;
    }
    if !session.is_authenticated() {
        return Navigation::RedirectToLogin;
    }
    if session.roles.is_empty() {
        return Navigation::Unauthorized;
    }
    match requirement {
        RouteRequirement::Role(kind) if !session.has_role(kind) => Navigation::Unauthorized,
        _ => Navigation::Allow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::principal::Role;

    fn signed_in(roles: Vec<Role>) -> SessionState {
        SessionState {
            token: Some("tok".to_string()),
            user_id: Some(uuid::Uuid::new_v4()),
            roles,
        }
    }

    #[test]
    fn prefixes_map_to_roles() {
        assert_eq!(route_requirement("/admin"), RouteRequirement::Role(RoleKind::EBoard));
        assert_eq!(
            route_requirement("/admin/events?page=2"),
            RouteRequirement::Role(RoleKind::EBoard)
        );
        assert_eq!(
            route_requirement("/sponsor/directory"),
            RouteRequirement::Role(RoleKind::Sponsor)
        );
        assert_eq!(
            route_requirement("/member/profile"),
            RouteRequirement::Role(RoleKind::GeneralMember)
        );
        assert_eq!(route_requirement("/events"), RouteRequirement::SignedIn);
        assert_eq!(route_requirement("/login"), RouteRequirement::Public);
        assert_eq!(route_requirement("/auth/callback#access_token=x"), RouteRequirement::Public);
    }

    #[test]
    fn prefixes_match_whole_segments() {
        assert_eq!(route_requirement("/admin/"), RouteRequirement::Role(RoleKind::EBoard));
        assert_eq!(route_requirement("/administrivia"), RouteRequirement::SignedIn);
        assert_eq!(route_requirement("/members-directory"), RouteRequirement::SignedIn);
        assert_eq!(route_requirement("/sponsorships"), RouteRequirement::SignedIn);
    }

    #[test]
    fn anonymous_users_go_to_login() {
        let anon = SessionState::default();
        assert_eq!(navigate(&anon, "/admin"), Navigation::RedirectToLogin);
        assert_eq!(navigate(&anon, "/events"), Navigation::RedirectToLogin);
        assert_eq!(navigate(&anon, "/login"), Navigation::Allow);
    }

    #[test]
    fn missing_role_is_unauthorized() {
        let session = signed_in(Vec::new());
        assert_eq!(navigate(&session, "/admin"), Navigation::Unauthorized);
        assert_eq!(navigate(&session, "/events"), Navigation::Unauthorized);
        assert_eq!(navigate(&session, UNAUTHORIZED_PATH), Navigation::Allow);
    }

    #[test]
    fn role_must_match_prefix() {
        let eboard = signed_in(vec![Role::EBoard]);
        assert_eq!(navigate(&eboard, "/admin/roles"), Navigation::Allow);
        assert_eq!(navigate(&eboard, "/sponsor"), Navigation::Unauthorized);

        let sponsor = signed_in(vec![Role::Sponsor {
            company: "Acme".to_string(),
        }]);
        assert_eq!(navigate(&sponsor, "/sponsor/members"), Navigation::Allow);
        assert_eq!(navigate(&sponsor, "/admin"), Navigation::Unauthorized);
        assert_eq!(navigate(&sponsor, "/events"), Navigation::Allow);
    }

    #[test]
    fn any_held_role_unlocks_its_prefix() {
        let officer = signed_in(vec![Role::GeneralMember, Role::EBoard]);
        assert_eq!(navigate(&officer, "/admin/events"), Navigation::Allow);
        assert_eq!(navigate(&officer, "/member/profile"), Navigation::Allow);
        assert_eq!(navigate(&officer, "/sponsor"), Navigation::Unauthorized);
    }
}
