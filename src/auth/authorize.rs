//! Allow-list authorization against stored role assignments.
//!
//! The role claim inside a token is informational only. Every gated handler
//! re-reads the caller's `user_roles` rows with the service credential and
//! permits the request when any assigned role is in the handler's allow-list.
//! A caller with no rows, or only unrecognised ones, is denied everywhere.

use uuid::Uuid;

use crate::auth::principal::{Principal, Role, RoleKind};
use crate::errors::AppError;
use crate::services::user_role;
use crate::state::AppState;

/// True if any of `roles` is in `allowed`.
pub fn permits(roles: &[Role], allowed: &[RoleKind]) -> bool {
    roles.iter().any(|r| allowed.contains(&r.kind()))
}

/// Check the principal's stored roles against `allowed`.
/// Returns the stored roles on success, `Forbidden` otherwise.
pub async fn require_role(
    state: &AppState,
    principal: &Principal,
    allowed: &[RoleKind],
) -> Result<Vec<Role>, AppError> {
    let roles = user_role::roles_for_user(state.provider.as_ref(), principal.id).await?;
    if permits(&roles, allowed) {
        Ok(roles)
    } else {
        log::info!(
            "Denied user {} (roles {:?}), requires one of {:?}",
            principal.id,
            roles.iter().map(Role::kind).collect::<Vec<_>>(),
            allowed
        );
        Err(AppError::Forbidden)
    }
}

/// Owner bypass, then the allow-list.
///
/// The caller may always act on their own record (`owner == principal.id`)
/// without a role lookup; anyone else needs one of `allowed`.
pub async fn require_self_or_role(
    state: &AppState,
    principal: &Principal,
    owner: Uuid,
    allowed: &[RoleKind],
) -> Result<(), AppError> {
    if owner == principal.id {
        return Ok(());
    }
    require_role(state, principal, allowed).await.map(|_| ())
}
