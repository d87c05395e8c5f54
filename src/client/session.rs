use serde::Deserialize;
use tokio::sync::watch;
use uuid::Uuid;

use crate::auth::principal::{Role, RoleKind};

/// What the frontend knows about the signed-in user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub token: Option<String>,
    pub user_id: Option<Uuid>,
    pub roles: Vec<Role>,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// A user may hold several roles; any one of them counts.
    pub fn has_role(&self, kind: RoleKind) -> bool {
        self.roles.iter().any(|r| r.kind() == kind)
    }
}

/// Changes reported by the auth layer. The only way session state moves.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    SignedIn {
        token: String,
        user_id: Uuid,
        roles: Vec<Role>,
    },
    RolesLoaded(Vec<Role>),
    SignedOut,
}

/// Token hand-off in the `/auth/callback` URL fragment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CallbackFragment {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

pub fn parse_callback_fragment(fragment: &str) -> Option<CallbackFragment> {
    let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
    serde_urlencoded::from_str::<CallbackFragment>(fragment)
        .ok()
        .filter(|f| f.token_type.eq_ignore_ascii_case("bearer") && !f.access_token.is_empty())
}

/// Sole writer of the session. Not `Clone`: exactly one auth-state-change
/// handler owns it.
pub struct SessionWriter {
    tx: watch::Sender<SessionState>,
}

/// Read-only view of the session for everything else.
#[derive(Clone)]
pub struct SessionStore {
    rx: watch::Receiver<SessionState>,
}

pub fn session_channel() -> (SessionWriter, SessionStore) {
    let (tx, rx) = watch::channel(SessionState::default());
    (SessionWriter { tx }, SessionStore { rx })
}

impl SessionWriter {
    pub fn apply(&self, event: AuthEvent) {
        self.tx.send_modify(|state| match event {
            AuthEvent::SignedIn {
                token,
                user_id,
                roles,
            } => {
                *state = SessionState {
                    token: Some(token),
                    user_id: Some(user_id),
                    roles,
                }
            }
            AuthEvent::RolesLoaded(roles) => {
                if state.is_authenticated() {
                    state.roles = roles;
                }
            }
            AuthEvent::SignedOut => *state = SessionState::default(),
        });
    }

    pub fn sign_out(&self) {
        self.apply(AuthEvent::SignedOut);
    }
}

impl SessionStore {
    pub fn snapshot(&self) -> SessionState {
        self.rx.borrow().clone()
    }

    /// Wait for the next change. `false` once the writer is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}
