//! Frontend-side session handling, navigation guard and list search.
//! Nothing here is a security boundary.

pub mod guard;
pub mod interstitial;
pub mod search;
pub mod session;

pub use guard::{Navigation, RouteRequirement, navigate, route_requirement};
pub use interstitial::{AUTO_LOGOUT_AFTER, LogoutTrigger, UnauthorizedInterstitial};
pub use search::{fuzzy_score, fuzzy_search};
pub use session::{AuthEvent, SessionState, SessionStore, SessionWriter, session_channel};
