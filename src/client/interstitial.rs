use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::client::session::SessionWriter;

/// Countdown shown on the unauthorized screen before signing out.
pub const AUTO_LOGOUT_AFTER: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutTrigger {
    Countdown,
    Manual,
}

/// The unauthorized screen. The deadline is fixed when the screen is
/// entered; re-rendering reads it but never moves it.
#[derive(Debug, Clone, Copy)]
pub struct UnauthorizedInterstitial {
    entered_at: Instant,
}

impl UnauthorizedInterstitial {
    pub fn enter() -> Self {
        Self::entered_at(Instant::now())
    }

    pub fn entered_at(entered_at: Instant) -> Self {
        Self { entered_at }
    }

    pub fn deadline(&self) -> Instant {
        self.entered_at + AUTO_LOGOUT_AFTER
    }

    pub fn remaining(&self) -> Duration {
        self.deadline().saturating_duration_since(Instant::now())
    }

    /// Whole seconds left, rounded up, for the countdown label.
    pub fn remaining_secs(&self) -> u64 {
        let left = self.remaining();
        left.as_secs() + u64::from(left.subsec_nanos() > 0)
    }

    /// Sign out at the deadline, or earlier if `manual` resolves first
    /// (the logout button). Signs out exactly once.
    pub async fn run_auto_logout(
        &self,
        writer: &SessionWriter,
        manual: impl Future<Output = ()>,
    ) -> LogoutTrigger {
        let trigger = tokio::select! {
            () = tokio::time::sleep_until(self.deadline()) => LogoutTrigger::Countdown,
            () = manual => LogoutTrigger::Manual,
        };
        log::info!("Signing out from unauthorized screen ({trigger:?})");
        writer.sign_out();
        trigger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::session::{AuthEvent, session_channel};

    fn signed_in_writer() -> (SessionWriter, crate::client::session::SessionStore) {
        let (writer, store) = session_channel();
        writer.apply(AuthEvent::SignedIn {
            token: "tok".to_string(),
            user_id: uuid::Uuid::new_v4(),
            roles: Vec::new(),
        });
        (writer, store)
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_is_fixed_at_entry() {
        let screen = UnauthorizedInterstitial::enter();
        assert_eq!(screen.remaining_secs(), 10);

        tokio::time::advance(Duration::from_millis(3500)).await;
        // A re-render reads the same screen value.
        let rerendered = screen;
        assert_eq!(rerendered.remaining_secs(), 7);

        tokio::time::advance(Duration::from_secs(7)).await;
        assert_eq!(screen.remaining_secs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn signs_out_at_ten_seconds() {
        let (writer, store) = signed_in_writer();
        let screen = UnauthorizedInterstitial::enter();
        let started = Instant::now();

        let trigger = screen
            .run_auto_logout(&writer, std::future::pending())
            .await;
        assert_eq!(trigger, LogoutTrigger::Countdown);
        assert_eq!(started.elapsed(), AUTO_LOGOUT_AFTER);
        assert!(!store.snapshot().is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn late_start_still_counts_from_entry() {
        let (writer, store) = signed_in_writer();
        let screen = UnauthorizedInterstitial::enter();
        tokio::time::advance(Duration::from_secs(4)).await;

        let resumed = Instant::now();
        screen
            .run_auto_logout(&writer, std::future::pending())
            .await;
        assert_eq!(resumed.elapsed(), Duration::from_secs(6));
        assert!(!store.snapshot().is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn manual_logout_wins() {
        let (writer, store) = signed_in_writer();
        let screen = UnauthorizedInterstitial::enter();
        let started = Instant::now();

        let trigger = screen
            .run_auto_logout(&writer, tokio::time::sleep(Duration::from_secs(2)))
            .await;
        assert_eq!(trigger, LogoutTrigger::Manual);
        assert_eq!(started.elapsed(), Duration::from_secs(2));
        assert!(!store.snapshot().is_authenticated());
    }
}
