//! Per-attempt cancellation composition.
//!
//! Each dispatch attempt arms a [`CancelScope`] combining the caller's
//! [`CancelToken`] and the attempt timeout into a single abort signal with
//! an explicit state machine: `Armed -> Aborted(reason) | Completed`. The
//! recorded reason is the sole source of truth for classifying the failure,
//! so a user cancellation is never misreported as a timeout.

use std::sync::Mutex;
use std::time::Duration;

use courier_core::{CancelToken, Error};

/// Why an attempt was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The attempt timeout elapsed first.
    Timeout,
    /// The caller's cancellation token fired first.
    User,
}

impl AbortReason {
    /// Maps the recorded reason to the corresponding error.
    #[must_use]
    pub fn into_error(self) -> Error {
        match self {
            Self::Timeout => Error::timed_out(),
            Self::User => Error::canceled(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Armed,
    Aborted(AbortReason),
    Completed,
}

/// The composed cancellation signal for one dispatch attempt.
///
/// No timer exists when the timeout is disabled; when one abort source
/// fires, the other is dropped with the [`CancelScope::aborted`] future.
/// [`CancelScope::complete`] (also run on drop) settles the state machine
/// unconditionally so no timer or subscription outlives the attempt.
#[derive(Debug)]
pub struct CancelScope {
    token: Option<CancelToken>,
    timeout: Option<Duration>,
    state: Mutex<State>,
}

impl CancelScope {
    /// Arms a scope for one attempt. A zero timeout counts as disabled.
    #[must_use]
    pub fn arm(timeout: Option<Duration>, token: Option<CancelToken>) -> Self {
        Self {
            token,
            timeout: timeout.filter(|t| !t.is_zero()),
            state: Mutex::new(State::Armed),
        }
    }

    /// Checks for an abort that predates the attempt: a token cancelled
    /// before dispatch fails fast without touching the network.
    pub fn pre_aborted(&self) -> Option<AbortReason> {
        if self.token.as_ref().is_some_and(CancelToken::is_cancelled) {
            self.record(AbortReason::User);
            return Some(AbortReason::User);
        }
        None
    }

    /// Resolves when either abort source fires, recording the winner.
    ///
    /// Pends forever when neither a token nor a timeout is wired. On a
    /// simultaneous firing the user cancellation wins.
    pub async fn aborted(&self) -> AbortReason {
        let reason = match (&self.token, self.timeout) {
            (None, None) => std::future::pending().await,
            (Some(token), None) => {
                token.cancelled().await;
                AbortReason::User
            }
            (None, Some(timeout)) => {
                tokio::time::sleep(timeout).await;
                AbortReason::Timeout
            }
            (Some(token), Some(timeout)) => {
                tokio::select! {
                    biased;
                    () = token.cancelled() => AbortReason::User,
                    () = tokio::time::sleep(timeout) => AbortReason::Timeout,
                }
            }
        };
        self.record(reason);
        reason
    }

    /// Settles the scope after the attempt finished. Idempotent; a scope
    /// that already aborted keeps its recorded reason.
    pub fn complete(&self) {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if *state == State::Armed {
            *state = State::Completed;
        }
    }

    /// The recorded abort reason, if the scope aborted.
    pub fn reason(&self) -> Option<AbortReason> {
        let state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match *state {
            State::Aborted(reason) => Some(reason),
            State::Armed | State::Completed => None,
        }
    }

    /// Whether a timeout timer will be created for this attempt.
    #[must_use]
    pub const fn has_timer(&self) -> bool {
        self.timeout.is_some()
    }

    /// Whether any abort source is wired at all.
    #[must_use]
    pub const fn is_wired(&self) -> bool {
        self.token.is_some() || self.timeout.is_some()
    }

    fn record(&self, reason: AbortReason) {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if *state == State::Armed {
            *state = State::Aborted(reason);
        }
    }
}

impl Drop for CancelScope {
    fn drop(&mut self) {
        self.complete();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_sources_arm_no_timer() {
        let scope = CancelScope::arm(None, None);
        assert!(!scope.has_timer());
        assert!(!scope.is_wired());

        let scope = CancelScope::arm(Some(Duration::ZERO), None);
        assert!(!scope.has_timer());
        assert!(!scope.is_wired());
    }

    #[test]
    fn pre_aborted_reports_user_cancellation() {
        let token = CancelToken::new();
        token.cancel();
        let scope = CancelScope::arm(Some(Duration::from_secs(5)), Some(token));
        assert_eq!(scope.pre_aborted(), Some(AbortReason::User));
        assert_eq!(scope.reason(), Some(AbortReason::User));
    }

    #[test]
    fn complete_keeps_recorded_abort_reason() {
        let token = CancelToken::new();
        token.cancel();
        let scope = CancelScope::arm(None, Some(token));
        scope.pre_aborted();
        scope.complete();
        assert_eq!(scope.reason(), Some(AbortReason::User));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_wins_when_token_is_silent() {
        let scope = CancelScope::arm(Some(Duration::from_millis(50)), Some(CancelToken::new()));
        assert_eq!(scope.aborted().await, AbortReason::Timeout);
        assert_eq!(scope.reason(), Some(AbortReason::Timeout));
    }

    #[tokio::test(start_paused = true)]
    async fn user_cancellation_beats_a_longer_timeout() {
        let token = CancelToken::new();
        let scope = CancelScope::arm(Some(Duration::from_secs(60)), Some(token.clone()));

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });

        assert_eq!(scope.aborted().await, AbortReason::User);
        assert_eq!(scope.reason(), Some(AbortReason::User));
    }

    #[tokio::test(start_paused = true)]
    async fn completed_scope_records_no_reason() {
        let scope = CancelScope::arm(Some(Duration::from_secs(1)), None);
        scope.complete();
        assert_eq!(scope.reason(), None);
    }
}
