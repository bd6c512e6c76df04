//! The lock/unlock state machine.

use crate::constants::{
    BIOMETRICS_KEY, DEFAULT_PROMPT_DELAY_MS, DEFAULT_REAUTH_AFTER_SECS, FLAG_TRUE, PASSCODE_KEY,
    PASSCODE_LENGTH, REDACTED_PLACEHOLDER,
};
use crate::errors::{AppResult, AuthError};
use crate::kv::KeyValueStore;
use crate::session::biometrics::{BiometricOutcome, BiometricPrompt, Biometrics};
use crate::session::clock::{Clock, SystemClock};
use crate::session::timer::ReauthTimer;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// Whether the user may currently see journal content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Locked,
    Authenticating,
    Unlocked,
}

/// Host application lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppPhase {
    Active,
    /// Transient focus loss, such as a system overlay.
    Inactive,
    Background,
}

/// What a lifecycle event did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    /// The session was unlocked and has been locked for backgrounding.
    Locked,
    /// A short background; the session is unlocked again.
    Resumed,
    /// A long background; a re-auth check is armed.
    ReauthRequired,
    /// An authentication attempt is in flight.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Mismatch,
    InvalidFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasscodeOutcome {
    /// No passcode existed; this one was stored and unlocked the session.
    Created,
    Accepted,
    Rejected(RejectReason),
}

/// Timing knobs for re-authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    /// Longest background stay that does not require re-authentication.
    pub reauth_after: Duration,
    /// Delay between foregrounding and the re-auth prompt.
    pub prompt_delay: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            reauth_after: Duration::from_secs(DEFAULT_REAUTH_AFTER_SECS),
            prompt_delay: Duration::from_millis(DEFAULT_PROMPT_DELAY_MS),
        }
    }
}

/// An authentication attempt started by [`SessionGuard::begin_authentication`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthAttempt {
    id: u64,
    try_biometrics: bool,
}

impl AuthAttempt {
    /// Whether the host should run a biometric check for this attempt.
    pub fn wants_biometrics(&self) -> bool {
        self.try_biometrics
    }
}

/// Decides when the journal is visible and when the user must re-authenticate.
///
/// Credentials (the passcode and the biometric opt-in flag) live in `K`, a
/// key-value store separate from the journal data. Time comes from `C` so tests
/// can drive background durations with a [`ManualClock`](super::ManualClock).
///
/// # Example
///
/// ```
/// use whisper_journal::kv::MemoryKvStore;
/// use whisper_journal::session::{
///     ManualClock, PasscodeOutcome, SessionGuard, SessionPolicy, SessionState,
/// };
///
/// let mut guard = SessionGuard::new(MemoryKvStore::new(), ManualClock::new(), SessionPolicy::default());
/// assert_eq!(guard.launch()?, SessionState::Authenticating);
///
/// assert_eq!(guard.submit_passcode("1234")?, PasscodeOutcome::Created);
/// assert_eq!(guard.state(), SessionState::Unlocked);
/// # Ok::<(), whisper_journal::AppError>(())
/// ```
pub struct SessionGuard<K: KeyValueStore, C: Clock = SystemClock> {
    credentials: K,
    clock: C,
    policy: SessionPolicy,
    prompt: BiometricPrompt,
    state: SessionState,
    in_background: bool,
    last_backgrounded_at: Option<Instant>,
    unlocked_before_background: bool,
    attempt: Option<u64>,
    next_attempt_id: u64,
    reauth: ReauthTimer,
    stored_passcode: Option<Zeroizing<String>>,
    biometrics_opted_in: bool,
    credentials_loaded: bool,
}

impl<K: KeyValueStore, C: Clock> SessionGuard<K, C> {
    pub fn new(credentials: K, clock: C, policy: SessionPolicy) -> Self {
        Self {
            credentials,
            clock,
            policy,
            prompt: BiometricPrompt::default(),
            state: SessionState::Locked,
            in_background: false,
            last_backgrounded_at: None,
            unlocked_before_background: false,
            attempt: None,
            next_attempt_id: 0,
            reauth: ReauthTimer::new(),
            stored_passcode: None,
            biometrics_opted_in: false,
            credentials_loaded: false,
        }
    }

    pub fn with_prompt(mut self, prompt: BiometricPrompt) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_unlocked(&self) -> bool {
        self.state == SessionState::Unlocked
    }

    pub fn auth_in_progress(&self) -> bool {
        self.attempt.is_some()
    }

    pub fn last_backgrounded_at(&self) -> Option<Instant> {
        self.last_backgrounded_at
    }

    pub fn reauth_pending(&self) -> bool {
        self.reauth.is_armed()
    }

    pub fn reauth_due_at(&self) -> Option<Instant> {
        self.reauth.due_at()
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    pub fn has_passcode(&mut self) -> AppResult<bool> {
        self.ensure_credentials()?;
        Ok(self.stored_passcode.is_some())
    }

    pub fn biometrics_enabled(&mut self) -> AppResult<bool> {
        self.ensure_credentials()?;
        Ok(self.biometrics_opted_in)
    }

    /// First start: loads credentials and asks for authentication.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential store cannot be read. The session stays
    /// locked in that case.
    pub fn launch(&mut self) -> AppResult<SessionState> {
        self.refresh_credentials()?;
        if self.state == SessionState::Locked {
            self.state = SessionState::Authenticating;
            info!(
                passcode_set = self.stored_passcode.is_some(),
                biometrics = self.biometrics_opted_in,
                "Session launched, authentication required"
            );
        }
        Ok(self.state)
    }

    /// Applies a host lifecycle change.
    pub fn on_app_state_change(&mut self, phase: AppPhase) -> Transition {
        let now = self.clock.now();
        match phase {
            AppPhase::Inactive => Transition::Unchanged,
            AppPhase::Background => self.enter_background(now),
            AppPhase::Active => self.enter_foreground(now),
        }
    }

    fn enter_background(&mut self, now: Instant) -> Transition {
        self.in_background = true;
        self.last_backgrounded_at = Some(now);
        if self.reauth.cancel().is_some() {
            debug!("Cancelled pending re-authentication check");
        }

        if self.state == SessionState::Unlocked {
            self.state = SessionState::Locked;
            self.unlocked_before_background = true;
            info!("Session locked on background");
            Transition::Locked
        } else {
            Transition::Unchanged
        }
    }

    fn enter_foreground(&mut self, now: Instant) -> Transition {
        if !self.in_background {
            return Transition::Unchanged;
        }
        self.in_background = false;

        if self.attempt.is_some() {
            debug!("Authentication in progress, ignoring foreground event");
            return Transition::Ignored;
        }

        let away = self
            .last_backgrounded_at
            .map(|at| now.saturating_duration_since(at))
            .unwrap_or(Duration::MAX);
        let was_unlocked = std::mem::take(&mut self.unlocked_before_background);

        if away <= self.policy.reauth_after {
            if was_unlocked {
                self.state = SessionState::Unlocked;
                debug!(away_ms = away.as_millis() as u64, "Brief background, session resumed");
                return Transition::Resumed;
            }
            if self.state == SessionState::Locked {
                self.state = SessionState::Authenticating;
            }
            return Transition::Unchanged;
        }

        self.state = SessionState::Authenticating;
        self.reauth.arm(now + self.policy.prompt_delay);
        info!(
            away_ms = away.as_millis() as u64,
            "Re-authentication required after background"
        );
        Transition::ReauthRequired
    }

    /// Fires the re-auth check if its delay has elapsed.
    ///
    /// Returns `true` when the host should start an authentication attempt now.
    pub fn poll(&mut self) -> bool {
        let now = self.clock.now();
        match self.reauth.fire_if_due(now) {
            Some(_) => self.state == SessionState::Authenticating && self.attempt.is_none(),
            None => false,
        }
    }

    /// Starts an authentication attempt.
    ///
    /// Returns `None` while the app is in the background, when the session is
    /// already unlocked, or when another attempt is in flight. The attempt must be finished with
    /// [`complete_biometric`](Self::complete_biometric) or
    /// [`abandon`](Self::abandon); until then foreground events are ignored.
    pub fn begin_authentication(&mut self) -> AppResult<Option<AuthAttempt>> {
        if self.attempt.is_some() {
            debug!("Authentication already in progress");
            return Ok(None);
        }
        if self.in_background {
            debug!("App in background, not starting authentication");
            return Ok(None);
        }
        if self.state == SessionState::Unlocked {
            return Ok(None);
        }

        self.reauth.cancel();
        self.refresh_credentials()?;
        self.state = SessionState::Authenticating;

        let id = self.next_attempt_id;
        self.next_attempt_id += 1;
        self.attempt = Some(id);
        Ok(Some(AuthAttempt {
            id,
            try_biometrics: self.biometrics_opted_in,
        }))
    }

    /// Finishes an attempt with the result of a biometric check.
    ///
    /// Anything but success leaves the session authenticating so the host falls
    /// back to passcode entry. Results for superseded attempts are ignored.
    pub fn complete_biometric(
        &mut self,
        attempt: AuthAttempt,
        result: Result<BiometricOutcome, AuthError>,
    ) -> SessionState {
        if self.attempt != Some(attempt.id) {
            debug!(attempt = attempt.id, "Ignoring result for superseded attempt");
            return self.state;
        }
        self.attempt = None;

        match result {
            Ok(BiometricOutcome::Success) => {
                self.unlock();
                info!("Unlocked with biometrics");
            }
            Ok(outcome) => {
                info!(?outcome, "Biometric check did not succeed, falling back to passcode");
            }
            Err(e) => {
                debug!(error = %e, "Biometrics unavailable, falling back to passcode");
            }
        }
        self.state
    }

    /// Ends an attempt without a biometric result, leaving passcode entry.
    pub fn abandon(&mut self, attempt: AuthAttempt) {
        if self.attempt == Some(attempt.id) {
            self.attempt = None;
        }
    }

    /// Runs a full authentication attempt synchronously.
    ///
    /// Tries biometrics when opted in and available; otherwise the session stays
    /// authenticating and the caller collects a passcode.
    pub fn authenticate<B: Biometrics + ?Sized>(
        &mut self,
        biometrics: &mut B,
    ) -> AppResult<SessionState> {
        let Some(attempt) = self.begin_authentication()? else {
            return Ok(self.state);
        };
        if !attempt.wants_biometrics() {
            self.abandon(attempt);
            return Ok(self.state);
        }

        let result = match biometrics.is_available() {
            Ok(true) => biometrics.authenticate(&self.prompt),
            Ok(false) => Err(AuthError::HardwareUnavailable(
                "hardware missing or no biometrics enrolled".to_string(),
            )),
            Err(e) => Err(e),
        };
        Ok(self.complete_biometric(attempt, result))
    }

    /// Checks a passcode, or stores it when none exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential store cannot be read or the first
    /// passcode cannot be saved. A wrong passcode is not an error.
    pub fn submit_passcode(&mut self, input: &str) -> AppResult<PasscodeOutcome> {
        let input = Zeroizing::new(input.trim().to_string());
        if !is_valid_passcode(&input) {
            return Ok(PasscodeOutcome::Rejected(RejectReason::InvalidFormat));
        }
        self.ensure_credentials()?;

        let matches = self
            .stored_passcode
            .as_deref()
            .map(|stored| stored.as_str() == input.as_str());
        let outcome = match matches {
            None => {
                self.credentials.set_item(PASSCODE_KEY, input.as_str())?;
                self.stored_passcode = Some(input);
                info!("Passcode created");
                PasscodeOutcome::Created
            }
            Some(true) => PasscodeOutcome::Accepted,
            Some(false) => {
                if self.state == SessionState::Locked {
                    self.state = SessionState::Authenticating;
                }
                warn!("Incorrect passcode entered");
                return Ok(PasscodeOutcome::Rejected(RejectReason::Mismatch));
            }
        };

        self.attempt = None;
        self.unlock();
        Ok(outcome)
    }

    /// Opts into biometric unlock.
    ///
    /// # Errors
    ///
    /// Fails with [`AuthError::PasscodeNotSet`] before a passcode exists and with
    /// [`AuthError::HardwareUnavailable`] when the device cannot do biometrics.
    pub fn enable_biometrics<B: Biometrics + ?Sized>(
        &mut self,
        biometrics: &mut B,
    ) -> AppResult<SessionState> {
        self.ensure_credentials()?;
        if self.stored_passcode.is_none() {
            return Err(AuthError::PasscodeNotSet.into());
        }
        if !biometrics.is_available()? {
            return Err(AuthError::HardwareUnavailable(
                "hardware missing or no biometrics enrolled".to_string(),
            )
            .into());
        }

        self.credentials.set_item(BIOMETRICS_KEY, FLAG_TRUE)?;
        self.biometrics_opted_in = true;
        info!("Biometric unlock enabled");

        if self.is_unlocked() {
            Ok(self.state)
        } else {
            self.authenticate(biometrics)
        }
    }

    pub fn disable_biometrics(&mut self) -> AppResult<()> {
        self.credentials.remove_item(BIOMETRICS_KEY)?;
        self.biometrics_opted_in = false;
        info!("Biometric unlock disabled");
        Ok(())
    }

    /// Locks immediately, dropping any pending check or attempt.
    pub fn lock(&mut self) {
        self.state = SessionState::Locked;
        self.reauth.cancel();
        self.attempt = None;
        self.unlocked_before_background = false;
        info!("Session locked");
    }

    pub fn into_credentials(self) -> K {
        self.credentials
    }

    fn unlock(&mut self) {
        self.state = SessionState::Unlocked;
        self.reauth.cancel();
        self.unlocked_before_background = false;
    }

    fn ensure_credentials(&mut self) -> AppResult<()> {
        if !self.credentials_loaded {
            self.refresh_credentials()?;
        }
        Ok(())
    }

    fn refresh_credentials(&mut self) -> AppResult<()> {
        let passcode = self.credentials.get_item(PASSCODE_KEY)?;
        let flag = self.credentials.get_item(BIOMETRICS_KEY)?;

        self.stored_passcode = passcode.filter(|p| !p.is_empty()).map(Zeroizing::new);
        self.biometrics_opted_in = flag.as_deref() == Some(FLAG_TRUE);
        self.credentials_loaded = true;
        Ok(())
    }
}

impl<K: KeyValueStore, C: Clock> fmt::Debug for SessionGuard<K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionGuard")
            .field("state", &self.state)
            .field("policy", &self.policy)
            .field("auth_in_progress", &self.attempt.is_some())
            .field("reauth_pending", &self.reauth.is_armed())
            .field(
                "passcode",
                &self.stored_passcode.as_ref().map(|_| REDACTED_PLACEHOLDER),
            )
            .field("biometrics_opted_in", &self.biometrics_opted_in)
            .finish_non_exhaustive()
    }
}

fn is_valid_passcode(input: &str) -> bool {
    input.len() == PASSCODE_LENGTH && input.bytes().all(|b| b.is_ascii_digit())
}
