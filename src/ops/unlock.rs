//! Unlocking the journal from a terminal.

use crate::constants::{ENV_VAR_PASSCODE, MAX_PASSCODE_ATTEMPTS};
use crate::errors::{AppResult, AuthError};
use crate::kv::KeyValueStore;
use crate::session::{
    Biometrics, Clock, PasscodeOutcome, RejectReason, SessionGuard, SessionState,
};
use std::env;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// How the session was unlocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockMethod {
    Biometrics,
    Passcode,
    /// No passcode existed; the entered one was stored.
    PasscodeCreated,
}

/// Supplies passcode attempts.
pub trait PasscodeSource {
    /// The next attempt, or `None` when the source has nothing more to offer.
    ///
    /// `creating` is true when no passcode is stored yet.
    fn next_passcode(&mut self, creating: bool) -> AppResult<Option<Zeroizing<String>>>;
}

/// A single passcode provided up front, for scripts and tests.
pub struct FixedPasscode {
    passcode: Option<Zeroizing<String>>,
}

impl FixedPasscode {
    pub fn new(passcode: impl Into<String>) -> Self {
        Self {
            passcode: Some(Zeroizing::new(passcode.into())),
        }
    }
}

impl PasscodeSource for FixedPasscode {
    fn next_passcode(&mut self, _creating: bool) -> AppResult<Option<Zeroizing<String>>> {
        Ok(self.passcode.take())
    }
}

/// Reads passcodes from the terminal without echo.
#[derive(Debug, Default)]
pub struct PromptPasscode;

impl PasscodeSource for PromptPasscode {
    fn next_passcode(&mut self, creating: bool) -> AppResult<Option<Zeroizing<String>>> {
        let prompt = if creating {
            "Create a 4-digit passcode: "
        } else {
            "Enter passcode: "
        };
        let passcode = rpassword::prompt_password(prompt).map_err(AuthError::Prompt)?;
        Ok(Some(Zeroizing::new(passcode)))
    }
}

/// Picks `WHISPER_PASSCODE` when set, otherwise the terminal prompt.
pub fn passcode_source_from_env() -> Box<dyn PasscodeSource> {
    match env::var(ENV_VAR_PASSCODE) {
        Ok(passcode) => {
            debug!("Using {} for non-interactive unlock", ENV_VAR_PASSCODE);
            Box::new(FixedPasscode::new(passcode))
        }
        Err(_) => Box::new(PromptPasscode),
    }
}

/// Runs the launch flow until the session is unlocked.
///
/// Biometrics are tried first when opted in. A failed or unavailable check falls
/// through to passcode entry with at most three attempts.
///
/// # Errors
///
/// Returns [`AuthError::Locked`] when every attempt is rejected or the source runs
/// dry, and propagates credential storage failures.
pub fn unlock_session<K, C, B, S>(
    guard: &mut SessionGuard<K, C>,
    biometrics: &mut B,
    source: &mut S,
) -> AppResult<UnlockMethod>
where
    K: KeyValueStore,
    C: Clock,
    B: Biometrics + ?Sized,
    S: PasscodeSource + ?Sized,
{
    guard.launch()?;
    if guard.authenticate(biometrics)? == SessionState::Unlocked {
        return Ok(UnlockMethod::Biometrics);
    }

    let creating = !guard.has_passcode()?;
    for attempt in 1..=MAX_PASSCODE_ATTEMPTS {
        let Some(input) = source.next_passcode(creating)? else {
            break;
        };
        match guard.submit_passcode(&input)? {
            PasscodeOutcome::Created => {
                info!("Passcode set, journal unlocked");
                return Ok(UnlockMethod::PasscodeCreated);
            }
            PasscodeOutcome::Accepted => return Ok(UnlockMethod::Passcode),
            PasscodeOutcome::Rejected(RejectReason::InvalidFormat) => {
                warn!(attempt, "Passcode must be exactly 4 digits");
            }
            PasscodeOutcome::Rejected(RejectReason::Mismatch) => {
                warn!(attempt, "Incorrect passcode");
            }
        }
    }

    Err(AuthError::Locked(
        "passcode not accepted. Set WHISPER_PASSCODE or enter the 4-digit passcode when prompted."
            .to_string(),
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{BIOMETRICS_KEY, FLAG_TRUE, PASSCODE_KEY};
    use crate::errors::AppError;
    use crate::kv::MemoryKvStore;
    use crate::session::{
        BiometricOutcome, BiometricPrompt, ManualClock, NoBiometrics, SessionPolicy,
    };

    struct Scripted(Vec<&'static str>);

    impl PasscodeSource for Scripted {
        fn next_passcode(&mut self, _creating: bool) -> AppResult<Option<Zeroizing<String>>> {
            if self.0.is_empty() {
                return Ok(None);
            }
            Ok(Some(Zeroizing::new(self.0.remove(0).to_string())))
        }
    }

    struct AlwaysSucceeds;

    impl Biometrics for AlwaysSucceeds {
        fn is_available(&self) -> Result<bool, AuthError> {
            Ok(true)
        }

        fn authenticate(
            &mut self,
            _prompt: &BiometricPrompt,
        ) -> Result<BiometricOutcome, AuthError> {
            Ok(BiometricOutcome::Success)
        }
    }

    fn guard(credentials: MemoryKvStore) -> SessionGuard<MemoryKvStore, ManualClock> {
        SessionGuard::new(credentials, ManualClock::new(), SessionPolicy::default())
    }

    #[test]
    fn test_first_unlock_creates_passcode() {
        let mut guard = guard(MemoryKvStore::new());
        let method =
            unlock_session(&mut guard, &mut NoBiometrics, &mut FixedPasscode::new("1234")).unwrap();

        assert_eq!(method, UnlockMethod::PasscodeCreated);
        assert!(guard.is_unlocked());
    }

    #[test]
    fn test_retries_until_correct_passcode() {
        let mut guard = guard(MemoryKvStore::with_items([(PASSCODE_KEY, "1234")]));
        let mut source = Scripted(vec!["12", "0000", "1234"]);

        let method = unlock_session(&mut guard, &mut NoBiometrics, &mut source).unwrap();
        assert_eq!(method, UnlockMethod::Passcode);
    }

    #[test]
    fn test_gives_up_after_three_attempts() {
        let mut guard = guard(MemoryKvStore::with_items([(PASSCODE_KEY, "1234")]));
        let mut source = Scripted(vec!["0000", "1111", "2222", "1234"]);

        let result = unlock_session(&mut guard, &mut NoBiometrics, &mut source);
        assert!(matches!(result, Err(AppError::Auth(AuthError::Locked(_)))));
        assert_eq!(guard.state(), SessionState::Authenticating);
        assert_eq!(source.0, vec!["1234"]);
    }

    #[test]
    fn test_empty_source_leaves_journal_locked() {
        let mut guard = guard(MemoryKvStore::with_items([(PASSCODE_KEY, "1234")]));
        let result = unlock_session(&mut guard, &mut NoBiometrics, &mut Scripted(vec![]));
        assert!(result.is_err());
        assert!(!guard.is_unlocked());
    }

    #[test]
    fn test_biometrics_unlock_without_passcode_prompt() {
        let mut guard = guard(MemoryKvStore::with_items([
            (PASSCODE_KEY, "1234"),
            (BIOMETRICS_KEY, FLAG_TRUE),
        ]));
        let mut source = Scripted(vec!["0000"]);

        let method = unlock_session(&mut guard, &mut AlwaysSucceeds, &mut source).unwrap();
        assert_eq!(method, UnlockMethod::Biometrics);
        assert_eq!(source.0.len(), 1);
    }

    #[test]
    fn test_opted_in_without_hardware_falls_back_to_passcode() {
        let mut guard = guard(MemoryKvStore::with_items([
            (PASSCODE_KEY, "1234"),
            (BIOMETRICS_KEY, FLAG_TRUE),
        ]));

        let method =
            unlock_session(&mut guard, &mut NoBiometrics, &mut FixedPasscode::new("1234")).unwrap();
        assert_eq!(method, UnlockMethod::Passcode);
    }
}
