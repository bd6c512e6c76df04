//! Session locking and re-authentication.
//!
//! The [`SessionGuard`] keeps the journal hidden until the user proves who they are,
//! locks when the host goes to the background, and decides on return whether a
//! fresh authentication is needed. Hosts feed it lifecycle events and call
//! [`SessionGuard::poll`] to fire the deferred re-auth check.

pub mod biometrics;
pub mod clock;
pub mod guard;
pub mod timer;

pub use biometrics::{BiometricOutcome, BiometricPrompt, Biometrics, NoBiometrics};
pub use clock::{Clock, ManualClock, SystemClock};
pub use guard::{
    AppPhase, AuthAttempt, PasscodeOutcome, RejectReason, SessionGuard, SessionPolicy,
    SessionState, Transition,
};
pub use timer::{ReauthTimer, TimerHandle};
