//! Biometric hardware seam.
//!
//! The guard never talks to hardware directly. Hosts implement [`Biometrics`] over
//! their platform API; terminals use [`NoBiometrics`].

use crate::constants::{BIOMETRIC_CANCEL_LABEL, BIOMETRIC_FALLBACK_LABEL, BIOMETRIC_PROMPT_MESSAGE};
use crate::errors::AuthError;

/// Result of one biometric check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiometricOutcome {
    Success,
    Failed,
    Cancelled,
}

/// Text shown by the platform's biometric prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiometricPrompt {
    pub message: String,
    pub fallback_label: String,
    pub cancel_label: String,
}

impl Default for BiometricPrompt {
    fn default() -> Self {
        Self {
            message: BIOMETRIC_PROMPT_MESSAGE.to_string(),
            fallback_label: BIOMETRIC_FALLBACK_LABEL.to_string(),
            cancel_label: BIOMETRIC_CANCEL_LABEL.to_string(),
        }
    }
}

/// Access to biometric authentication hardware.
pub trait Biometrics {
    /// Whether hardware is present and the user is enrolled.
    fn is_available(&self) -> Result<bool, AuthError>;

    /// Runs one biometric check.
    fn authenticate(&mut self, prompt: &BiometricPrompt) -> Result<BiometricOutcome, AuthError>;
}

/// Stand-in for devices without biometric hardware.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBiometrics;

impl Biometrics for NoBiometrics {
    fn is_available(&self) -> Result<bool, AuthError> {
        Ok(false)
    }

    fn authenticate(&mut self, _prompt: &BiometricPrompt) -> Result<BiometricOutcome, AuthError> {
        Err(AuthError::HardwareUnavailable(
            "no biometric hardware on this device".to_string(),
        ))
    }
}
