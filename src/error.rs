//! Error types for configuration and cryptographic operations.

use std::fmt;

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Raised while resolving or validating an algorithm configuration.
///
/// These errors are always surfaced synchronously to the caller configuring
/// the engine; nothing is silently defaulted or retried.
#[derive(Debug)]
pub enum ConfigError {
    /// A required configuration value was empty or absent.
    MissingRequiredValue { name: &'static str },
    /// A configuration value was present but outside its valid range.
    InvalidValue { name: &'static str, reason: String },
    /// A resolved algorithm does not meet the minimum-strength policy.
    WeakAlgorithm {
        parameter: &'static str,
        required_bits: u32,
        actual_bits: u32,
    },
    /// No built-in algorithm or registered provider could open the
    /// requested name/provider pair.
    UnknownAlgorithm { name: String, provider: Option<String> },
    /// The configuration round-trip self-test failed.
    SelfTestFailed(CryptoError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequiredValue { name } => {
                write!(f, "configuration value '{}' must be non-empty", name)
            }
            Self::InvalidValue { name, reason } => {
                write!(f, "configuration value '{}' is invalid: {}", name, reason)
            }
            Self::WeakAlgorithm { parameter, required_bits, actual_bits } => {
                write!(
                    f,
                    "algorithm {} of {} bits is below the required minimum of {} bits",
                    parameter, actual_bits, required_bits
                )
            }
            Self::UnknownAlgorithm { name, provider } => match provider {
                Some(p) => write!(f, "algorithm '{}' could not be opened from provider '{}'", name, p),
                None => write!(f, "algorithm '{}' could not be opened", name),
            },
            Self::SelfTestFailed(inner) => write!(f, "configuration self-test failed: {}", inner),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SelfTestFailed(inner) => Some(inner),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Cryptographic operation errors
// ---------------------------------------------------------------------------

/// Raised by encrypt/decrypt operations.
///
/// `AuthenticationFailed` is the only error decrypt reports for tampered or
/// garbled input. It carries no detail about where verification failed, so
/// callers cannot distinguish a bad tag from a malformed packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoError {
    /// The packet's authentication tag did not match, or the packet could
    /// not be parsed against the configured algorithms.
    AuthenticationFailed,
    /// The encrypt-then-decrypt round trip produced different bytes.
    SelfTestFailed,
    /// The secure random source failed to produce bytes.
    RandomSourceFailed,
    /// An invariant that a valid authentication tag should have guaranteed
    /// was violated (e.g. malformed padding after tag verification).
    Internal,
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthenticationFailed => write!(f, "authentication failed"),
            Self::SelfTestFailed => write!(f, "self-test round trip failed"),
            Self::RandomSourceFailed => write!(f, "random source failed"),
            Self::Internal => write!(f, "internal invariant violated"),
        }
    }
}

impl std::error::Error for CryptoError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_failure_display_is_fixed() {
        // The message must never vary with the failure cause.
        assert_eq!(CryptoError::AuthenticationFailed.to_string(), "authentication failed");
    }

    #[test]
    fn weak_algorithm_carries_both_values() {
        let err = ConfigError::WeakAlgorithm {
            parameter: "key size",
            required_bits: 128,
            actual_bits: 64,
        };
        let msg = err.to_string();
        assert!(msg.contains("64"));
        assert!(msg.contains("128"));
    }
}
