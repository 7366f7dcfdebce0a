//! Error types for loading and running the game.
//!
//! Only failures that stop the module from coming up are errors. Stalled
//! indicator writes, repeated start commands and input while stopped are
//! all silent no-ops.

use thiserror::Error;

/// Errors reported by `keydance`.
#[derive(Error, Debug)]
pub enum KeydanceError {
    /// A configuration value cannot be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// A host resource (timer, interrupt worker, keyboard source) could not be registered.
    #[error("failed to register {resource}")]
    Registration {
        /// Name of the resource that failed.
        resource: &'static str,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// Terminal I/O failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, KeydanceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_registration_error_keeps_source() {
        let err = KeydanceError::Registration {
            resource: "timer",
            source: std::io::Error::new(std::io::ErrorKind::OutOfMemory, "no threads"),
        };
        assert_eq!(err.to_string(), "failed to register timer");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_invalid_config_message() {
        let err = KeydanceError::InvalidConfig("base unit must be non-zero");
        assert_eq!(
            err.to_string(),
            "invalid configuration: base unit must be non-zero"
        );
    }
}
