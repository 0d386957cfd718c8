//! Container handle validation.

use std::fmt;

use crate::error::{TugboatError, TugboatResult};

/// Identifier the runtime returns when a container is created.
///
/// Handles are opaque to tugboat but must:
/// - Be 1-64 characters long
/// - Contain only alphanumeric characters, hyphens, and underscores
/// - Start with an alphanumeric character
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHandle(String);

impl ContainerHandle {
    /// Maximum length of a handle (a full Docker container ID).
    pub const MAX_LENGTH: usize = 64;

    /// Length of the abbreviated form used in log lines.
    pub const SHORT_LENGTH: usize = 12;

    /// Create a new handle, validating the format.
    ///
    /// # Errors
    ///
    /// Returns [`TugboatError::InvalidContainerHandle`] if the format is invalid.
    pub fn new(id: impl Into<String>) -> TugboatResult<Self> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Get the handle as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(id: &str) -> TugboatResult<()> {
        let invalid = || TugboatError::InvalidContainerHandle { id: id.to_string() };

        if id.len() > Self::MAX_LENGTH {
            return Err(invalid());
        }

        let mut chars = id.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphanumeric() => {}
            _ => return Err(invalid()),
        }

        if chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            Ok(())
        } else {
            Err(invalid())
        }
    }

    /// Returns a short version of the handle (first 12 characters).
    #[must_use]
    pub fn short(&self) -> &str {
        if self.0.len() <= Self::SHORT_LENGTH {
            &self.0
        } else {
            &self.0[..Self::SHORT_LENGTH]
        }
    }
}

impl fmt::Display for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
