//! Account name validation.
//!
//! A name becomes the file name of the account, so it has to be a single,
//! plain path component.

use super::model::AccountId;

/// Validation error for an account name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Name is empty or whitespace.
    EmptyName,
    /// Name is `.` or `..`.
    ReservedName,
    /// Name contains `/` or `\`.
    PathSeparator,
    /// Name contains a control character.
    ControlCharacter,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptyName => "Account name is required",
            Self::ReservedName => "Account name cannot be '.' or '..'",
            Self::PathSeparator => "Account name cannot contain path separators",
            Self::ControlCharacter => "Account name cannot contain control characters",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating a name.
pub type ValidationResult = Result<AccountId, ValidationError>;

/// Validate an account name and turn it into the id it will be stored under.
///
/// # Errors
///
/// Returns the first rule the name breaks.
pub fn validate_name(name: &str) -> ValidationResult {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name == "." || name == ".." {
        return Err(ValidationError::ReservedName);
    }
    if name.contains(['/', '\\']) {
        return Err(ValidationError::PathSeparator);
    }
    if name.chars().any(char::is_control) {
        return Err(ValidationError::ControlCharacter);
    }
    Ok(AccountId::new(name))
}
