//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest display name accepted for races and participants.
pub const MAX_NAME_CHARS: usize = 40;

/// Validates that a race or participant name is non-blank and at most
/// [`MAX_NAME_CHARS`] characters once trimmed.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("name_empty");
        err.message = Some("Name must not be empty".into());
        return Err(err);
    }

    let chars = trimmed.chars().count();
    if chars > MAX_NAME_CHARS {
        let mut err = ValidationError::new("name_length");
        err.message = Some(
            format!("Name must be at most {MAX_NAME_CHARS} characters (got {chars})").into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Validates a login username: 3 to 32 ASCII letters, digits or underscores.
///
/// # Examples
///
/// ```ignore
/// validate_login_code("chef_01") // Ok
/// validate_login_code("ab")      // Err - too short
/// validate_login_code("chef-01") // Err - dash
/// ```
pub fn validate_login_code(code: &str) -> Result<(), ValidationError> {
    if !(3..=32).contains(&code.len()) {
        let mut err = ValidationError::new("login_code_length");
        err.message =
            Some(format!("Login code must be 3 to 32 characters (got {})", code.len()).into());
        return Err(err);
    }

    if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        let mut err = ValidationError::new("login_code_format");
        err.message = Some("Login code may only contain letters, digits and underscores".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_display_name() {
        assert!(validate_display_name("Pizza Night").is_ok());
        assert!(validate_display_name(&"a".repeat(MAX_NAME_CHARS)).is_ok());
        assert!(validate_display_name("   ").is_err());
        assert!(validate_display_name(&"a".repeat(MAX_NAME_CHARS + 1)).is_err());
    }

    #[test]
    fn test_validate_login_code() {
        assert!(validate_login_code("chef_01").is_ok());
        assert!(validate_login_code("ABC").is_ok());
        assert!(validate_login_code("ab").is_err()); // too short
        assert!(validate_login_code(&"a".repeat(33)).is_err()); // too long
        assert!(validate_login_code("chef-01").is_err()); // dash
        assert!(validate_login_code("chef 01").is_err()); // space
    }
}
