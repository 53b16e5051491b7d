// 📐 Input validation for forms
// Each validator returns the parsed value or a FieldError for inline display.

use crate::error::FieldError;

/// Highest possible NEET score.
pub const NEET_MAX_MARK: u16 = 720;

/// Default minimum password length accepted by the identity provider.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Length of one-time verification codes.
pub const OTP_LEN: usize = 6;

/// Which NEET figure the student entered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeetInput {
    Mark,
    Rank,
}

impl NeetInput {
    pub fn label(&self) -> &str {
        match self {
            NeetInput::Mark => "NEET Mark",
            NeetInput::Rank => "NEET Rank",
        }
    }
}

/// Integer mark in [0, 720].
pub fn validate_neet_mark(input: &str) -> Result<u16, FieldError> {
    let invalid = || {
        FieldError::new(
            "neet_mark",
            format!("Please enter a valid NEET mark between 0 and {}", NEET_MAX_MARK),
        )
    };

    let mark: i64 = input.trim().parse().map_err(|_| invalid())?;
    if !(0..=NEET_MAX_MARK as i64).contains(&mark) {
        return Err(invalid());
    }
    Ok(mark as u16)
}

/// Positive all-India rank.
pub fn validate_neet_rank(input: &str) -> Result<u32, FieldError> {
    match input.trim().parse::<u32>() {
        Ok(rank) if rank > 0 => Ok(rank),
        _ => Err(FieldError::new(
            "neet_rank",
            "Please enter a valid NEET rank (a positive whole number)",
        )),
    }
}

/// Structural check: one '@', non-empty local part, dotted domain, no spaces.
pub fn validate_email(input: &str) -> Result<String, FieldError> {
    let email = input.trim();
    let invalid = || FieldError::new("email", "Please enter a valid email address");

    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid());
    }

    Ok(email.to_lowercase())
}

pub fn validate_password(input: &str, min_len: usize) -> Result<(), FieldError> {
    if input.chars().count() < min_len {
        return Err(FieldError::new(
            "password",
            format!("Password should be at least {} characters", min_len),
        ));
    }
    Ok(())
}

/// Digits only after an optional leading '+'; separators are stripped.
pub fn validate_phone(input: &str) -> Result<String, FieldError> {
    let trimmed = input.trim();
    let (plus, rest) = match trimmed.strip_prefix('+') {
        Some(rest) => ("+", rest),
        None => ("", trimmed),
    };

    let digits: String = rest
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();

    if digits.len() < 10 || digits.len() > 15 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(FieldError::new("phone", "Please enter a valid phone number"));
    }
    Ok(format!("{}{}", plus, digits))
}

pub fn validate_otp_code(input: &str) -> Result<String, FieldError> {
    let code = input.trim();
    if code.len() != OTP_LEN || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(FieldError::new(
            "otp",
            format!("Verification code must be {} digits", OTP_LEN),
        ));
    }
    Ok(code.to_string())
}

pub fn validate_document_title(input: &str) -> Result<String, FieldError> {
    let title = input.trim();
    if title.is_empty() {
        return Err(FieldError::new("title", "Please enter a document title"));
    }
    Ok(title.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neet_mark_accepts_range() {
        assert_eq!(validate_neet_mark("0"), Ok(0));
        assert_eq!(validate_neet_mark("720"), Ok(720));
        assert_eq!(validate_neet_mark(" 615 "), Ok(615));
    }

    #[test]
    fn test_neet_mark_rejects_invalid() {
        for input in ["-1", "721", "", "abc", "12.5", "99999999999999999999"] {
            let err = validate_neet_mark(input).unwrap_err();
            assert_eq!(err.field, "neet_mark", "Input {:?} should be rejected", input);
        }
    }

    #[test]
    fn test_neet_rank() {
        assert_eq!(validate_neet_rank("1500"), Ok(1500));
        assert!(validate_neet_rank("0").is_err());
        assert!(validate_neet_rank("-20").is_err());
    }

    #[test]
    fn test_email() {
        assert_eq!(validate_email(" You@Example.com "), Ok("you@example.com".to_string()));
        for bad in ["", "plain", "@example.com", "a@b", "a@@b.com", "a b@c.com", "a@b..com"] {
            assert!(validate_email(bad).is_err(), "{:?} should be rejected", bad);
        }
    }

    #[test]
    fn test_password_length() {
        assert!(validate_password("secret", MIN_PASSWORD_LEN).is_ok());
        let err = validate_password("short", MIN_PASSWORD_LEN).unwrap_err();
        assert_eq!(err.message, "Password should be at least 6 characters");
    }

    #[test]
    fn test_phone() {
        assert_eq!(validate_phone("+91 98765-43210"), Ok("+919876543210".to_string()));
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("98765abcde").is_err());
    }

    #[test]
    fn test_otp_and_title() {
        assert_eq!(validate_otp_code("123456"), Ok("123456".to_string()));
        assert!(validate_otp_code("12345").is_err());
        assert!(validate_otp_code("12a456").is_err());
        assert_eq!(validate_document_title("  Marksheet "), Ok("Marksheet".to_string()));
        assert!(validate_document_title("   ").is_err());
    }
}
