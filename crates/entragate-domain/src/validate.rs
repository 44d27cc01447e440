//! Field validators for inbound request values.
//!
//! These run before any directory or ARM call; a failure here never reaches a
//! downstream service.

use crate::error::DomainError;

/// ProjectName length cap (pipeline template parameter limit).
pub const PROJECT_NAME_MAX_LEN: usize = 55;
/// Email length cap per RFC 5321 total-path limit.
pub const EMAIL_MAX_LEN: usize = 254;

/// ProjectName: non-empty, at most 55 chars, `[-_.A-Za-z0-9]` only.
pub fn check_project_name(value: &str) -> Result<(), DomainError> {
    if value.is_empty() || value.len() > PROJECT_NAME_MAX_LEN {
        return Err(DomainError::InvalidProjectName(value.to_string()));
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.';
    if !value.chars().all(allowed) {
        return Err(DomainError::InvalidProjectName(value.to_string()));
    }
    Ok(())
}

/// Email: non-empty, bounded length, structural `local@domain.tld` shape.
/// Deliverability is not checked; the directory lookup is the authority on
/// whether the account exists.
pub fn check_email(value: &str) -> Result<(), DomainError> {
    if value.is_empty() || value.len() > EMAIL_MAX_LEN {
        return Err(DomainError::InvalidEmail(value.to_string()));
    }
    let Some((local, domain)) = value.split_once('@') else {
        return Err(DomainError::InvalidEmail(value.to_string()));
    };
    let no_ws = |s: &str| !s.chars().any(|c| c.is_whitespace() || c == '@');
    if local.is_empty() || !no_ws(local) {
        return Err(DomainError::InvalidEmail(value.to_string()));
    }
    if domain.is_empty() || !no_ws(domain) || !domain.contains('.') {
        return Err(DomainError::InvalidEmail(value.to_string()));
    }
    Ok(())
}

/// Emails: non-empty list where every entry passes [`check_email`].
pub fn check_emails(values: &[String]) -> Result<(), DomainError> {
    if values.is_empty() {
        return Err(DomainError::InvalidEmails("empty list".to_string()));
    }
    for email in values {
        check_email(email)?;
    }
    Ok(())
}
