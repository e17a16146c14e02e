//! Input sanitizing and field validation
//!
//! The client pre-validates, but nothing it sends is trusted: every field is
//! sanitized and checked again here before any side effect happens.

use crate::models::{AppError, AppResult, ContactConfig, SubmissionRequest, ValidatedSubmission};
use crate::utils::html::strip_tags;

const LOCAL_PART_SPECIALS: &str = "!#$%&'*+/=?^_`{|}~.-";

/// Single-line text: markup removed, whitespace collapsed, percent-encoded
/// octets dropped, trimmed.
pub fn sanitize_text_field(input: &str) -> String {
    let stripped = strip_percent_octets(&strip_tags(input));
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Multi-line text: markup removed, line endings normalized to `\n`,
/// percent-encoded octets dropped, outer whitespace trimmed.
pub fn sanitize_textarea_field(input: &str) -> String {
    let stripped = strip_percent_octets(&strip_tags(input));
    stripped.replace("\r\n", "\n").replace('\r', "\n").trim().to_string()
}

/// Drop every character that cannot appear in an email address.
pub fn sanitize_email(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '@' || LOCAL_PART_SPECIALS.contains(*c))
        .collect()
}

/// Address syntax check: `local@domain.tld` with a conservative character set.
pub fn is_email(email: &str) -> bool {
    if email.len() < 6 {
        return false;
    }

    let (local, domain) = match email.split_once('@') {
        Some(parts) => parts,
        None => return false,
    };

    if local.is_empty()
        || !local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || LOCAL_PART_SPECIALS.contains(c))
    {
        return false;
    }

    if domain.contains("..") || domain.starts_with('.') || domain.ends_with('.') {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    labels.iter().all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

/// Sanitize and validate a raw submission against the configured subjects.
///
/// Fields are checked in form order and the first failure is returned.
pub fn validate(request: &SubmissionRequest, config: &ContactConfig) -> AppResult<ValidatedSubmission> {
    let name = sanitize_text_field(&request.name);
    if name.is_empty() {
        return Err(AppError::validation("Please enter your name."));
    }

    let email = sanitize_email(&request.email);
    if !is_email(&email) {
        return Err(AppError::validation("Please enter a valid email address."));
    }

    let subject = sanitize_text_field(&request.subject);
    if !config.is_valid_subject(&subject) {
        return Err(AppError::validation("Please select a valid subject."));
    }

    let message = sanitize_textarea_field(&request.message);
    if message.is_empty() {
        return Err(AppError::validation("Please enter a message."));
    }

    Ok(ValidatedSubmission {
        name,
        email,
        subject,
        message,
    })
}

fn strip_percent_octets(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c == '%' {
            let mut lookahead = chars.clone();
            if let (Some(a), Some(b)) = (lookahead.next(), lookahead.next()) {
                if a.is_ascii_hexdigit() && b.is_ascii_hexdigit() {
                    chars = lookahead;
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorCode;

    fn request(name: &str, email: &str, subject: &str, message: &str) -> SubmissionRequest {
        SubmissionRequest {
            name: name.to_string(),
            email: email.to_string(),
            subject: subject.to_string(),
            message: message.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_sanitize_text_field() {
        assert_eq!(sanitize_text_field("  Jane \n\t Doe  "), "Jane Doe");
        assert_eq!(sanitize_text_field("<b>Jane</b>"), "Jane");
        assert_eq!(sanitize_text_field("50%20off"), "50off");
        assert_eq!(sanitize_text_field("100% sure"), "100% sure");
        assert_eq!(sanitize_text_field("Zoë"), "Zoë");
    }

    #[test]
    fn test_sanitize_textarea_keeps_newlines() {
        assert_eq!(sanitize_textarea_field("  Hello\r\nWorld  "), "Hello\nWorld");
        assert_eq!(sanitize_textarea_field("hi <script>x()</script>"), "hi");
    }

    #[test]
    fn test_is_email() {
        assert!(is_email("jane@example.com"));
        assert!(is_email("first.last+tag@mail.example.co.uk"));
        assert!(!is_email("jane@example"));
        assert!(!is_email("@example.com"));
        assert!(!is_email("jane@@example.com"));
        assert!(!is_email("jane@exa..mple.com"));
        assert!(!is_email("jane@-example.com"));
        assert!(!is_email("a@b.c"));
        assert!(!is_email("jane example@example.com"));
    }

    #[test]
    fn test_sanitize_email() {
        assert_eq!(sanitize_email("  jane<>@example.com "), "jane@example.com");
    }

    #[test]
    fn test_validate_accepts_valid_submission() {
        let config = ContactConfig::new("admin@example.com");
        let valid = validate(
            &request(" Jane Doe ", "jane@example.com", "General Inquiry", "Hello\nWorld"),
            &config,
        )
        .unwrap();
        assert_eq!(valid.name, "Jane Doe");
        assert_eq!(valid.message, "Hello\nWorld");
    }

    #[test]
    fn test_validate_rejects_unknown_subject() {
        let config = ContactConfig::new("admin@example.com");
        let err = validate(
            &request("Jane Doe", "jane@example.com", "Not A Real Subject", "Hello"),
            &config,
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert!(err.message.contains("subject"));
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        let config = ContactConfig::new("admin@example.com");
        for req in [
            request("   ", "jane@example.com", "Other", "Hello"),
            request("<i></i>", "jane@example.com", "Other", "Hello"),
            request("Jane", "not-an-email", "Other", "Hello"),
            request("Jane", "jane@example.com", "Other", " \n "),
        ] {
            assert_eq!(validate(&req, &config).unwrap_err().code, ErrorCode::ValidationFailed);
        }
    }

    mod proptest_validate {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            /// Anything outside the configured list is a validation failure,
            /// never an accepted subject.
            #[test]
            fn prop_unknown_subject_rejected(subject in "\\PC{0,40}") {
                let config = ContactConfig::new("admin@example.com");
                prop_assume!(!config.is_valid_subject(&sanitize_text_field(&subject)));

                let err = validate(&request("Jane Doe", "jane@example.com", &subject, "Hello"), &config)
                    .unwrap_err();
                prop_assert_eq!(err.code, ErrorCode::ValidationFailed);
                prop_assert_eq!(err.message, "Please select a valid subject.");
            }
        }
    }
}
