//! Centralized Error Handling Module
//!
//! Every failure carries a unique error code for logging and a client-safe
//! message. Raw upstream detail stays in `source` and never reaches the
//! browser.
//!
//! Log codes follow the pattern CATEGORY_SPECIFIC_ERROR:
//! - AUTH_xxx / VALIDATION_xxx: request rejected before any side effect
//! - CHALLENGE_xxx: bot-protection gate
//! - MAIL_xxx / NEWSLETTER_xxx: outbound side effects
//! - CFG_xxx: configuration errors

use std::fmt;

use crate::utils::constants::{
    MSG_CHALLENGE_INVALID, MSG_CHALLENGE_REQUIRED, MSG_GENERIC_FAILURE, MSG_INVALID_NONCE,
    MSG_MAIL_FAILED,
};

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable, client-safe message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Request Errors
    // ============================================
    /// Missing or invalid anti-forgery token
    AuthFailed,
    /// A submitted field failed validation
    ValidationFailed,

    // ============================================
    // Challenge Errors
    // ============================================
    /// Challenge configured but no token supplied
    ChallengeRequired,
    /// Verifier rejected the token
    ChallengeInvalid,
    /// Verifier could not be reached or answered garbage (fails closed)
    VerifierUnreachable,

    // ============================================
    // Outbound Errors
    // ============================================
    /// Admin notification could not be handed to the mail transport
    MailSendFailed,
    /// Newsletter subscription failed (never surfaced)
    NewsletterFailed,

    // ============================================
    // Redirect Flow
    // ============================================
    /// Flash notice expired or tampered with
    FlashInvalid,

    // ============================================
    // Configuration Errors
    // ============================================
    /// Missing environment variable
    ConfigMissingEnv,
    /// Invalid configuration value
    ConfigInvalidValue,

    // ============================================
    // Generic
    // ============================================
    /// Internal server error
    Internal,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthFailed => "AUTH_FAILED",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::ChallengeRequired => "CHALLENGE_REQUIRED",
            Self::ChallengeInvalid => "CHALLENGE_INVALID",
            Self::VerifierUnreachable => "CHALLENGE_VERIFIER_UNREACHABLE",
            Self::MailSendFailed => "MAIL_SEND_FAILED",
            Self::NewsletterFailed => "NEWSLETTER_FAILED",
            Self::FlashInvalid => "FLASH_INVALID",
            Self::ConfigMissingEnv => "CFG_MISSING_ENV",
            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    /// Code sent to the client in the `code` field.
    ///
    /// An unreachable verifier is reported exactly like a rejected token.
    pub fn public_code(&self) -> &'static str {
        match self {
            Self::AuthFailed => "auth_failed",
            Self::ValidationFailed => "validation_failed",
            Self::ChallengeRequired => "challenge_required",
            Self::ChallengeInvalid | Self::VerifierUnreachable => "challenge_invalid",
            Self::MailSendFailed => "mail_send_failed",
            Self::FlashInvalid => "flash_invalid",
            Self::NewsletterFailed
            | Self::ConfigMissingEnv
            | Self::ConfigInvalidValue
            | Self::Internal => "internal_error",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::AuthFailed => 403,
            Self::ValidationFailed
            | Self::ChallengeRequired
            | Self::ChallengeInvalid
            | Self::VerifierUnreachable
            | Self::FlashInvalid => 400,
            _ => 500,
        }
    }

    /// Default client-facing message for the code
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::AuthFailed => MSG_INVALID_NONCE,
            Self::ChallengeRequired => MSG_CHALLENGE_REQUIRED,
            Self::ChallengeInvalid | Self::VerifierUnreachable => MSG_CHALLENGE_INVALID,
            Self::MailSendFailed => MSG_MAIL_FAILED,
            _ => MSG_GENERIC_FAILURE,
        }
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    pub fn auth_failed() -> Self {
        Self::new(ErrorCode::AuthFailed, MSG_INVALID_NONCE)
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, msg)
    }

    pub fn challenge_required() -> Self {
        Self::new(ErrorCode::ChallengeRequired, MSG_CHALLENGE_REQUIRED)
    }

    pub fn challenge_invalid() -> Self {
        Self::new(ErrorCode::ChallengeInvalid, MSG_CHALLENGE_INVALID)
    }

    /// Verifier outage; the client sees the same message as a rejected token
    pub fn verifier_unreachable(source: eyre::Report) -> Self {
        Self::with_source(
            ErrorCode::VerifierUnreachable,
            MSG_CHALLENGE_INVALID,
            Box::<dyn std::error::Error + Send + Sync>::from(source),
        )
    }

    pub fn mail_send_failed(source: eyre::Report) -> Self {
        Self::with_source(
            ErrorCode::MailSendFailed,
            MSG_MAIL_FAILED,
            Box::<dyn std::error::Error + Send + Sync>::from(source),
        )
    }

    pub fn flash_invalid(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::FlashInvalid, msg)
    }

    /// Missing environment variable
    pub fn missing_env(key_name: &str) -> Self {
        Self::new(
            ErrorCode::ConfigMissingEnv,
            format!("Missing environment variable: {}", key_name),
        )
    }

    pub fn invalid_config(key_name: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidValue,
            format!("Invalid value for {}: {}", key_name, reason),
        )
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        Self::with_source(
            ErrorCode::Internal,
            MSG_GENERIC_FAILURE,
            Box::<dyn std::error::Error + Send + Sync>::from(err),
        )
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        Self::with_source(ErrorCode::Internal, MSG_GENERIC_FAILURE, err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::ValidationFailed, "Invalid JSON body", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AppError::challenge_required();
        assert_eq!(err.code, ErrorCode::ChallengeRequired);
        assert_eq!(err.code_str(), "CHALLENGE_REQUIRED");
        assert_eq!(err.to_string(), "[CHALLENGE_REQUIRED] Please complete the security verification.");
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ErrorCode::AuthFailed.http_status(), 403);
        assert_eq!(ErrorCode::ValidationFailed.http_status(), 400);
        assert_eq!(ErrorCode::ChallengeInvalid.http_status(), 400);
        assert_eq!(ErrorCode::VerifierUnreachable.http_status(), 400);
        assert_eq!(ErrorCode::MailSendFailed.http_status(), 500);
    }

    #[test]
    fn test_log_only_codes_stay_internal() {
        assert_eq!(ErrorCode::NewsletterFailed.as_str(), "NEWSLETTER_FAILED");
        assert_eq!(ErrorCode::NewsletterFailed.public_code(), "internal_error");
        assert_eq!(ErrorCode::NewsletterFailed.http_status(), 500);
        assert_eq!(ErrorCode::AuthFailed.as_str(), "AUTH_FAILED");
    }

    #[test]
    fn test_unreachable_verifier_looks_like_invalid_token() {
        let err = AppError::verifier_unreachable(eyre::eyre!("connect timeout"));
        assert_eq!(err.code.public_code(), "challenge_invalid");
        assert_eq!(err.message, AppError::challenge_invalid().message);
        // Detail is kept for logs only
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.message.contains("timeout"));
    }
}
