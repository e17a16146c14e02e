//! API Request/Response Types

use serde::{Deserialize, Serialize};

use crate::core::FormProps;
use crate::models::AppError;

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub challenge_enabled: bool,
    pub newsletter_enabled: bool,
}

// ============================================
// Contact submission
// ============================================

/// Body of every submit / notice reply: `{success, message, code?}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl SubmissionResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            code: None,
        }
    }

    pub fn failure(code: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            code: Some(code.to_string()),
        }
    }
}

impl From<&AppError> for SubmissionResult {
    /// Public code and message only; internal detail stays in the logs
    fn from(err: &AppError) -> Self {
        let message = match err.code.http_status() {
            500 => err.code.default_message().to_string(),
            _ => err.message.clone(),
        };
        Self::failure(err.code.public_code(), message)
    }
}

/// Form-encoded submission (no-JS fallback)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactFormFields {
    pub contact_name: String,
    pub contact_email: String,
    pub contact_subject: String,
    pub contact_message: String,
    /// Checkbox; only `yes` counts as checked
    pub newsletter_consent: Option<String>,
    #[serde(rename = "cf-turnstile-response")]
    pub turnstile_response: Option<String>,
    pub ec_contact_form_nonce: Option<String>,
}

/// `GET /v1/contact/config`: client props plus the no-JS form nonce
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormConfigData {
    #[serde(flatten)]
    pub props: FormProps,
    pub form_nonce: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoticeQuery {
    pub contact_notice: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorCode;

    #[test]
    fn test_failure_hides_internal_detail() {
        let err = AppError::mail_send_failed(eyre::eyre!("relay 10.0.0.3 refused"));
        let body = SubmissionResult::from(&err);
        assert!(!body.success);
        assert_eq!(body.code.as_deref(), Some("mail_send_failed"));
        assert!(!body.message.contains("10.0.0.3"));

        let err = AppError::new(ErrorCode::Internal, "panic in template");
        assert_eq!(SubmissionResult::from(&err).message, ErrorCode::Internal.default_message());
    }

    #[test]
    fn test_success_omits_code() {
        let json = serde_json::to_value(SubmissionResult::success("ok")).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "message": "ok"}));
    }
}
