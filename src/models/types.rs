//! Domain types shared by the submission service and the providers
//!
//! Nothing here outlives a single request.

use serde::{Deserialize, Serialize};

/// JSON body exchanged between the client form and the submit endpoint.
///
/// Missing fields deserialize as empty and are rejected by validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionPayload {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turnstile_response: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub newsletter_consent: bool,
}

/// Raw submission as it arrives at the service, before sanitizing.
#[derive(Debug, Clone, Default)]
pub struct SubmissionRequest {
    /// Anti-forgery token from the request header or form field
    pub nonce: Option<String>,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    /// Challenge widget response token
    pub challenge_token: Option<String>,
    /// Submitter ticked the newsletter box
    pub newsletter_consent: bool,
    /// Subscribe only on `newsletter_consent`, whatever the config says.
    /// Set by the form-encoded variant, which always renders the checkbox.
    pub explicit_opt_in: bool,
    /// Client address forwarded to the verifier
    pub remote_ip: Option<String>,
}

impl SubmissionRequest {
    /// Combine a JSON payload with the request metadata
    pub fn from_payload(payload: SubmissionPayload, nonce: Option<String>, remote_ip: Option<String>) -> Self {
        Self {
            nonce,
            name: payload.name,
            email: payload.email,
            subject: payload.subject,
            message: payload.message,
            challenge_token: payload.turnstile_response,
            newsletter_consent: payload.newsletter_consent,
            explicit_opt_in: false,
            remote_ip,
        }
    }
}

/// Sanitized, validated submission. Only `core::validation` builds one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSubmission {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// Result of calling the external challenge verifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChallengeVerification {
    pub success: bool,
    #[serde(default, rename = "error-codes")]
    pub error_codes: Vec<String>,
    #[serde(default)]
    pub hostname: Option<String>,
}

/// Outcome of a successful submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub message: String,
}

/// Call-to-action link shown after a successful submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessAction {
    pub label: String,
    pub url: String,
}

/// Link listed in the confirmation email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLink {
    pub label: String,
    pub url: String,
}

/// Outbound HTML email handed to the mail boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

impl MailMessage {
    pub fn html(to: impl Into<String>, subject: impl Into<String>, html_body: String) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            html_body,
            from: None,
            reply_to: None,
        }
    }

    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn with_reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }

    /// Headers in `Name: value` form, as a mail transport expects them
    pub fn headers(&self) -> Vec<String> {
        let mut headers = vec!["Content-Type: text/html; charset=UTF-8".to_string()];
        if let Some(from) = &self.from {
            headers.push(format!("From: {}", from));
        }
        if let Some(reply_to) = &self.reply_to {
            headers.push(format!("Reply-To: {}", reply_to));
        }
        headers
    }
}
