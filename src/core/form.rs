//! Contact form component
//!
//! Headless model of the browser form: controlled field values, a status
//! machine and the submit sequence. Rendering is left to the caller through
//! [`ContactForm::view`]; the network and the challenge widget sit behind
//! [`FormTransport`] and [`ChallengeWidget`].
//!
//! ```text
//! Idle ──submit──▶ Submitting ──ok──▶ Success (terminal)
//!   ▲                   │
//!   └──── Error ◀──fail─┘   (inputs re-enabled, resubmission allowed)
//! ```

use async_trait::async_trait;
use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::{ContactConfig, SubmissionPayload, SuccessAction};
use crate::utils::constants::{
    FORM_DEFAULT_SUCCESS_MESSAGE, MSG_CHALLENGE_REQUIRED, MSG_GENERIC_FAILURE, NONCE_HEADER,
};

/// Configuration injected into the form (served by `GET /v1/contact/config`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormProps {
    pub endpoint: String,
    pub rest_nonce: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turnstile_site_key: Option<String>,
    pub subjects: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newsletter_notice: Option<String>,
    #[serde(default = "default_success_message")]
    pub success_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_action: Option<SuccessAction>,
}

fn default_success_message() -> String {
    FORM_DEFAULT_SUCCESS_MESSAGE.to_string()
}

impl FormProps {
    /// Props for a freshly rendered form
    pub fn from_config(config: &ContactConfig, rest_nonce: String) -> Self {
        Self {
            endpoint: config.public_endpoint.clone(),
            rest_nonce,
            turnstile_site_key: config.challenge_site_key().map(String::from),
            subjects: config.subjects.clone(),
            newsletter_notice: config.newsletter_notice.clone(),
            success_message: config.success_message.clone(),
            success_action: config.success_action.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormStatus {
    Idle,
    Submitting,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Email,
    Subject,
    Message,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// HTTP reply as the form sees it
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl TransportResponse {
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Server-provided `message`, if any
    pub fn message(&self) -> Option<&str> {
        self.body
            .get("message")
            .and_then(|m| m.as_str())
            .filter(|m| !m.is_empty())
    }
}

#[async_trait]
pub trait FormTransport: Send + Sync {
    async fn post(&self, endpoint: &str, nonce: &str, payload: &SubmissionPayload) -> Result<TransportResponse>;
}

#[async_trait]
impl<T: FormTransport + ?Sized> FormTransport for Arc<T> {
    async fn post(&self, endpoint: &str, nonce: &str, payload: &SubmissionPayload) -> Result<TransportResponse> {
        (**self).post(endpoint, nonce, payload).await
    }
}

/// Request produced by [`ContactForm::begin_submit`], to be posted by the
/// caller and resolved with [`ContactForm::finish`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmission {
    pub endpoint: String,
    pub nonce: String,
    pub payload: SubmissionPayload,
}

/// The challenge widget rendered next to the form
pub trait ChallengeWidget: Send {
    /// Current response token, empty until solved
    fn response(&self) -> String;
    /// Discard the current token; tokens are single-use
    fn reset(&mut self);
}

/// What the caller should render
#[derive(Debug, PartialEq, Eq)]
pub enum FormView<'a> {
    Success {
        message: &'a str,
        action: Option<&'a SuccessAction>,
    },
    Form {
        data: &'a FormData,
        error: Option<&'a str>,
        disabled: bool,
        submit_label: &'static str,
        subjects: &'a [String],
        newsletter_notice: Option<&'a str>,
        show_challenge: bool,
    },
}

type SuccessCallback = Box<dyn FnMut() + Send>;
type ErrorCallback = Box<dyn FnMut(&str) + Send>;

pub struct ContactForm<T: FormTransport> {
    props: FormProps,
    transport: T,
    widget: Option<Box<dyn ChallengeWidget>>,
    status: FormStatus,
    error_message: String,
    data: FormData,
    on_success: Option<SuccessCallback>,
    on_error: Option<ErrorCallback>,
}

impl<T: FormTransport> ContactForm<T> {
    pub fn new(props: FormProps, transport: T) -> Self {
        Self {
            props,
            transport,
            widget: None,
            status: FormStatus::Idle,
            error_message: String::new(),
            data: FormData::default(),
            on_success: None,
            on_error: None,
        }
    }

    /// Attach the rendered challenge widget. Ignored when no site key is set.
    pub fn with_widget(mut self, widget: Box<dyn ChallengeWidget>) -> Self {
        if self.props.turnstile_site_key.is_some() {
            self.widget = Some(widget);
        }
        self
    }

    pub fn on_success(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.on_success = Some(Box::new(callback));
        self
    }

    pub fn on_error(mut self, callback: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    pub fn status(&self) -> FormStatus {
        self.status
    }

    pub fn error_message(&self) -> Option<&str> {
        match self.status {
            FormStatus::Error if !self.error_message.is_empty() => Some(&self.error_message),
            _ => None,
        }
    }

    pub fn data(&self) -> &FormData {
        &self.data
    }

    pub fn inputs_disabled(&self) -> bool {
        self.status == FormStatus::Submitting
    }

    /// Controlled input update. No effect while submitting or after success.
    pub fn set_field(&mut self, field: FormField, value: impl Into<String>) {
        if self.inputs_disabled() || self.status == FormStatus::Success {
            return;
        }
        let value = value.into();
        match field {
            FormField::Name => self.data.name = value,
            FormField::Email => self.data.email = value,
            FormField::Subject => self.data.subject = value,
            FormField::Message => self.data.message = value,
        }
    }

    pub fn view(&self) -> FormView<'_> {
        if self.status == FormStatus::Success {
            return FormView::Success {
                message: &self.props.success_message,
                action: self.props.success_action.as_ref(),
            };
        }

        FormView::Form {
            data: &self.data,
            error: self.error_message(),
            disabled: self.inputs_disabled(),
            submit_label: if self.inputs_disabled() {
                "Sending..."
            } else {
                "Send Message"
            },
            subjects: &self.props.subjects,
            newsletter_notice: self.props.newsletter_notice.as_deref(),
            show_challenge: self.props.turnstile_site_key.is_some(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Submit the current values and wait for the reply. Returns the status
    /// afterwards.
    ///
    /// Holds the form for the whole round trip; callers that render while
    /// the request is in flight use [`begin_submit`](Self::begin_submit) and
    /// [`finish`](Self::finish) instead.
    pub async fn submit(&mut self) -> FormStatus {
        let pending = match self.begin_submit() {
            Some(pending) => pending,
            None => return self.status,
        };
        let result = self
            .transport
            .post(&pending.endpoint, &pending.nonce, &pending.payload)
            .await;
        self.finish(result)
    }

    /// First half of a submit: run the local checks and move to
    /// `Submitting`.
    ///
    /// Returns `None` when nothing should be sent: already submitting,
    /// already succeeded, or the challenge has no token yet.
    pub fn begin_submit(&mut self) -> Option<PendingSubmission> {
        if matches!(self.status, FormStatus::Submitting | FormStatus::Success) {
            return None;
        }

        let token = self.challenge_response();
        if self.props.turnstile_site_key.is_some() && token.is_empty() {
            self.status = FormStatus::Error;
            self.error_message = MSG_CHALLENGE_REQUIRED.to_string();
            return None;
        }

        self.status = FormStatus::Submitting;
        self.error_message.clear();

        Some(PendingSubmission {
            endpoint: self.props.endpoint.clone(),
            nonce: self.props.rest_nonce.clone(),
            payload: SubmissionPayload {
                name: self.data.name.clone(),
                email: self.data.email.clone(),
                subject: self.data.subject.clone(),
                message: self.data.message.clone(),
                turnstile_response: Some(token),
                newsletter_consent: false,
            },
        })
    }

    /// Second half of a submit: apply the transport result. No effect
    /// unless the form is `Submitting`.
    pub fn finish(&mut self, result: Result<TransportResponse>) -> FormStatus {
        if self.status != FormStatus::Submitting {
            return self.status;
        }

        match result {
            Ok(response) if response.is_ok() => {
                self.status = FormStatus::Success;
                if let Some(callback) = self.on_success.as_mut() {
                    callback();
                }
            }
            Ok(response) => {
                let message = response.message().unwrap_or(MSG_GENERIC_FAILURE).to_string();
                debug!(status = response.status, "Submission rejected by server");
                self.fail(message);
            }
            Err(e) => {
                warn!(error = %e, "Submission request failed");
                self.fail(MSG_GENERIC_FAILURE.to_string());
            }
        }

        self.status
    }

    fn challenge_response(&self) -> String {
        if self.props.turnstile_site_key.is_none() {
            return String::new();
        }
        self.widget
            .as_ref()
            .map(|w| w.response().trim().to_string())
            .unwrap_or_default()
    }

    fn fail(&mut self, message: String) {
        self.status = FormStatus::Error;
        self.error_message = message;
        if let Some(widget) = self.widget.as_mut() {
            widget.reset();
        }
        if let Some(callback) = self.on_error.as_mut() {
            callback(&self.error_message);
        }
    }
}

/// reqwest-backed transport: JSON POST with the nonce header
pub struct HttpFormTransport {
    client: reqwest::Client,
}

impl Default for HttpFormTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFormTransport {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FormTransport for HttpFormTransport {
    async fn post(&self, endpoint: &str, nonce: &str, payload: &SubmissionPayload) -> Result<TransportResponse> {
        let response = self
            .client
            .post(endpoint)
            .header(NONCE_HEADER, nonce)
            .json(payload)
            .send()
            .await
            .map_err(|e| eyre!("Contact endpoint request failed: {}", e))?;

        let status = response.status().as_u16();
        let body = response.json().await.unwrap_or(serde_json::Value::Null);
        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct ScriptedTransport {
        replies: Mutex<Vec<Result<TransportResponse>>>,
        sent: Arc<Mutex<Vec<(String, SubmissionPayload)>>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<Result<TransportResponse>>) -> Self {
            Self {
                replies: Mutex::new(replies),
                sent: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl FormTransport for ScriptedTransport {
        async fn post(&self, _endpoint: &str, nonce: &str, payload: &SubmissionPayload) -> Result<TransportResponse> {
            self.sent.lock().unwrap().push((nonce.to_string(), payload.clone()));
            self.replies.lock().unwrap().remove(0)
        }
    }

    struct FakeWidget {
        token: String,
        resets: Arc<AtomicUsize>,
    }

    impl ChallengeWidget for FakeWidget {
        fn response(&self) -> String {
            self.token.clone()
        }
        fn reset(&mut self) {
            self.token.clear();
            self.resets.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn reply(status: u16, body: serde_json::Value) -> Result<TransportResponse> {
        Ok(TransportResponse { status, body })
    }

    fn props(site_key: Option<&str>) -> FormProps {
        FormProps {
            endpoint: "/v1/contact/submit".to_string(),
            rest_nonce: "nonce123".to_string(),
            turnstile_site_key: site_key.map(String::from),
            subjects: vec!["General Inquiry".to_string(), "Other".to_string()],
            newsletter_notice: None,
            success_message: FORM_DEFAULT_SUCCESS_MESSAGE.to_string(),
            success_action: Some(SuccessAction {
                label: "Read the blog".to_string(),
                url: "/blog/".to_string(),
            }),
        }
    }

    fn fill<T: FormTransport>(form: &mut ContactForm<T>) {
        form.set_field(FormField::Name, "Jane Doe");
        form.set_field(FormField::Email, "jane@example.com");
        form.set_field(FormField::Subject, "General Inquiry");
        form.set_field(FormField::Message, "Hello");
    }

    #[tokio::test]
    async fn test_missing_token_blocks_locally() {
        let transport = ScriptedTransport::new(vec![]);
        let sent = transport.sent.clone();
        let mut form = ContactForm::new(props(Some("0xSITE")), transport);
        fill(&mut form);

        assert_eq!(form.submit().await, FormStatus::Error);
        assert_eq!(form.error_message(), Some(MSG_CHALLENGE_REQUIRED));
        assert!(sent.lock().unwrap().is_empty());
        // Inputs stay editable
        assert!(!form.inputs_disabled());
    }

    #[tokio::test]
    async fn test_success_is_terminal() {
        let transport = ScriptedTransport::new(vec![reply(200, serde_json::json!({"success": true}))]);
        let sent = transport.sent.clone();
        let successes = Arc::new(AtomicUsize::new(0));
        let counter = successes.clone();
        let mut form = ContactForm::new(props(None), transport).on_success(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        fill(&mut form);

        assert_eq!(form.submit().await, FormStatus::Success);
        assert_eq!(successes.load(Ordering::SeqCst), 1);
        {
            let sent = sent.lock().unwrap();
            assert_eq!(sent[0].0, "nonce123");
            assert_eq!(sent[0].1.turnstile_response.as_deref(), Some(""));
            assert_eq!(sent[0].1.name, "Jane Doe");
        }

        // No second request from the same form
        assert_eq!(form.submit().await, FormStatus::Success);
        assert_eq!(sent.lock().unwrap().len(), 1);

        form.set_field(FormField::Name, "Changed");
        assert_eq!(form.data().name, "Jane Doe");

        match form.view() {
            FormView::Success { message, action } => {
                assert_eq!(message, FORM_DEFAULT_SUCCESS_MESSAGE);
                assert_eq!(action.map(|a| a.url.as_str()), Some("/blog/"));
            }
            other => panic!("unexpected view: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_resets_widget_and_allows_retry() {
        let transport = ScriptedTransport::new(vec![reply(
            400,
            serde_json::json!({"success": false, "message": "Security verification failed. Please try again.", "code": "challenge_invalid"}),
        )]);
        let sent = transport.sent.clone();
        let resets = Arc::new(AtomicUsize::new(0));
        let errors = Arc::new(Mutex::new(Vec::<String>::new()));
        let seen = errors.clone();
        let mut form = ContactForm::new(props(Some("0xSITE")), transport)
            .with_widget(Box::new(FakeWidget {
                token: "tok-1".to_string(),
                resets: resets.clone(),
            }))
            .on_error(move |msg| seen.lock().unwrap().push(msg.to_string()));
        fill(&mut form);

        assert_eq!(form.submit().await, FormStatus::Error);
        assert_eq!(form.error_message(), Some("Security verification failed. Please try again."));
        assert_eq!(resets.load(Ordering::SeqCst), 1);
        assert_eq!(errors.lock().unwrap().len(), 1);
        assert_eq!(sent.lock().unwrap()[0].1.turnstile_response.as_deref(), Some("tok-1"));

        // Widget was reset, so the next attempt needs a fresh token
        assert_eq!(form.submit().await, FormStatus::Error);
        assert_eq!(form.error_message(), Some(MSG_CHALLENGE_REQUIRED));
        assert_eq!(sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_uses_generic_message() {
        let transport = ScriptedTransport::new(vec![
            Err(eyre!("connection refused")),
            reply(500, serde_json::Value::Null),
        ]);
        let mut form = ContactForm::new(props(None), transport);
        fill(&mut form);

        assert_eq!(form.submit().await, FormStatus::Error);
        assert_eq!(form.error_message(), Some(MSG_GENERIC_FAILURE));

        assert_eq!(form.submit().await, FormStatus::Error);
        assert_eq!(form.error_message(), Some(MSG_GENERIC_FAILURE));
    }

    /// Transport whose reply is released by the test
    struct GatedTransport {
        gate: Mutex<Option<tokio::sync::oneshot::Receiver<TransportResponse>>>,
    }

    #[async_trait]
    impl FormTransport for GatedTransport {
        async fn post(&self, _endpoint: &str, _nonce: &str, _payload: &SubmissionPayload) -> Result<TransportResponse> {
            let gate = self.gate.lock().unwrap().take();
            match gate {
                Some(rx) => rx.await.map_err(|_| eyre!("gate dropped")),
                None => Err(eyre!("already used")),
            }
        }
    }

    #[tokio::test]
    async fn test_busy_state_visible_while_request_pending() {
        let (release, gate) = tokio::sync::oneshot::channel();
        let transport = Arc::new(GatedTransport {
            gate: Mutex::new(Some(gate)),
        });
        let mut form = ContactForm::new(props(None), transport.clone());
        fill(&mut form);

        let pending = form.begin_submit().unwrap();
        assert_eq!(pending.nonce, "nonce123");
        assert_eq!(pending.payload.subject, "General Inquiry");

        let in_flight = tokio::spawn(async move {
            transport
                .post(&pending.endpoint, &pending.nonce, &pending.payload)
                .await
        });
        tokio::task::yield_now().await;
        assert!(!in_flight.is_finished());

        assert_eq!(form.status(), FormStatus::Submitting);
        match form.view() {
            FormView::Form {
                disabled,
                submit_label,
                error,
                ..
            } => {
                assert!(disabled);
                assert_eq!(submit_label, "Sending...");
                assert!(error.is_none());
            }
            other => panic!("unexpected view: {:?}", other),
        }

        // Inputs and resubmission are locked while in flight
        form.set_field(FormField::Name, "Someone Else");
        assert_eq!(form.data().name, "Jane Doe");
        assert!(form.begin_submit().is_none());

        release
            .send(TransportResponse {
                status: 200,
                body: serde_json::json!({"success": true}),
            })
            .unwrap();
        let result = in_flight.await.unwrap();
        assert_eq!(form.finish(result), FormStatus::Success);
        assert!(matches!(form.view(), FormView::Success { .. }));
    }

    #[tokio::test]
    async fn test_finish_ignored_unless_submitting() {
        let mut form = ContactForm::new(props(None), ScriptedTransport::new(vec![]));
        let status = form.finish(reply(200, serde_json::Value::Null));
        assert_eq!(status, FormStatus::Idle);
    }

    #[test]
    fn test_idle_view() {
        let form = ContactForm::new(props(Some("0xSITE")), ScriptedTransport::new(vec![]));
        match form.view() {
            FormView::Form {
                error,
                disabled,
                submit_label,
                subjects,
                show_challenge,
                ..
            } => {
                assert!(error.is_none());
                assert!(!disabled);
                assert_eq!(submit_label, "Send Message");
                assert_eq!(subjects.len(), 2);
                assert!(show_challenge);
            }
            other => panic!("unexpected view: {:?}", other),
        }
    }

    #[test]
    fn test_props_wire_format() {
        let json = serde_json::to_value(props(Some("0xSITE"))).unwrap();
        assert_eq!(json["restNonce"], "nonce123");
        assert_eq!(json["turnstileSiteKey"], "0xSITE");
        assert_eq!(json["successAction"]["label"], "Read the blog");

        let parsed: FormProps = serde_json::from_value(serde_json::json!({
            "endpoint": "/x",
            "restNonce": "n",
            "subjects": ["Other"]
        }))
        .unwrap();
        assert_eq!(parsed.success_message, FORM_DEFAULT_SUCCESS_MESSAGE);
        assert!(parsed.turnstile_site_key.is_none());
    }
}
