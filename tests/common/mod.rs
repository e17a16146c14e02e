//! Shared fakes and router builder for the HTTP tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{body::Body, http::Request, Router};
use extrachill_contact::api::{create_router, AppState};
use extrachill_contact::models::{ChallengeVerification, ContactConfig, MailMessage};
use extrachill_contact::providers::{ChallengeVerifier, Mailer, NewsletterSubscriber};
use extrachill_contact::utils::constants::FORM_NONCE_ACTION;
use extrachill_contact::SubmissionService;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const TEST_SECRET: &[u8] = b"integration-secret";

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<MailMessage>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &MailMessage) -> eyre::Result<()> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

pub struct StubVerifier {
    pub success: bool,
    pub calls: AtomicUsize,
    pub remote_ips: Mutex<Vec<Option<String>>>,
}

impl StubVerifier {
    pub fn new(success: bool) -> Self {
        Self {
            success,
            calls: AtomicUsize::new(0),
            remote_ips: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn remote_ips(&self) -> Vec<Option<String>> {
        self.remote_ips.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChallengeVerifier for StubVerifier {
    async fn verify(&self, _token: &str, remote_ip: Option<&str>) -> eyre::Result<ChallengeVerification> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.remote_ips.lock().unwrap().push(remote_ip.map(String::from));
        Ok(ChallengeVerification {
            success: self.success,
            ..Default::default()
        })
    }
}

pub struct BrokenNewsletter {
    pub calls: AtomicUsize,
}

impl BrokenNewsletter {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NewsletterSubscriber for BrokenNewsletter {
    async fn subscribe(&self, _email: &str, _list_tag: &str) -> eyre::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(eyre::eyre!("sendy unavailable"))
    }
}

pub struct TestApp {
    pub router: Router,
    pub service: Arc<SubmissionService>,
    pub mailer: Arc<RecordingMailer>,
    pub verifier: Arc<StubVerifier>,
    pub newsletter: Arc<BrokenNewsletter>,
}

pub fn config() -> ContactConfig {
    ContactConfig::new("admin@example.com")
        .with_challenge("0xSITE", "0xSECRET")
        .with_nonce_secret(TEST_SECRET.to_vec())
}

pub fn app(verifier_says: bool) -> TestApp {
    app_with(config(), verifier_says)
}

pub fn app_with(config: ContactConfig, verifier_says: bool) -> TestApp {
    let mailer = Arc::new(RecordingMailer::default());
    let verifier = Arc::new(StubVerifier::new(verifier_says));
    let newsletter = Arc::new(BrokenNewsletter {
        calls: AtomicUsize::new(0),
    });

    let service = Arc::new(
        SubmissionService::new(Arc::new(config), mailer.clone())
            .with_verifier(verifier.clone())
            .with_newsletter(newsletter.clone()),
    );
    let router = create_router(Arc::new(AppState::new(service.clone())));

    TestApp {
        router,
        service,
        mailer,
        verifier,
        newsletter,
    }
}

pub fn json_submit(nonce: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/v1/contact/submit")
        .header("content-type", "application/json");
    if let Some(nonce) = nonce {
        builder = builder.header("X-WP-Nonce", nonce);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn jane(message: &str) -> serde_json::Value {
    serde_json::json!({
        "name": "Jane Doe",
        "email": "jane@example.com",
        "subject": "General Inquiry",
        "message": message,
        "turnstile_response": "valid-token"
    })
}

pub fn form_submit(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/contact/form")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

/// Jane's form fields with a valid nonce, plus `extra` appended verbatim
pub fn jane_form(service: &SubmissionService, extra: &str) -> String {
    format!(
        "contact_name=Jane+Doe&contact_email=jane%40example.com&contact_subject=General+Inquiry\
         &contact_message=Hello&cf-turnstile-response=tok&ec_contact_form_nonce={}{}",
        service.issue_nonce(FORM_NONCE_ACTION),
        extra
    )
}

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
