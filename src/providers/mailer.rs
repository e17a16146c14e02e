//! Mail boundary
//!
//! `Mailer::send` hands a message to a transport. Acceptance is all this
//! service observes; delivery belongs to the transport.

use async_trait::async_trait;
use eyre::{eyre, Result};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use tracing::{debug, info};

use crate::models::{MailMessage, MailRelayConfig};
use crate::utils::constants::USER_AGENT as USER_AGENT_CONST;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<()>;
}

/// JSON body posted to the relay
#[derive(Debug, Serialize)]
struct RelayRequest<'a> {
    to: &'a str,
    subject: &'a str,
    html: &'a str,
    headers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

/// Sends mail through an HTTP relay (`POST {url}` with a JSON message,
/// optional bearer key). Any 2xx status counts as accepted.
pub struct HttpMailer {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpMailer {
    pub fn new(config: &MailRelayConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| eyre!("Failed to build mail relay client: {}", e))?;

        Ok(Self {
            client,
            url: config.url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &MailMessage) -> Result<()> {
        let body = RelayRequest {
            to: &message.to,
            subject: &message.subject,
            html: &message.html_body,
            headers: message.headers(),
            from: message.from.as_deref(),
            reply_to: message.reply_to.as_deref(),
        };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| eyre!("Mail relay request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(eyre!("Mail relay rejected message: {}", response.status()));
        }

        debug!(subject = %message.subject, "Mail accepted by relay");
        Ok(())
    }
}

/// Development mailer: logs the envelope and drops the message
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &MailMessage) -> Result<()> {
        info!(
            subject = %message.subject,
            body_bytes = message.html_body.len(),
            "📭 Mail not sent (no relay configured)"
        );
        Ok(())
    }
}
