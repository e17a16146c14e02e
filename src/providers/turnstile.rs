//! Cloudflare Turnstile verification client
//!
//! API: POST https://challenges.cloudflare.com/turnstile/v0/siteverify
//! Form body `{secret, response, remoteip?}`, JSON reply `{success, error-codes, ...}`.
//!
//! Tokens are single-use. Any transport error, timeout, non-2xx status or
//! unparsable body is returned as `Err`; the caller fails closed.

use async_trait::async_trait;
use eyre::{eyre, Result};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::{ChallengeConfig, ChallengeVerification};
use crate::utils::constants::USER_AGENT as USER_AGENT_CONST;

/// Server-side challenge verification
#[async_trait]
pub trait ChallengeVerifier: Send + Sync {
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> Result<ChallengeVerification>;
}

/// Turnstile API client
pub struct TurnstileClient {
    client: reqwest::Client,
    verify_url: String,
    secret_key: String,
    timeout: Duration,
}

impl std::fmt::Debug for TurnstileClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnstileClient")
            .field("verify_url", &self.verify_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl TurnstileClient {
    pub fn new(config: &ChallengeConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| eyre!("Failed to build Turnstile HTTP client: {}", e))?;

        Ok(Self {
            client,
            verify_url: config.verify_url.clone(),
            secret_key: config.secret_key.clone(),
            timeout: config.timeout,
        })
    }
}

#[async_trait]
impl ChallengeVerifier for TurnstileClient {
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> Result<ChallengeVerification> {
        let mut form = vec![("secret", self.secret_key.as_str()), ("response", token)];
        if let Some(ip) = remote_ip {
            form.push(("remoteip", ip));
        }

        let response = self
            .client
            .post(&self.verify_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    eyre!("Turnstile verification timed out after {:?}", self.timeout)
                } else {
                    eyre!("Turnstile request failed: {}", e)
                }
            })?;

        if !response.status().is_success() {
            return Err(eyre!("Turnstile API error: {}", response.status()));
        }

        let verification: ChallengeVerification = response
            .json()
            .await
            .map_err(|e| eyre!("Failed to parse Turnstile response: {}", e))?;

        if verification.success {
            debug!(hostname = ?verification.hostname, "Turnstile token accepted");
        } else {
            warn!(error_codes = ?verification.error_codes, "Turnstile token rejected");
        }

        Ok(verification)
    }
}
