//! Configuration module for the contact service
//!
//! Everything deployment-specific comes from the environment. Secrets have
//! no fallback values in source.

use rand::RngCore;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

use super::errors::{AppError, AppResult};
use super::types::{ResourceLink, SuccessAction};
use crate::core::validation::is_email;
use crate::utils::constants::{
    DEFAULT_FLASH_TTL_SECS, DEFAULT_HOST, DEFAULT_NEWSLETTER_LIST, DEFAULT_NEWSLETTER_NOTICE,
    DEFAULT_NONCE_LIFETIME_SECS, DEFAULT_OUTBOUND_TIMEOUT_SECS, DEFAULT_PORT,
    DEFAULT_PUBLIC_ENDPOINT, DEFAULT_REDIRECT_URL, DEFAULT_RESPONSE_WINDOW, DEFAULT_SITE_NAME,
    DEFAULT_SUBJECTS, DEFAULT_SUCCESS_MESSAGE, DEFAULT_VERIFY_TIMEOUT_SECS, TURNSTILE_VERIFY_URL,
};

/// Turnstile keys and verifier settings
#[derive(Debug, Clone)]
pub struct ChallengeConfig {
    /// Public site key handed to the client widget
    pub site_key: String,
    /// Server-held secret, never logged
    pub secret_key: String,
    pub verify_url: String,
    pub timeout: Duration,
}

/// HTTP mail relay endpoint
#[derive(Debug, Clone)]
pub struct MailRelayConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

/// Sendy installation and tag → list id mapping
#[derive(Debug, Clone)]
pub struct NewsletterConfig {
    pub url: String,
    pub api_key: String,
    pub lists: HashMap<String, String>,
    pub timeout: Duration,
}

/// Bind address of the API server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Configuration for the contact service
#[derive(Debug, Clone)]
pub struct ContactConfig {
    /// Admin notification address
    pub admin_email: String,
    /// Sender display name for confirmations
    pub site_name: String,
    /// Enumerated subjects accepted by the form
    pub subjects: Vec<String>,
    /// Challenge settings; `None` disables the challenge gate
    pub challenge: Option<ChallengeConfig>,
    /// HMAC key for nonces and flash notices
    pub nonce_secret: Vec<u8>,
    pub nonce_lifetime_secs: i64,
    pub flash_ttl_secs: i64,
    /// Mail relay; `None` selects the logging mailer
    pub mail: Option<MailRelayConfig>,
    /// Newsletter integration; `None` skips newsletter sync
    pub newsletter: Option<NewsletterConfig>,
    /// List tag submissions are subscribed under
    pub newsletter_list: String,
    /// Only subscribe submitters that opted in
    pub newsletter_requires_consent: bool,
    pub newsletter_notice: Option<String>,
    pub success_message: String,
    pub success_action: Option<SuccessAction>,
    /// Redirect target for the form-encoded endpoint
    pub redirect_url: String,
    /// Links listed in the confirmation email
    pub resource_links: Vec<ResourceLink>,
    /// Promised reply time quoted in the confirmation email
    pub response_window: String,
    /// Endpoint URL advertised to the client form
    pub public_endpoint: String,
    /// Take the client address from `X-Forwarded-For` / `X-Real-IP`.
    /// Only safe behind a proxy that overwrites those headers.
    pub trust_proxy_headers: bool,
    pub server: ServerConfig,
}

impl ContactConfig {
    /// Minimal configuration with defaults for everything but the admin address.
    ///
    /// The nonce secret is random, so tokens do not survive a restart.
    pub fn new(admin_email: impl Into<String>) -> Self {
        Self {
            admin_email: admin_email.into(),
            site_name: DEFAULT_SITE_NAME.to_string(),
            subjects: DEFAULT_SUBJECTS.iter().map(|s| s.to_string()).collect(),
            challenge: None,
            nonce_secret: random_secret(),
            nonce_lifetime_secs: DEFAULT_NONCE_LIFETIME_SECS,
            flash_ttl_secs: DEFAULT_FLASH_TTL_SECS,
            mail: None,
            newsletter: None,
            newsletter_list: DEFAULT_NEWSLETTER_LIST.to_string(),
            newsletter_requires_consent: false,
            newsletter_notice: Some(DEFAULT_NEWSLETTER_NOTICE.to_string()),
            success_message: DEFAULT_SUCCESS_MESSAGE.to_string(),
            success_action: None,
            redirect_url: DEFAULT_REDIRECT_URL.to_string(),
            resource_links: Vec::new(),
            response_window: DEFAULT_RESPONSE_WINDOW.to_string(),
            public_endpoint: DEFAULT_PUBLIC_ENDPOINT.to_string(),
            trust_proxy_headers: false,
            server: ServerConfig::default(),
        }
    }

    /// Enable the challenge gate with the default verifier endpoint
    pub fn with_challenge(mut self, site_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        self.challenge = Some(ChallengeConfig {
            site_key: site_key.into(),
            secret_key: secret_key.into(),
            verify_url: TURNSTILE_VERIFY_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_VERIFY_TIMEOUT_SECS),
        });
        self
    }

    pub fn with_nonce_secret(mut self, secret: impl Into<Vec<u8>>) -> Self {
        self.nonce_secret = secret.into();
        self
    }

    /// Site key if the challenge gate is configured
    pub fn challenge_site_key(&self) -> Option<&str> {
        self.challenge.as_ref().map(|c| c.site_key.as_str())
    }

    pub fn is_valid_subject(&self, subject: &str) -> bool {
        self.subjects.iter().any(|s| s == subject)
    }

    /// Load from process environment
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let admin_email = get("CONTACT_ADMIN_EMAIL").ok_or_else(|| AppError::missing_env("CONTACT_ADMIN_EMAIL"))?;
        if !is_email(&admin_email) {
            return Err(AppError::invalid_config("CONTACT_ADMIN_EMAIL", "not an email address"));
        }

        let mut config = Self::new(admin_email);

        if let Some(site_name) = get("CONTACT_SITE_NAME") {
            config.site_name = site_name;
        }

        if let Some(raw) = get("CONTACT_SUBJECTS") {
            let subjects: Vec<String> = raw
                .split('|')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            if subjects.is_empty() {
                return Err(AppError::invalid_config("CONTACT_SUBJECTS", "no subjects listed"));
            }
            config.subjects = subjects;
        }

        // Challenge: a site key without its secret is a broken deployment
        if let Some(site_key) = get("TURNSTILE_SITE_KEY") {
            let secret_key = get("TURNSTILE_SECRET_KEY").ok_or_else(|| AppError::missing_env("TURNSTILE_SECRET_KEY"))?;
            let timeout_secs = parse_or(&get, "TURNSTILE_TIMEOUT_SECS", DEFAULT_VERIFY_TIMEOUT_SECS)?;
            config.challenge = Some(ChallengeConfig {
                site_key,
                secret_key,
                verify_url: get("TURNSTILE_VERIFY_URL").unwrap_or_else(|| TURNSTILE_VERIFY_URL.to_string()),
                timeout: Duration::from_secs(timeout_secs),
            });
            info!("🔑 Turnstile challenge enabled (secret hidden)");
        } else {
            warn!("⚠️ TURNSTILE_SITE_KEY not set - challenge verification disabled");
        }

        match get("CONTACT_NONCE_SECRET") {
            Some(secret) => config.nonce_secret = secret.into_bytes(),
            None => warn!("⚠️ CONTACT_NONCE_SECRET not set - using a per-process secret, nonces reset on restart"),
        }
        config.nonce_lifetime_secs = parse_or(&get, "CONTACT_NONCE_LIFETIME_SECS", DEFAULT_NONCE_LIFETIME_SECS)?;
        if config.nonce_lifetime_secs < 2 {
            return Err(AppError::invalid_config("CONTACT_NONCE_LIFETIME_SECS", "must be at least 2"));
        }
        config.flash_ttl_secs = parse_or(&get, "CONTACT_FLASH_TTL_SECS", DEFAULT_FLASH_TTL_SECS)?;

        let outbound_timeout = Duration::from_secs(parse_or(&get, "CONTACT_OUTBOUND_TIMEOUT_SECS", DEFAULT_OUTBOUND_TIMEOUT_SECS)?);

        match get("MAIL_API_URL") {
            Some(url) => {
                config.mail = Some(MailRelayConfig {
                    url,
                    api_key: get("MAIL_API_KEY"),
                    timeout: outbound_timeout,
                });
            }
            None => warn!("⚠️ MAIL_API_URL not set - emails will only be logged"),
        }

        if let Some(url) = get("SENDY_URL") {
            let api_key = get("SENDY_API_KEY").ok_or_else(|| AppError::missing_env("SENDY_API_KEY"))?;
            let lists = match get("SENDY_LISTS") {
                Some(raw) => parse_pairs(&raw)
                    .ok_or_else(|| AppError::invalid_config("SENDY_LISTS", "expected tag=list_id pairs"))?
                    .into_iter()
                    .collect(),
                None => HashMap::new(),
            };
            config.newsletter = Some(NewsletterConfig {
                url,
                api_key,
                lists,
                timeout: outbound_timeout,
            });
        }
        if let Some(list) = get("CONTACT_NEWSLETTER_LIST") {
            config.newsletter_list = list;
        }
        config.newsletter_requires_consent = parse_or(&get, "CONTACT_NEWSLETTER_REQUIRES_CONSENT", false)?;
        // An explicitly empty notice hides it
        if let Some(notice) = lookup("CONTACT_NEWSLETTER_NOTICE") {
            let notice = notice.trim().to_string();
            config.newsletter_notice = if notice.is_empty() { None } else { Some(notice) };
        }

        if let Some(message) = get("CONTACT_SUCCESS_MESSAGE") {
            config.success_message = message;
        }
        config.success_action = match (get("CONTACT_SUCCESS_ACTION_LABEL"), get("CONTACT_SUCCESS_ACTION_URL")) {
            (Some(label), Some(url)) => Some(SuccessAction { label, url }),
            (None, None) => None,
            _ => {
                return Err(AppError::invalid_config(
                    "CONTACT_SUCCESS_ACTION_LABEL",
                    "label and url must be set together",
                ))
            }
        };
        if let Some(url) = get("CONTACT_REDIRECT_URL") {
            config.redirect_url = url;
        }
        if let Some(raw) = get("CONTACT_RESOURCE_LINKS") {
            config.resource_links = parse_pairs(&raw)
                .ok_or_else(|| AppError::invalid_config("CONTACT_RESOURCE_LINKS", "expected Label=url pairs"))?
                .into_iter()
                .map(|(label, url)| ResourceLink { label, url })
                .collect();
        }
        if let Some(window) = get("CONTACT_RESPONSE_WINDOW") {
            config.response_window = window;
        }
        if let Some(endpoint) = get("CONTACT_PUBLIC_ENDPOINT") {
            config.public_endpoint = endpoint;
        }

        config.trust_proxy_headers = parse_or(&get, "CONTACT_TRUST_PROXY", false)?;

        // PORT is what most hosts inject; CONTACT_PORT for local dev
        config.server = ServerConfig {
            host: get("CONTACT_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: match get("PORT").or_else(|| get("CONTACT_PORT")) {
                Some(raw) => raw.parse().map_err(|e| AppError::invalid_config("PORT", e))?,
                None => DEFAULT_PORT,
            },
        };

        Ok(config)
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> AppResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse().map_err(|e| AppError::invalid_config(key, e)),
        None => Ok(default),
    }
}

/// Parse `a=b,c=d`. Splits on the first `=` so URLs with query strings survive.
fn parse_pairs(raw: &str) -> Option<Vec<(String, String)>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (key, value) = entry.split_once('=')?;
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() || value.is_empty() {
                return None;
            }
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

fn random_secret() -> Vec<u8> {
    let mut secret = vec![0u8; 32];
    rand::thread_rng().fill_bytes(&mut secret);
    secret
}
