//! Newsletter boundary and Sendy client
//!
//! Sendy API: POST {url}/subscribe, form `{api_key, list, email, boolean=true}`.
//! Plain-text reply: `1` (or `true`) on success, `Already subscribed.` is
//! treated as success too, anything else is an error message.

use async_trait::async_trait;
use eyre::{eyre, Result};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::collections::HashMap;
use tracing::debug;

use crate::models::NewsletterConfig;
use crate::utils::constants::USER_AGENT as USER_AGENT_CONST;

#[async_trait]
pub trait NewsletterSubscriber: Send + Sync {
    /// Subscribe `email` to the list registered under `list_tag`
    async fn subscribe(&self, email: &str, list_tag: &str) -> Result<()>;
}

pub struct SendyClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    lists: HashMap<String, String>,
}

impl std::fmt::Debug for SendyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendyClient")
            .field("base_url", &self.base_url)
            .field("lists", &self.lists)
            .finish_non_exhaustive()
    }
}

impl SendyClient {
    pub fn new(config: &NewsletterConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| eyre!("Failed to build Sendy client: {}", e))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            lists: config.lists.clone(),
        })
    }

    /// Sendy list id for a tag
    pub fn list_id(&self, list_tag: &str) -> Option<&str> {
        self.lists.get(list_tag).map(String::as_str)
    }
}

/// Interpret Sendy's plain-text subscribe reply
pub fn parse_subscribe_reply(body: &str) -> Result<()> {
    match body.trim() {
        "1" | "true" | "Already subscribed." => Ok(()),
        other => Err(eyre!("Sendy subscribe failed: {}", other)),
    }
}

#[async_trait]
impl NewsletterSubscriber for SendyClient {
    async fn subscribe(&self, email: &str, list_tag: &str) -> Result<()> {
        let list = self
            .list_id(list_tag)
            .ok_or_else(|| eyre!("No Sendy list configured for tag '{}'", list_tag))?;

        let url = format!("{}/subscribe", self.base_url);
        let form = [
            ("api_key", self.api_key.as_str()),
            ("list", list),
            ("email", email),
            ("boolean", "true"),
        ];

        let response = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| eyre!("Sendy request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(eyre!("Sendy API error: {}", response.status()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| eyre!("Failed to read Sendy response: {}", e))?;

        parse_subscribe_reply(&body)?;
        debug!(list_tag, "Newsletter subscription accepted");
        Ok(())
    }
}
