//! API Request Handlers

use axum::{
    extract::{
        rejection::FormRejection, rejection::JsonRejection, ConnectInfo, Form, Json, Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::Redirect,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use super::types::*;
use crate::core::{FlashNotice, FormProps, SubmissionService};
use crate::models::{AppError, ErrorCode, SubmissionPayload, SubmissionRequest};
use crate::utils::constants::{
    APP_VERSION, FLASH_QUERY_PARAM, FORM_NONCE_ACTION, NEWSLETTER_CONSENT_VALUE, NONCE_HEADER,
    REST_NONCE_ACTION,
};

/// Shared application state
pub struct AppState {
    pub service: Arc<SubmissionService>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(service: Arc<SubmissionService>) -> Self {
        Self {
            service,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

type ErrorReply = (StatusCode, Json<SubmissionResult>);

fn error_reply(err: &AppError) -> ErrorReply {
    let status = StatusCode::from_u16(err.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(SubmissionResult::from(err)))
}

/// Client address passed to the challenge verifier.
///
/// Forwarded headers are read only when `trust_proxy` is set (first hop of
/// `X-Forwarded-For`, else `X-Real-IP`); otherwise the socket peer is used.
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> Option<String> {
    let forwarded = || {
        headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(String::from)
    };

    trust_proxy
        .then(forwarded)
        .flatten()
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ============================================
// Health Check
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();
    let config = state.service.config();

    let data = HealthData {
        status: "healthy".to_string(),
        version: APP_VERSION.to_string(),
        uptime_seconds: state.uptime_seconds(),
        challenge_enabled: config.challenge.is_some(),
        newsletter_enabled: config.newsletter.is_some(),
    };

    Json(ApiResponse::success(
        data,
        start.elapsed().as_secs_f64() * 1000.0,
    ))
}

// ============================================
// Contact Submission (JSON)
// ============================================

pub async fn submit_contact(
    State(state): State<Arc<AppState>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Result<Json<SubmissionPayload>, JsonRejection>,
) -> Result<Json<SubmissionResult>, ErrorReply> {
    let nonce = headers
        .get(NONCE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    // Authenticity comes before looking at the body
    let authentic = nonce
        .as_deref()
        .map(|n| state.service.nonces().verify(n, REST_NONCE_ACTION))
        .unwrap_or(false);
    if !authentic {
        warn!(code = ErrorCode::AuthFailed.as_str(), "Rejected submission: bad or missing nonce");
        return Err(error_reply(&AppError::auth_failed()));
    }

    let Json(payload) = body.map_err(|rejection| {
        debug!(error = %rejection, "Unreadable submission body");
        error_reply(&AppError::validation("Invalid request body."))
    })?;

    let remote_ip = client_ip(
        &headers,
        peer.map(|ConnectInfo(addr)| addr),
        state.service.config().trust_proxy_headers,
    );
    let request = SubmissionRequest::from_payload(payload, nonce, remote_ip);
    match state.service.handle(request, REST_NONCE_ACTION).await {
        Ok(outcome) => Ok(Json(SubmissionResult::success(outcome.message))),
        Err(e) => Err(error_reply(&e)),
    }
}

// ============================================
// Contact Submission (form-encoded, redirect)
// ============================================

pub async fn submit_form(
    State(state): State<Arc<AppState>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    form: Result<Form<ContactFormFields>, FormRejection>,
) -> Redirect {
    let service = &state.service;
    let now = chrono::Utc::now().timestamp();

    let notice = match form {
        Ok(Form(fields)) => {
            let request = SubmissionRequest {
                nonce: non_empty(fields.ec_contact_form_nonce),
                name: fields.contact_name,
                email: fields.contact_email,
                subject: fields.contact_subject,
                message: fields.contact_message,
                challenge_token: non_empty(fields.turnstile_response),
                newsletter_consent: fields.newsletter_consent.as_deref().map(str::trim)
                    == Some(NEWSLETTER_CONSENT_VALUE),
                explicit_opt_in: true,
                remote_ip: client_ip(
                    &headers,
                    peer.map(|ConnectInfo(addr)| addr),
                    service.config().trust_proxy_headers,
                ),
            };
            match service.handle(request, FORM_NONCE_ACTION).await {
                Ok(_) => FlashNotice::success(now),
                Err(e) => FlashNotice::error(e.code.public_code(), now),
            }
        }
        Err(rejection) => {
            debug!(error = %rejection, "Unreadable form body");
            FlashNotice::error(ErrorCode::ValidationFailed.public_code(), now)
        }
    };

    let target = &service.config().redirect_url;
    let separator = if target.contains('?') { '&' } else { '?' };
    Redirect::to(&format!(
        "{}{}{}={}",
        target,
        separator,
        FLASH_QUERY_PARAM,
        notice.encode(service.nonces())
    ))
}

// ============================================
// Notice display
// ============================================

pub async fn get_notice(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NoticeQuery>,
) -> Result<Json<SubmissionResult>, ErrorReply> {
    let config = state.service.config();
    let raw = query
        .contact_notice
        .ok_or_else(|| error_reply(&AppError::flash_invalid("Missing notice.")))?;

    let notice = FlashNotice::decode(
        &raw,
        state.service.nonces(),
        config.flash_ttl_secs,
        chrono::Utc::now().timestamp(),
    )
    .map_err(|e| error_reply(&e))?;

    let message = notice.message(&config.success_message);
    Ok(Json(if notice.is_success() {
        SubmissionResult::success(message)
    } else {
        SubmissionResult::failure(&notice.code, message)
    }))
}

// ============================================
// Form config
// ============================================

pub async fn get_form_config(State(state): State<Arc<AppState>>) -> Json<FormConfigData> {
    let service = &state.service;
    Json(FormConfigData {
        props: FormProps::from_config(service.config(), service.issue_nonce(REST_NONCE_ACTION)),
        form_nonce: service.issue_nonce(FORM_NONCE_ACTION),
    })
}
