//! Constants Module - Single Source of Truth
//!
//! Every constant, default text and endpoint used by the contact service
//! is defined here. The subject list lives here once and is injected into
//! the client form config, the server validation and the email templates.

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "ExtraChillContact";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for outbound HTTP requests
pub const USER_AGENT: &str = concat!("ExtraChillContact/", env!("CARGO_PKG_VERSION"));

// ============================================
// SUBJECTS
// ============================================

/// Built-in subject list, used when `CONTACT_SUBJECTS` is not set
pub const DEFAULT_SUBJECTS: [&str; 5] = [
    "General Inquiry",
    "Partnership/Collaboration",
    "Shop/Store Support",
    "Technical Issue",
    "Other",
];

// ============================================
// CHALLENGE (Cloudflare Turnstile)
// ============================================

/// Turnstile server-side verification endpoint
pub const TURNSTILE_VERIFY_URL: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";

/// Verifier timeout (seconds). A timeout counts as a failed verification.
pub const DEFAULT_VERIFY_TIMEOUT_SECS: u64 = 10;

// ============================================
// ANTI-FORGERY
// ============================================

/// Header carrying the REST nonce
pub const NONCE_HEADER: &str = "X-WP-Nonce";

/// Nonce action for the JSON endpoint
pub const REST_NONCE_ACTION: &str = "wp_rest";

/// Nonce action for the form-encoded endpoint
pub const FORM_NONCE_ACTION: &str = "ec_contact_form_action";

/// Nonce lifetime (seconds), split into two ticks
pub const DEFAULT_NONCE_LIFETIME_SECS: i64 = 86_400;

/// Bytes of the HMAC kept in a nonce (hex encoded => 20 chars)
pub const NONCE_BYTES: usize = 10;

/// Flash notice validity window (seconds)
pub const DEFAULT_FLASH_TTL_SECS: i64 = 300;

/// Query parameter carrying the flash notice across the redirect
pub const FLASH_QUERY_PARAM: &str = "contact_notice";

// ============================================
// OUTBOUND MAIL / NEWSLETTER
// ============================================

/// Default timeout for mail relay and newsletter calls (seconds)
pub const DEFAULT_OUTBOUND_TIMEOUT_SECS: u64 = 15;

/// Default newsletter list tag for contact submissions
pub const DEFAULT_NEWSLETTER_LIST: &str = "contact";

/// Checkbox value the form-encoded variant treats as consent
pub const NEWSLETTER_CONSENT_VALUE: &str = "yes";

/// Admin notification subject prefix
pub const ADMIN_SUBJECT_PREFIX: &str = "New submission: ";

// ============================================
// DEFAULT COPY
// ============================================

pub const DEFAULT_SITE_NAME: &str = "Extra Chill";

pub const DEFAULT_SUCCESS_MESSAGE: &str = "Your message has been sent successfully.";

/// Success text the client form shows when none is configured
pub const FORM_DEFAULT_SUCCESS_MESSAGE: &str = "Thanks for reaching out! We'll be in touch soon.";

pub const DEFAULT_NEWSLETTER_NOTICE: &str =
    "By submitting this form, you'll receive our newsletter with music news, festival coverage, and platform updates.";

pub const DEFAULT_RESPONSE_WINDOW: &str = "3-5 business days";

pub const DEFAULT_REDIRECT_URL: &str = "/contact/";

pub const DEFAULT_PUBLIC_ENDPOINT: &str = "/v1/contact/submit";

pub const MSG_INVALID_NONCE: &str = "Invalid nonce.";

pub const MSG_CHALLENGE_REQUIRED: &str = "Please complete the security verification.";

pub const MSG_CHALLENGE_INVALID: &str = "Security verification failed. Please try again.";

pub const MSG_MAIL_FAILED: &str = "Your message could not be sent. Please try again later.";

pub const MSG_GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

// ============================================
// SERVER
// ============================================

pub const DEFAULT_HOST: &str = "0.0.0.0";

pub const DEFAULT_PORT: u16 = 8080;

/// Request body limit for submissions (bytes)
pub const MAX_BODY_BYTES: usize = 64 * 1024;
