//! Extra Chill Contact Library
//!
//! Contact form submission service:
//! - Anti-forgery nonce and Turnstile challenge gates
//! - Sanitizing and validation of submitted fields
//! - HTML admin notification and submitter confirmation emails
//! - Best-effort Sendy newsletter sync
//! - Headless client form state machine

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::{ContactForm, FlashNotice, FormProps, NonceSigner, SubmissionService};
pub use models::{AppError, AppResult, ContactConfig, ErrorCode, SubmissionPayload, SubmissionRequest};
