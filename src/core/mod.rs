//! Core Module - Business Logic
//!
//! Submission pipeline, input sanitizing, anti-forgery tokens, signed
//! notices, email templates and the client form state machine.

pub mod flash;
pub mod form;
pub mod nonce;
pub mod submission;
pub mod templates;
pub mod validation;

pub use flash::*;
pub use form::*;
pub use nonce::*;
pub use submission::*;
pub use validation::*;
