//! Providers Module - External Services
//!
//! Challenge verifier, mail transport and newsletter list, each behind a
//! trait so the submission service can be driven with fakes.

pub mod mailer;
pub mod newsletter;
pub mod turnstile;

pub use mailer::*;
pub use newsletter::*;
pub use turnstile::*;
