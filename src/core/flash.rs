//! Signed flash notice for the redirect flow
//!
//! The form-encoded endpoint answers with a redirect and the page shows the
//! outcome afterwards. The outcome travels in the redirect URL as a short
//! signed value `{kind}.{code}.{issued_at}.{hex hmac}`; only the code is
//! carried, the text is looked up on display.

use hmac::Mac;

use super::nonce::NonceSigner;
use crate::models::{AppError, AppResult};
use crate::utils::constants::{
    MSG_CHALLENGE_INVALID, MSG_CHALLENGE_REQUIRED, MSG_GENERIC_FAILURE, MSG_INVALID_NONCE,
    MSG_MAIL_FAILED,
};

/// Code carried by a success notice
pub const SENT_CODE: &str = "sent";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Error,
}

impl FlashKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "success" => Some(Self::Success),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashNotice {
    pub kind: FlashKind,
    pub code: String,
    pub issued_at: i64,
}

impl FlashNotice {
    pub fn success(issued_at: i64) -> Self {
        Self {
            kind: FlashKind::Success,
            code: SENT_CODE.to_string(),
            issued_at,
        }
    }

    /// Error notice for a public error code (`challenge_invalid`, ...)
    pub fn error(code: &str, issued_at: i64) -> Self {
        Self {
            kind: FlashKind::Error,
            code: code.to_string(),
            issued_at,
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind == FlashKind::Success
    }

    /// Text to display for this notice
    pub fn message(&self, success_message: &str) -> String {
        let text = match (self.kind, self.code.as_str()) {
            (FlashKind::Success, _) => success_message,
            (_, "auth_failed") => MSG_INVALID_NONCE,
            (_, "validation_failed") => "Please check the form fields and try again.",
            (_, "challenge_required") => MSG_CHALLENGE_REQUIRED,
            (_, "challenge_invalid") => MSG_CHALLENGE_INVALID,
            (_, "mail_send_failed") => MSG_MAIL_FAILED,
            _ => MSG_GENERIC_FAILURE,
        };
        text.to_string()
    }

    pub fn encode(&self, signer: &NonceSigner) -> String {
        let payload = self.payload();
        let signature = hex::encode(signer.sign(&signing_input(&payload)).finalize().into_bytes());
        format!("{}.{}", payload, signature)
    }

    /// Verify signature and age. `ttl_secs` bounds how old a notice may be.
    pub fn decode(raw: &str, signer: &NonceSigner, ttl_secs: i64, now: i64) -> AppResult<Self> {
        let invalid = || AppError::flash_invalid("Notice is invalid or has expired.");

        let (payload, signature) = raw.trim().rsplit_once('.').ok_or_else(invalid)?;
        let signature = hex::decode(signature).map_err(|_| invalid())?;
        signer
            .sign(&signing_input(payload))
            .verify_slice(&signature)
            .map_err(|_| invalid())?;

        let mut parts = payload.splitn(3, '.');
        let kind = parts.next().and_then(FlashKind::parse).ok_or_else(invalid)?;
        let code = parts.next().filter(|c| !c.is_empty()).ok_or_else(invalid)?;
        let issued_at: i64 = parts
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(invalid)?;

        if issued_at > now || now - issued_at > ttl_secs {
            return Err(invalid());
        }

        Ok(Self {
            kind,
            code: code.to_string(),
            issued_at,
        })
    }

    fn payload(&self) -> String {
        format!("{}.{}.{}", self.kind.as_str(), self.code, self.issued_at)
    }
}

fn signing_input(payload: &str) -> String {
    format!("flash|{}", payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_760_000_000;

    fn signer() -> NonceSigner {
        NonceSigner::new(b"flash-secret".to_vec(), 86_400)
    }

    #[test]
    fn test_roundtrip() {
        let s = signer();
        let encoded = FlashNotice::error("challenge_invalid", NOW).encode(&s);
        let decoded = FlashNotice::decode(&encoded, &s, 300, NOW + 10).unwrap();
        assert_eq!(decoded.code, "challenge_invalid");
        assert!(!decoded.is_success());
        assert_eq!(decoded.message("ok"), MSG_CHALLENGE_INVALID);
    }

    #[test]
    fn test_tampered_notice_rejected() {
        let s = signer();
        let encoded = FlashNotice::error("mail_send_failed", NOW).encode(&s);
        let forged = encoded.replacen("error.mail_send_failed", "success.sent", 1);
        assert!(FlashNotice::decode(&forged, &s, 300, NOW).is_err());
    }

    #[test]
    fn test_expired_notice_rejected() {
        let s = signer();
        let encoded = FlashNotice::success(NOW).encode(&s);
        assert!(FlashNotice::decode(&encoded, &s, 300, NOW + 301).is_err());
        assert!(FlashNotice::decode(&encoded, &s, 300, NOW - 1).is_err());
    }

    #[test]
    fn test_success_message_comes_from_config() {
        let s = signer();
        let encoded = FlashNotice::success(NOW).encode(&s);
        let decoded = FlashNotice::decode(&encoded, &s, 300, NOW).unwrap();
        assert_eq!(decoded.message("Thanks!"), "Thanks!");
    }
}
