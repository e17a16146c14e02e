//! Anti-forgery tokens
//!
//! A nonce proves the request came from a form this service rendered. The
//! lifetime is split into two ticks; a token minted in tick `t` is accepted
//! during ticks `t` and `t + 1`, so it lives between half and one full
//! lifetime.
//!
//! Token = hex(first `NONCE_BYTES` of HMAC-SHA256(secret, "{tick}|{action}"))

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::utils::constants::NONCE_BYTES;

type HmacSha256 = Hmac<Sha256>;

/// Issues and verifies nonces for one secret
#[derive(Clone)]
pub struct NonceSigner {
    secret: Vec<u8>,
    lifetime_secs: i64,
}

impl std::fmt::Debug for NonceSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceSigner")
            .field("lifetime_secs", &self.lifetime_secs)
            .finish_non_exhaustive()
    }
}

impl NonceSigner {
    pub fn new(secret: impl Into<Vec<u8>>, lifetime_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            lifetime_secs: lifetime_secs.max(2),
        }
    }

    /// Tick number for a unix timestamp
    pub fn tick(&self, now: i64) -> i64 {
        let half = self.lifetime_secs / 2;
        // ceil(now / half) for non-negative timestamps
        (now + half - 1).div_euclid(half)
    }

    pub fn create(&self, action: &str) -> String {
        self.create_at(action, chrono::Utc::now().timestamp())
    }

    pub fn create_at(&self, action: &str, now: i64) -> String {
        let tag = self.mac(self.tick(now), action).finalize().into_bytes();
        hex::encode(&tag[..NONCE_BYTES])
    }

    pub fn verify(&self, nonce: &str, action: &str) -> bool {
        self.verify_at(nonce, action, chrono::Utc::now().timestamp())
    }

    /// Constant-time check against the current and previous tick
    pub fn verify_at(&self, nonce: &str, action: &str, now: i64) -> bool {
        let provided = match hex::decode(nonce.trim()) {
            Ok(bytes) if bytes.len() == NONCE_BYTES => bytes,
            _ => return false,
        };

        let tick = self.tick(now);
        [tick, tick - 1]
            .into_iter()
            .any(|t| self.mac(t, action).verify_truncated_left(&provided).is_ok())
    }

    /// Raw HMAC over an arbitrary payload, shared with the flash notice
    pub(crate) fn sign(&self, payload: &str) -> HmacSha256 {
        let mut mac = new_mac(&self.secret);
        mac.update(payload.as_bytes());
        mac
    }

    fn mac(&self, tick: i64, action: &str) -> HmacSha256 {
        self.sign(&format!("{}|{}", tick, action))
    }
}

fn new_mac(secret: &[u8]) -> HmacSha256 {
    match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC can take key of any size"),
    }
}
