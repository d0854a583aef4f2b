//! Signed capability URLs for the unauthenticated lock/unlock actions.
//!
//! A capability URL embeds the target identifier, a random entropy nonce, an
//! expiry timestamp, and an HMAC-SHA256 signature over all of them.
//! Possession of a valid, unexpired URL is the only access control on the
//! lock/unlock endpoints, so validation must run before any engine work.
//!
//! The signature covers the raw parameter values (`action|identifier|entropy|
//! expires`), never the encoded query string, so percent-encoding differences
//! between issuer and receiver cannot break verification.

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use rand::{TryRngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::CapabilityError;

type HmacSha256 = Hmac<Sha256>;

/// The action a capability URL grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityAction {
    Lock,
    Unlock,
}

impl CapabilityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityAction::Lock => "lock",
            CapabilityAction::Unlock => "unlock",
        }
    }
}

impl std::fmt::Display for CapabilityAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The signed parameters carried by a capability URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityClaims {
    pub identifier: String,
    pub entropy: String,
    pub expires: i64,
    pub signature: String,
}

/// Issues and validates signed capability URLs.
pub struct CapabilityGateway {
    secret: Vec<u8>,
    base_url: String,
}

impl CapabilityGateway {
    /// Create a gateway signing with `secret` and issuing URLs under
    /// `base_url` (e.g. `https://app.example.com`).
    pub fn new(secret: impl AsRef<[u8]>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            secret: secret.as_ref().to_vec(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Issue a signed URL granting `action` for `identifier`, valid for
    /// `ttl_minutes`.
    pub fn issue(&self, action: CapabilityAction, identifier: &str, ttl_minutes: i64) -> String {
        let entropy = generate_entropy();
        let expires = (Utc::now() + Duration::minutes(ttl_minutes)).timestamp();
        let signature = self.sign(action, identifier, &entropy, expires);

        let claims = CapabilityClaims {
            identifier: identifier.to_string(),
            entropy,
            expires,
            signature,
        };

        // serde_urlencoded is the codec behind axum's Query extractor, so the
        // issued query round-trips exactly on the receiving side.
        let query = serde_urlencoded::to_string(&claims)
            .expect("capability claims serialize to a query string");

        format!("{}/lockout/{}?{}", self.base_url, action.as_str(), query)
    }

    /// Validate received claims for `action`.
    ///
    /// Rejects expired links before signature work is trusted; any mismatch
    /// in identifier, entropy, expiry, or action invalidates the signature.
    pub fn validate(
        &self,
        action: CapabilityAction,
        claims: &CapabilityClaims,
    ) -> Result<(), CapabilityError> {
        if claims.expires < Utc::now().timestamp() {
            return Err(CapabilityError::Expired);
        }

        let expected = self.sign(action, &claims.identifier, &claims.entropy, claims.expires);
        if !constant_time_eq(expected.as_bytes(), claims.signature.as_bytes()) {
            return Err(CapabilityError::InvalidSignature);
        }

        Ok(())
    }

    fn sign(
        &self,
        action: CapabilityAction,
        identifier: &str,
        entropy: &str,
        expires: i64,
    ) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC accepts keys of any length");
        mac.update(format!("{}|{identifier}|{entropy}|{expires}", action.as_str()).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

/// Generate a URL-safe random nonce with 256 bits of entropy.
fn generate_entropy() -> String {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .expect("OS RNG failure - system entropy source unavailable");
    BASE64_URL_SAFE_NO_PAD.encode(bytes)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
