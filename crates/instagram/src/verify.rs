//! Webhook signature verification

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Why a signature check was not performed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckSkipped {
    /// No app secret is configured
    NoSecret,
    /// The request carried no `X-Hub-Signature-256` header
    NoHeader,
}

/// Result of checking an inbound delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureCheck {
    Valid,
    Invalid,
    Skipped(CheckSkipped),
}

impl SignatureCheck {
    /// Skipped checks count as authentic; callers wanting strict behavior
    /// must match on `Skipped` themselves.
    pub fn is_authentic(&self) -> bool {
        !matches!(self, SignatureCheck::Invalid)
    }
}

/// Check a delivery against the configured app secret
///
/// `signature` is the value of the `X-Hub-Signature-256` header, if any.
/// Empty values are treated as absent.
pub fn check_signature(signature: Option<&str>, secret: Option<&str>, body: &[u8]) -> SignatureCheck {
    let secret = match secret.filter(|s| !s.is_empty()) {
        Some(s) => s,
        None => return SignatureCheck::Skipped(CheckSkipped::NoSecret),
    };
    let signature = match signature.filter(|s| !s.is_empty()) {
        Some(s) => s,
        None => return SignatureCheck::Skipped(CheckSkipped::NoHeader),
    };

    if verify_signature(signature, secret, body) {
        SignatureCheck::Valid
    } else {
        SignatureCheck::Invalid
    }
}

/// Verify a webhook signature
///
/// `signature` has the form `<algorithm>=<hex digest>`; the algorithm name is
/// not checked, the digest is always HMAC-SHA256 over the raw body.
pub fn verify_signature(signature: &str, secret: &str, body: &[u8]) -> bool {
    let digest = match signature.split_once('=') {
        Some((_, digest)) => digest,
        None => return false,
    };

    let signature_bytes = match hex::decode(digest) {
        Ok(b) => b,
        Err(_) => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };

    mac.update(body);
    mac.verify_slice(&signature_bytes).is_ok()
}

/// Compute the `X-Hub-Signature-256` header value for a body
pub fn sign(secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(format!("sha256={}", hex::encode(mac.finalize().into_bytes())))
}
