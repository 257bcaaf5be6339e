use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Errors produced while computing a body signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// An empty key would yield a signature anyone can forge.
    #[error("signing secret must not be empty")]
    EmptySecret,

    /// The MAC implementation refused the key.
    #[error("invalid HMAC key: {0}")]
    InvalidKey(String),
}

/// Compute the HMAC-SHA256 of `body` keyed by `secret`, hex-encoded.
///
/// The output is always 64 lowercase hex characters. Callers must pass the
/// exact bytes that go over the wire.
pub fn sign(secret: &str, body: &[u8]) -> Result<String, SignatureError> {
    Ok(hex::encode(mac(secret, body)?))
}

/// Check a received signature header against `body` in constant time.
///
/// Returns `false` for an empty secret, a header that is not valid hex, or a
/// mismatching digest.
#[must_use]
pub fn verify(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = mac(secret, body) else {
        return false;
    };
    let Ok(received) = hex::decode(signature.trim()) else {
        return false;
    };
    expected.as_slice().ct_eq(received.as_slice()).into()
}

fn mac(secret: &str, body: &[u8]) -> Result<Vec<u8>, SignatureError> {
    if secret.is_empty() {
        return Err(SignatureError::EmptySecret);
    }
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| SignatureError::InvalidKey(e.to_string()))?;
    mac.update(body);
    Ok(mac.finalize().into_bytes().to_vec())
}
