//! HMAC-SHA256 secure hashes.
//!
//! The merchant secret is distributed by OnePay as a hex string; it is decoded to raw bytes before keying the
//! MAC. The digest is hex-encoded and uppercased. The same routine signs outbound requests and verifies inbound
//! callbacks, so a callback is only ever accepted when the recomputed hash equals the received one byte-for-byte.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::onepay::{params::ParamList, OnePayError};

type HmacSha256 = Hmac<Sha256>;

/// Sign the canonical string with the hex-encoded merchant secret. Returns the uppercase hex digest.
pub fn sign(canonical: &str, hex_secret: &str) -> Result<String, OnePayError> {
    let key = hex::decode(hex_secret).map_err(|e| OnePayError::InvalidSecret(e.to_string()))?;
    // HMAC accepts keys of any length, so new_from_slice cannot fail
    let mut mac = HmacSha256::new_from_slice(&key).map_err(|e| OnePayError::InvalidSecret(e.to_string()))?;
    mac.update(canonical.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()).to_uppercase())
}

/// Canonicalize and sign a parameter list in one step.
pub fn sign_params(params: &ParamList, hex_secret: &str) -> Result<String, OnePayError> {
    sign(&params.canonical_string(), hex_secret)
}

/// Verify a received secure hash against the recomputed signature over `params`.
///
/// `params` may still contain the received `vpc_SecureHash`; canonicalization excludes it.
pub fn verify(params: &ParamList, received_hash: &str, hex_secret: &str) -> Result<(), OnePayError> {
    let expected = sign_params(params, hex_secret)?;
    if expected == received_hash {
        Ok(())
    } else {
        Err(OnePayError::SignatureMismatch)
    }
}
