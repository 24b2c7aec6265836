//! Signed retrieval tokens for backends without native presigning.
//!
//! Token = base64url(expiry_ts (u64 BE) || HMAC-SHA256(secret, expiry_ts || key)).
//! The key itself travels in the URL path, so the token only proves expiry and
//! binds it to that key.

use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

const EXPIRY_LEN: usize = 8;
const MAC_LEN: usize = 32; // SHA256
const TOKEN_LEN: usize = EXPIRY_LEN + MAC_LEN;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid retrieval token")]
    Malformed,

    #[error("Retrieval token does not match this object")]
    BadSignature,

    #[error("Retrieval token has expired")]
    Expired,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn mac_for(secret: &[u8], expiry: &[u8], key: &str) -> Hmac<Sha256> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret).expect("HMAC accepts any key size");
    mac.update(expiry);
    mac.update(key.as_bytes());
    mac
}

/// Build a token granting read access to `key` for `expires_in`.
pub fn create(key: &str, expires_in: Duration, secret: &[u8]) -> String {
    let expiry_ts = now_secs().saturating_add(expires_in.as_secs());
    let expiry = expiry_ts.to_be_bytes();
    let tag = mac_for(secret, &expiry, key).finalize().into_bytes();

    let mut token_bytes = [0u8; TOKEN_LEN];
    token_bytes[..EXPIRY_LEN].copy_from_slice(&expiry);
    token_bytes[EXPIRY_LEN..].copy_from_slice(&tag);

    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(token_bytes)
}

/// Verify that `token` grants unexpired access to `key`.
pub fn verify(token: &str, key: &str, secret: &[u8]) -> Result<(), TokenError> {
    let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| TokenError::Malformed)?;
    if decoded.len() != TOKEN_LEN {
        return Err(TokenError::Malformed);
    }

    let (expiry, tag) = decoded.split_at(EXPIRY_LEN);
    mac_for(secret, expiry, key)
        .verify_slice(tag)
        .map_err(|_| TokenError::BadSignature)?;

    let mut expiry_bytes = [0u8; EXPIRY_LEN];
    expiry_bytes.copy_from_slice(expiry);
    if now_secs() > u64::from_be_bytes(expiry_bytes) {
        return Err(TokenError::Expired);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-signing-key";

    #[test]
    fn test_token_verifies_for_its_key() {
        let token = create("uploads/e1/1_a.jpg", Duration::from_secs(60), SECRET);
        assert_eq!(verify(&token, "uploads/e1/1_a.jpg", SECRET), Ok(()));
    }

    #[test]
    fn test_token_bound_to_key_and_secret() {
        let token = create("uploads/e1/1_a.jpg", Duration::from_secs(60), SECRET);
        assert_eq!(
            verify(&token, "uploads/e1/2_b.jpg", SECRET),
            Err(TokenError::BadSignature)
        );
        assert_eq!(
            verify(&token, "uploads/e1/1_a.jpg", b"other"),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_garbage_token_is_malformed() {
        assert_eq!(
            verify("not a token", "uploads/e1/1_a.jpg", SECRET),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let expiry = (now_secs() - 10).to_be_bytes();
        let tag = mac_for(SECRET, &expiry, "k/a").finalize().into_bytes();
        let mut bytes = expiry.to_vec();
        bytes.extend_from_slice(&tag);
        let token = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes);
        assert_eq!(verify(&token, "k/a", SECRET), Err(TokenError::Expired));
    }
}
