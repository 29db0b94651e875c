//! Request signing for the authenticated exchange API.

use crate::error::{FeedError, FeedResult};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Encode a string as latin-1 bytes. Characters above U+00FF cannot be encoded.
pub fn latin1_bytes(s: &str) -> FeedResult<Vec<u8>> {
    s.chars()
        .map(|c| {
            u8::try_from(u32::from(c)).map_err(|_| {
                FeedError::Signing(format!("character {:?} is not representable in latin-1", c))
            })
        })
        .collect()
}

/// Sign a request: lowercase hex HMAC-SHA256 of `timestamp + method + path + body`,
/// keyed with the API secret. Key and message are latin-1 encoded.
pub fn sign_request(
    secret: &str,
    timestamp: &str,
    method: &str,
    path: &str,
    body: &str,
) -> FeedResult<String> {
    let key = latin1_bytes(secret)?;
    let message = latin1_bytes(&format!("{}{}{}{}", timestamp, method, path, body))?;

    let mut mac = HmacSha256::new_from_slice(&key)
        .map_err(|e| FeedError::Signing(e.to_string()))?;
    mac.update(&message);
    Ok(hex::encode(mac.finalize().into_bytes()))
}
