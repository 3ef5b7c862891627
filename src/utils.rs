use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::error::ClientError;

pub const MIN_VERIFIER_LENGTH: usize = 43;
pub const MAX_VERIFIER_LENGTH: usize = 128;
pub const DEFAULT_VERIFIER_LENGTH: usize = 128;

// RFC 7636 unreserved characters
const VERIFIER_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

pub fn check_verifier_length(length: usize) -> Result<(), ClientError> {
    if (MIN_VERIFIER_LENGTH..=MAX_VERIFIER_LENGTH).contains(&length) {
        Ok(())
    } else {
        Err(ClientError::InvalidVerifierLength(length))
    }
}

pub fn generate_code_verifier(length: usize) -> Result<String, ClientError> {
    check_verifier_length(length)?;

    let mut rng = rand::rng();
    Ok((0..length)
        .map(|_| VERIFIER_CHARSET[rng.random_range(0..VERIFIER_CHARSET.len())] as char)
        .collect())
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Absolute expiry in epoch millis for a provider TTL given in seconds.
pub fn expires_at(expires_in: u64) -> i64 {
    let ttl_millis = i64::try_from(expires_in.saturating_mul(1000)).unwrap_or(i64::MAX);
    now_millis().saturating_add(ttl_millis)
}

pub fn format_duration_ms(duration_ms: u64) -> String {
    let total_secs = duration_ms / 1000;
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

/// Renders a millisecond timestamp relative to now, e.g. "in 42m" or "3m ago".
pub fn format_expiry(expires_at: i64) -> String {
    let delta_secs = expires_at.saturating_sub(now_millis()) / 1000;
    let minutes = delta_secs.abs() / 60;
    let seconds = delta_secs.abs() % 60;
    let span = if minutes > 0 {
        format!("{minutes}m")
    } else {
        format!("{seconds}s")
    };

    if delta_secs >= 0 {
        format!("in {span}")
    } else {
        format!("{span} ago")
    }
}
