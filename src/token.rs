//! HMAC-signed, expiring token primitives
//!
//! Shared by the executor invite codec and the session layer. A token is
//! `base64url(claims).base64url(hmac-sha256(claims))` over a shared secret;
//! claims carry the payload plus an `exp` unix timestamp.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

#[derive(Serialize, Deserialize)]
struct Claims<T> {
    #[serde(flatten)]
    payload: T,
    exp: i64,
}

/// Signs and verifies payloads with a shared secret
///
/// Verification failures (tampered, malformed, expired) are logged
/// distinctly but all surface as [`AppError::InvalidToken`]; callers decide
/// how that maps onto their own failure kind.
#[derive(Clone)]
pub struct SigningKey {
    secret: Vec<u8>,
}

impl SigningKey {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length
        HmacSha256::new_from_slice(&self.secret).expect("HMAC key of any length")
    }

    /// Mint a token for `payload` expiring after `ttl`.
    pub fn issue<T: Serialize>(&self, payload: T, ttl: Duration) -> String {
        let claims = Claims {
            payload,
            exp: (Utc::now() + ttl).timestamp(),
        };
        // Claims are plain serializable data; serialization cannot fail
        let body = URL_SAFE_NO_PAD
            .encode(serde_json::to_vec(&claims).expect("claims serialize to JSON"));

        let mut mac = self.mac();
        mac.update(body.as_bytes());
        let sig = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        format!("{}.{}", body, sig)
    }

    /// Verify signature and expiry, returning the embedded payload.
    pub fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T> {
        let (body, sig) = token.split_once('.').ok_or_else(|| {
            tracing::debug!("token is malformed");
            AppError::InvalidToken
        })?;

        let sig_bytes = URL_SAFE_NO_PAD.decode(sig).map_err(|_| {
            tracing::debug!("token signature is not valid base64");
            AppError::InvalidToken
        })?;

        let mut mac = self.mac();
        mac.update(body.as_bytes());
        mac.verify_slice(&sig_bytes).map_err(|_| {
            tracing::debug!("token signature mismatch");
            AppError::InvalidToken
        })?;

        let claims_bytes = URL_SAFE_NO_PAD.decode(body).map_err(|_| {
            tracing::debug!("token body is not valid base64");
            AppError::InvalidToken
        })?;
        let claims: Claims<T> = serde_json::from_slice(&claims_bytes).map_err(|_| {
            tracing::debug!("token claims do not parse");
            AppError::InvalidToken
        })?;

        if claims.exp < Utc::now().timestamp() {
            tracing::debug!("token expired");
            return Err(AppError::InvalidToken);
        }

        Ok(claims.payload)
    }
}
