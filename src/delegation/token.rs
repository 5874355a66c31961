//! Invite token codec for executor delegations

use chrono::Duration;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::token::SigningKey;

/// Invite links stay valid for a week; there is no refresh.
pub const INVITE_TTL_DAYS: i64 = 7;

/// What an invite token binds together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitePayload {
    pub delegation_id: Uuid,
    pub owner_id: Uuid,
    pub executor_email: String,
}

/// Issues and verifies the tokens embedded in executor invitation links
#[derive(Clone)]
pub struct TokenCodec {
    key: SigningKey,
}

impl TokenCodec {
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    /// Mint an invite token with the default one-week expiry.
    pub fn issue(&self, payload: &InvitePayload) -> String {
        self.issue_with_ttl(payload, Duration::days(INVITE_TTL_DAYS))
    }

    pub fn issue_with_ttl(&self, payload: &InvitePayload, ttl: Duration) -> String {
        self.key.issue(payload.clone(), ttl)
    }

    /// Verify signature and expiry, returning the embedded payload.
    pub fn verify(&self, token: &str) -> Result<InvitePayload> {
        self.key.verify(token)
    }
}
