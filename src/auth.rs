//! Session layer: signed bearer tokens and the request extractor
//!
//! Login/registration live outside this service; whatever mints a session
//! token is trusted. Handlers only ever see the verified [`Session`].

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::Role;
use crate::token::SigningKey;
use crate::AppState;

pub const SESSION_TTL_DAYS: i64 = 30;

/// The authenticated caller, as supplied by the auth layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Uuid,
    pub role: Role,
    pub email: String,
}

/// Issues and verifies session bearer tokens
#[derive(Clone)]
pub struct SessionTokens {
    key: SigningKey,
}

impl SessionTokens {
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    pub fn issue(&self, session: &Session) -> String {
        self.key
            .issue(session.clone(), Duration::days(SESSION_TTL_DAYS))
    }

    pub fn verify(&self, token: &str) -> Result<Session> {
        self.key.verify(token).map_err(|_| AppError::Unauthorized)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let state = Arc::<AppState>::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthorized)?;

        state.sessions.verify(token)
    }
}
