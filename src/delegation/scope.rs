//! Access scoping: which user's data a session actually operates on
//!
//! Every financial-record operation resolves its effective owner through
//! here before touching persistence. For an approved executor session the
//! effective owner is the principal who granted the delegation
//! (`owner_id` of the approved record); for everyone else it is the
//! session's own user id.

use uuid::Uuid;

use crate::auth::Session;
use crate::error::{AppError, Result};
use crate::models::Role;

use super::registry::ExecutorRegistry;

#[derive(Clone)]
pub struct AccessScopeResolver {
    registry: ExecutorRegistry,
}

impl AccessScopeResolver {
    pub fn new(registry: ExecutorRegistry) -> Self {
        Self { registry }
    }

    /// Resolve the effective owner id for this request. Resolved fresh on
    /// every call; nothing is cached.
    pub async fn resolve(&self, session: &Session) -> Result<Uuid> {
        if session.role != Role::Executor {
            return Ok(session.user_id);
        }

        let record = self
            .registry
            .find_approved_by_email(&session.email)
            .await?
            .ok_or(AppError::NoActiveDelegation)?;

        tracing::debug!(
            executor = %session.user_id,
            principal = %record.owner_id,
            delegation = %record.id,
            "executor session scoped to principal"
        );

        Ok(record.owner_id)
    }
}
