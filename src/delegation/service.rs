//! Delegation lifecycle orchestration
//!
//! One authoritative state machine: `pending -> approved | revoked`, both
//! terminal. Creation mints the invite token, the invite callback drives
//! the transition, and acceptance provisions or links the executor account.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::Session;
use crate::directory::IdentityDirectory;
use crate::error::{AppError, Result};
use crate::models::{
    Account, CreateExecutorRequest, DelegationRecord, DelegationStatus, ExecutorQuery,
    NewAccount, Role, UpdateExecutorRequest,
};
use crate::notify::{self, NotificationGateway};

use super::registry::ExecutorRegistry;
use super::token::{InvitePayload, TokenCodec};

/// Result of creating a delegation: the record plus whether the invitation
/// email went out (record creation never rolls back on a failed send).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedExecutor {
    #[serde(flatten)]
    pub record: DelegationRecord,
    pub invite_sent: bool,
}

/// Read-only view returned by the `validate` action
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitePreview {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub contact_number: Option<String>,
    pub status: DelegationStatus,
    pub principal_name: String,
    pub created_at: DateTime<Utc>,
}

/// Action-specific payload of the invite callback
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum InviteOutcome {
    Preview(InvitePreview),
    Transitioned(DelegationRecord),
}

pub struct DelegationService {
    registry: ExecutorRegistry,
    directory: Arc<dyn IdentityDirectory>,
    mailer: Arc<dyn NotificationGateway>,
    tokens: TokenCodec,
    app_url: String,
}

impl DelegationService {
    pub fn new(
        registry: ExecutorRegistry,
        directory: Arc<dyn IdentityDirectory>,
        mailer: Arc<dyn NotificationGateway>,
        tokens: TokenCodec,
        app_url: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            directory,
            mailer,
            tokens,
            app_url: app_url.into(),
        }
    }

    /// Designate a new executor: create the pending record, mint and attach
    /// the invite token, and send the invitation email.
    pub async fn create_executor(
        &self,
        session: &Session,
        req: CreateExecutorRequest,
    ) -> Result<CreatedExecutor> {
        if session.role == Role::Executor {
            return Err(AppError::Unauthorized);
        }
        validate_executor_input(&req.name, &req.email)?;

        let principal = self
            .directory
            .find_by_id(session.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let mut record = self
            .registry
            .create(
                session.user_id,
                req.name.trim(),
                req.email.trim(),
                req.contact_number.as_deref(),
            )
            .await?;

        let token = self.tokens.issue(&InvitePayload {
            delegation_id: record.id,
            owner_id: record.owner_id,
            executor_email: record.executor_email.clone(),
        });
        self.registry.attach_token(record.id, &token).await?;
        record.invite_token = Some(token.clone());

        let invite_link = format!("{}/executor/invite/{}", self.app_url, token);
        let email = notify::invite_email(
            &record.executor_email,
            &record.executor_name,
            &principal.name,
            &invite_link,
        );
        let invite_sent = match self.mailer.send(email).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(delegation = %record.id, "invite email failed: {}", e);
                false
            }
        };

        Ok(CreatedExecutor {
            record,
            invite_sent,
        })
    }

    /// Invite-link callback. `validate` is read-only and idempotent;
    /// `accept` and `reject` require the record to still be pending.
    pub async fn handle_invite_action(&self, action: &str, token: &str) -> Result<InviteOutcome> {
        let payload = self.tokens.verify(token)?;
        let record = self
            .registry
            .find_by_id(payload.delegation_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Executor not found".to_string()))?;

        match action {
            "validate" => {
                let principal = self
                    .directory
                    .find_by_id(record.owner_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

                Ok(InviteOutcome::Preview(InvitePreview {
                    id: record.id,
                    name: record.executor_name,
                    email: record.executor_email,
                    contact_number: record.executor_contact,
                    status: record.status,
                    principal_name: principal.name,
                    created_at: record.created_at,
                }))
            }
            "accept" => self.accept(record).await.map(InviteOutcome::Transitioned),
            "reject" => {
                if record.status != DelegationStatus::Pending {
                    return Err(AppError::InvalidState);
                }
                let revoked = self.registry.transition_to_revoked(record.id).await?;
                tracing::info!(delegation = %revoked.id, "executor invitation rejected");
                Ok(InviteOutcome::Transitioned(revoked))
            }
            other => Err(AppError::InvalidAction(other.to_string())),
        }
    }

    async fn accept(&self, record: DelegationRecord) -> Result<DelegationRecord> {
        if record.status != DelegationStatus::Pending {
            return Err(AppError::InvalidState);
        }

        // Resolve the accepting account up front: the conditional transition
        // below needs its id. Provision one with role executor when the
        // email is unknown.
        let (account, generated_password) =
            match self.directory.find_by_email(&record.executor_email).await? {
                Some(account) => (account, None),
                None => {
                    let password = default_credential(&record.executor_name);
                    let account = self
                        .directory
                        .create(NewAccount {
                            name: record.executor_name.clone(),
                            email: record.executor_email.clone(),
                            phone: record.executor_contact.clone(),
                            role: Role::Executor,
                            password: password.clone(),
                        })
                        .await?;
                    tracing::info!(account = %account.id, "auto-provisioned executor account");
                    (account, Some(password))
                }
            };

        // At-most-once: the registry only flips pending records, so a raced
        // duplicate accept fails InvalidState here.
        let approved = self
            .registry
            .transition_to_approved(record.id, account.id)
            .await?;

        self.directory
            .link_delegation(approved.owner_id, approved.id)
            .await?;

        self.send_acceptance_mail(&approved, &account, generated_password)
            .await;

        Ok(approved)
    }

    /// Acceptance notifications are dispatched only after the transition has
    /// committed, and their failures never reach the caller.
    async fn send_acceptance_mail(
        &self,
        approved: &DelegationRecord,
        account: &Account,
        generated_password: Option<String>,
    ) {
        let principal = match self.directory.find_by_id(approved.owner_id).await {
            Ok(Some(principal)) => principal,
            Ok(None) => {
                tracing::warn!(
                    delegation = %approved.id,
                    "principal account missing, skipping acceptance email"
                );
                return;
            }
            Err(e) => {
                tracing::warn!(delegation = %approved.id, "principal lookup failed: {}", e);
                return;
            }
        };

        let acceptance =
            notify::acceptance_email(&principal.email, &principal.name, &approved.executor_name);
        if let Err(e) = self.mailer.send(acceptance).await {
            tracing::warn!(delegation = %approved.id, "acceptance email failed: {}", e);
        }

        if let Some(password) = generated_password {
            let credentials =
                notify::credentials_email(&account.email, &account.name, &password);
            if let Err(e) = self.mailer.send(credentials).await {
                tracing::warn!(delegation = %approved.id, "credentials email failed: {}", e);
            }
        }
    }

    pub async fn list(
        &self,
        session: &Session,
        query: &ExecutorQuery,
    ) -> Result<Vec<DelegationRecord>> {
        self.registry.list_by_owner(session.user_id, query).await
    }

    pub async fn get(&self, session: &Session, id: Uuid) -> Result<DelegationRecord> {
        self.registry.find_owned(id, session.user_id).await
    }

    pub async fn update(
        &self,
        session: &Session,
        id: Uuid,
        patch: UpdateExecutorRequest,
    ) -> Result<DelegationRecord> {
        if let Some(name) = &patch.name {
            validate_name(name)?;
        }
        if let Some(email) = &patch.email {
            validate_email(email)?;
        }
        self.registry
            .update_fields(id, session.user_id, &patch)
            .await
    }

    pub async fn delete(&self, session: &Session, id: Uuid) -> Result<()> {
        self.registry.delete(id, session.user_id).await
    }
}

/// The generated default credential for auto-provisioned executor accounts.
/// Predictable on purpose to stay wire-compatible with the system being
/// replaced; slated for an invite-based credential-setup flow.
fn default_credential(name: &str) -> String {
    format!("{}@123", name)
}

fn validate_executor_input(name: &str, email: &str) -> Result<()> {
    validate_name(name)?;
    validate_email(email)
}

fn validate_name(name: &str) -> Result<()> {
    let name = name.trim();
    if name.len() < 3 || name.len() > 100 {
        return Err(AppError::Validation(
            "Executor name must be between 3 and 100 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    if !is_valid_email(email.trim()) {
        return Err(AppError::Validation(
            "A valid email address is required".to_string(),
        ));
    }
    Ok(())
}

fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}
