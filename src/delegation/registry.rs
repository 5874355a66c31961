//! Persistence for executor delegation records
//!
//! All mutation of a delegation record goes through here so the lifecycle
//! invariants hold: `executor_user_id` is set exactly when the record is
//! approved, and `invite_token` survives only while the record is pending.

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    DelegationRecord, DelegationStatus, ExecutorQuery, UpdateExecutorRequest,
};

const COLUMNS: &str = "id, owner_id, executor_name, executor_email, executor_contact, \
                       status, executor_user_id, invite_token, created_at, updated_at";

/// Store for delegation records
#[derive(Clone)]
pub struct ExecutorRegistry {
    pool: SqlitePool,
}

impl ExecutorRegistry {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a pending record. The invite token is attached separately once
    /// minted.
    pub async fn create(
        &self,
        owner_id: Uuid,
        name: &str,
        email: &str,
        contact: Option<&str>,
    ) -> Result<DelegationRecord> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO executors
                (id, owner_id, executor_name, executor_email, executor_contact,
                 status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 'pending', ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(owner_id.to_string())
        .bind(name)
        .bind(email)
        .bind(contact)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(DelegationRecord {
            id,
            owner_id,
            executor_name: name.to_string(),
            executor_email: email.to_string(),
            executor_contact: contact.map(|c| c.to_string()),
            status: DelegationStatus::Pending,
            executor_user_id: None,
            invite_token: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn attach_token(&self, id: Uuid, token: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE executors SET invite_token = ?, updated_at = ? WHERE id = ?
            "#,
        )
        .bind(token)
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<DelegationRecord>> {
        let row = sqlx::query_as::<_, ExecutorRow>(&format!(
            "SELECT {} FROM executors WHERE id = ?",
            COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(DelegationRecord::try_from).transpose()
    }

    /// Fetch a record only if it belongs to `owner_id`. Absent and
    /// not-yours are indistinguishable.
    pub async fn find_owned(&self, id: Uuid, owner_id: Uuid) -> Result<DelegationRecord> {
        let row = sqlx::query_as::<_, ExecutorRow>(&format!(
            "SELECT {} FROM executors WHERE id = ? AND owner_id = ?",
            COLUMNS
        ))
        .bind(id.to_string())
        .bind(owner_id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFoundOrUnauthorized("Executor"))?;

        row.try_into()
    }

    pub async fn list_by_owner(
        &self,
        owner_id: Uuid,
        query: &ExecutorQuery,
    ) -> Result<Vec<DelegationRecord>> {
        let mut sql = format!(
            "SELECT {} FROM executors WHERE owner_id = ?",
            COLUMNS
        );
        if query.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        if query.search.is_some() {
            sql.push_str(" AND executor_name LIKE ?");
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut q = sqlx::query_as::<_, ExecutorRow>(&sql).bind(owner_id.to_string());
        if let Some(status) = query.status {
            q = q.bind(status.as_str());
        }
        if let Some(search) = &query.search {
            q = q.bind(format!("%{}%", search));
        }

        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(|r| r.try_into()).collect()
    }

    /// The approved record an executor session resolves through. With
    /// several approved delegations for one email, the most recently
    /// approved wins.
    pub async fn find_approved_by_email(&self, email: &str) -> Result<Option<DelegationRecord>> {
        let row = sqlx::query_as::<_, ExecutorRow>(&format!(
            "SELECT {} FROM executors \
             WHERE executor_email = ? AND status = 'approved' \
             ORDER BY updated_at DESC, id DESC LIMIT 1",
            COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(DelegationRecord::try_from).transpose()
    }

    /// `pending -> approved`, recording the accepting account and clearing
    /// the invite token. Conditional on the current status so a raced
    /// double-accept loses cleanly.
    pub async fn transition_to_approved(
        &self,
        id: Uuid,
        executor_user_id: Uuid,
    ) -> Result<DelegationRecord> {
        let result = sqlx::query(
            r#"
            UPDATE executors
            SET status = 'approved', executor_user_id = ?, invite_token = NULL, updated_at = ?
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(executor_user_id.to_string())
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.transition_outcome(id, result.rows_affected()).await
    }

    /// `pending -> revoked`, clearing the invite token. Same conditional
    /// guard as approval.
    pub async fn transition_to_revoked(&self, id: Uuid) -> Result<DelegationRecord> {
        let result = sqlx::query(
            r#"
            UPDATE executors
            SET status = 'revoked', invite_token = NULL, updated_at = ?
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.transition_outcome(id, result.rows_affected()).await
    }

    async fn transition_outcome(&self, id: Uuid, rows_affected: u64) -> Result<DelegationRecord> {
        if rows_affected == 0 {
            return match self.find_by_id(id).await? {
                Some(_) => Err(AppError::InvalidState),
                None => Err(AppError::NotFound("Executor not found".to_string())),
            };
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Executor not found".to_string()))
    }

    /// Owner-initiated update of the descriptive fields.
    pub async fn update_fields(
        &self,
        id: Uuid,
        owner_id: Uuid,
        patch: &UpdateExecutorRequest,
    ) -> Result<DelegationRecord> {
        let existing = self.find_owned(id, owner_id).await?;

        let name = patch.name.clone().unwrap_or(existing.executor_name);
        let email = patch.email.clone().unwrap_or(existing.executor_email);
        let contact = patch
            .contact_number
            .clone()
            .or(existing.executor_contact);
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE executors
            SET executor_name = ?, executor_email = ?, executor_contact = ?, updated_at = ?
            WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(&name)
        .bind(&email)
        .bind(&contact)
        .bind(now)
        .bind(id.to_string())
        .bind(owner_id.to_string())
        .execute(&self.pool)
        .await?;

        self.find_owned(id, owner_id).await
    }

    /// Owner-initiated delete. Absent and not-yours are indistinguishable.
    pub async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM executors WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(id.to_string())
        .bind(owner_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFoundOrUnauthorized("Executor"));
        }

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct ExecutorRow {
    id: String,
    owner_id: String,
    executor_name: String,
    executor_email: String,
    executor_contact: Option<String>,
    status: String,
    executor_user_id: Option<String>,
    invite_token: Option<String>,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

impl TryFrom<ExecutorRow> for DelegationRecord {
    type Error = AppError;

    fn try_from(row: ExecutorRow) -> Result<Self> {
        let executor_user_id = row
            .executor_user_id
            .map(|s| Uuid::parse_str(&s))
            .transpose()
            .map_err(|e| AppError::Internal(format!("Invalid executor_user_id UUID: {}", e)))?;

        Ok(DelegationRecord {
            id: Uuid::parse_str(&row.id)
                .map_err(|e| AppError::Internal(format!("Invalid UUID: {}", e)))?,
            owner_id: Uuid::parse_str(&row.owner_id)
                .map_err(|e| AppError::Internal(format!("Invalid UUID: {}", e)))?,
            executor_name: row.executor_name,
            executor_email: row.executor_email,
            executor_contact: row.executor_contact,
            status: row
                .status
                .parse()
                .map_err(|e| AppError::Internal(format!("Invalid status: {}", e)))?,
            executor_user_id,
            invite_token: row.invite_token,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    use sqlx::sqlite::SqlitePoolOptions;

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS executors (
            id TEXT PRIMARY KEY NOT NULL,
            owner_id TEXT NOT NULL,
            executor_name TEXT NOT NULL,
            executor_email TEXT NOT NULL,
            executor_contact TEXT,
            status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'approved', 'revoked')),
            executor_user_id TEXT,
            invite_token TEXT,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(&pool)
    .await
    .expect("Failed to create executors table");

    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_test_registry() -> ExecutorRegistry {
        ExecutorRegistry::new(test_pool().await)
    }

    #[tokio::test]
    async fn test_create_starts_pending_without_token() {
        let registry = setup_test_registry().await;
        let record = registry
            .create(Uuid::new_v4(), "Jane Doe", "jane@example.com", Some("123"))
            .await
            .unwrap();

        assert_eq!(record.status, DelegationStatus::Pending);
        assert!(record.invite_token.is_none());
        assert!(record.executor_user_id.is_none());
    }

    #[tokio::test]
    async fn test_attach_token() {
        let registry = setup_test_registry().await;
        let record = registry
            .create(Uuid::new_v4(), "Jane", "jane@example.com", None)
            .await
            .unwrap();

        registry.attach_token(record.id, "tok").await.unwrap();

        let fetched = registry.find_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(fetched.invite_token.as_deref(), Some("tok"));
        assert_eq!(fetched.status, DelegationStatus::Pending);
    }

    #[tokio::test]
    async fn test_approve_sets_executor_and_clears_token() {
        let registry = setup_test_registry().await;
        let record = registry
            .create(Uuid::new_v4(), "Jane", "jane@example.com", None)
            .await
            .unwrap();
        registry.attach_token(record.id, "tok").await.unwrap();

        let executor_user_id = Uuid::new_v4();
        let approved = registry
            .transition_to_approved(record.id, executor_user_id)
            .await
            .unwrap();

        assert_eq!(approved.status, DelegationStatus::Approved);
        assert_eq!(approved.executor_user_id, Some(executor_user_id));
        assert!(approved.invite_token.is_none());
    }

    #[tokio::test]
    async fn test_revoke_clears_token() {
        let registry = setup_test_registry().await;
        let record = registry
            .create(Uuid::new_v4(), "Jane", "jane@example.com", None)
            .await
            .unwrap();
        registry.attach_token(record.id, "tok").await.unwrap();

        let revoked = registry.transition_to_revoked(record.id).await.unwrap();
        assert_eq!(revoked.status, DelegationStatus::Revoked);
        assert!(revoked.invite_token.is_none());
        assert!(revoked.executor_user_id.is_none());
    }

    #[tokio::test]
    async fn test_second_transition_is_invalid_state() {
        let registry = setup_test_registry().await;
        let record = registry
            .create(Uuid::new_v4(), "Jane", "jane@example.com", None)
            .await
            .unwrap();

        registry
            .transition_to_approved(record.id, Uuid::new_v4())
            .await
            .unwrap();

        let again = registry
            .transition_to_approved(record.id, Uuid::new_v4())
            .await;
        assert!(matches!(again.unwrap_err(), AppError::InvalidState));

        let revoke = registry.transition_to_revoked(record.id).await;
        assert!(matches!(revoke.unwrap_err(), AppError::InvalidState));
    }

    #[tokio::test]
    async fn test_transition_missing_record_is_not_found() {
        let registry = setup_test_registry().await;
        let result = registry.transition_to_revoked(Uuid::new_v4()).await;
        assert!(matches!(result.unwrap_err(), AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_find_owned_conflates_missing_and_foreign() {
        let registry = setup_test_registry().await;
        let owner = Uuid::new_v4();
        let record = registry
            .create(owner, "Jane", "jane@example.com", None)
            .await
            .unwrap();

        let missing = registry.find_owned(Uuid::new_v4(), owner).await;
        let foreign = registry.find_owned(record.id, Uuid::new_v4()).await;
        assert!(matches!(
            missing.unwrap_err(),
            AppError::NotFoundOrUnauthorized("Executor")
        ));
        assert!(matches!(
            foreign.unwrap_err(),
            AppError::NotFoundOrUnauthorized("Executor")
        ));
    }

    #[tokio::test]
    async fn test_list_by_owner_filters() {
        let registry = setup_test_registry().await;
        let owner = Uuid::new_v4();
        let a = registry
            .create(owner, "Alice Smith", "alice@example.com", None)
            .await
            .unwrap();
        let b = registry
            .create(owner, "Bob Jones", "bob@example.com", None)
            .await
            .unwrap();
        registry
            .create(Uuid::new_v4(), "Other Owner", "other@example.com", None)
            .await
            .unwrap();
        registry
            .transition_to_approved(b.id, Uuid::new_v4())
            .await
            .unwrap();

        let all = registry
            .list_by_owner(owner, &ExecutorQuery::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let pending = registry
            .list_by_owner(
                owner,
                &ExecutorQuery {
                    status: Some(DelegationStatus::Pending),
                    search: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, a.id);

        let searched = registry
            .list_by_owner(
                owner,
                &ExecutorQuery {
                    status: None,
                    search: Some("bob".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(searched.len(), 1);
        assert_eq!(searched[0].id, b.id);
    }

    #[tokio::test]
    async fn test_find_approved_by_email_picks_most_recent() {
        let registry = setup_test_registry().await;
        let first = registry
            .create(Uuid::new_v4(), "Jane", "exec@example.com", None)
            .await
            .unwrap();
        let second = registry
            .create(Uuid::new_v4(), "Jane", "exec@example.com", None)
            .await
            .unwrap();

        registry
            .transition_to_approved(first.id, Uuid::new_v4())
            .await
            .unwrap();
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
        registry
            .transition_to_approved(second.id, Uuid::new_v4())
            .await
            .unwrap();

        let found = registry
            .find_approved_by_email("exec@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, second.id);
    }

    #[tokio::test]
    async fn test_find_approved_by_email_ignores_pending() {
        let registry = setup_test_registry().await;
        registry
            .create(Uuid::new_v4(), "Jane", "exec@example.com", None)
            .await
            .unwrap();

        let found = registry
            .find_approved_by_email("exec@example.com")
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_update_fields_owner_scoped() {
        let registry = setup_test_registry().await;
        let owner = Uuid::new_v4();
        let record = registry
            .create(owner, "Jane", "jane@example.com", None)
            .await
            .unwrap();

        let updated = registry
            .update_fields(
                record.id,
                owner,
                &UpdateExecutorRequest {
                    name: Some("Jane Q. Doe".to_string()),
                    email: None,
                    contact_number: Some("555".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.executor_name, "Jane Q. Doe");
        assert_eq!(updated.executor_email, "jane@example.com");
        assert_eq!(updated.executor_contact.as_deref(), Some("555"));

        let foreign = registry
            .update_fields(record.id, Uuid::new_v4(), &UpdateExecutorRequest::default())
            .await;
        assert!(matches!(
            foreign.unwrap_err(),
            AppError::NotFoundOrUnauthorized("Executor")
        ));
    }

    #[tokio::test]
    async fn test_delete_owner_scoped() {
        let registry = setup_test_registry().await;
        let owner = Uuid::new_v4();
        let record = registry
            .create(owner, "Jane", "jane@example.com", None)
            .await
            .unwrap();

        let foreign = registry.delete(record.id, Uuid::new_v4()).await;
        assert!(matches!(
            foreign.unwrap_err(),
            AppError::NotFoundOrUnauthorized("Executor")
        ));

        registry.delete(record.id, owner).await.unwrap();
        assert!(registry.find_by_id(record.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_approved_iff_executor_user_id() {
        // status == approved <=> executor_user_id set
        let registry = setup_test_registry().await;
        let owner = Uuid::new_v4();

        let pending = registry
            .create(owner, "P", "p@example.com", None)
            .await
            .unwrap();
        let approved = registry
            .create(owner, "A", "a@example.com", None)
            .await
            .unwrap();
        let revoked = registry
            .create(owner, "R", "r@example.com", None)
            .await
            .unwrap();
        registry
            .transition_to_approved(approved.id, Uuid::new_v4())
            .await
            .unwrap();
        registry.transition_to_revoked(revoked.id).await.unwrap();

        for record in registry
            .list_by_owner(owner, &ExecutorQuery::default())
            .await
            .unwrap()
        {
            assert_eq!(
                record.status == DelegationStatus::Approved,
                record.executor_user_id.is_some(),
                "record {} violates approved <=> executor_user_id",
                record.id
            );
            if record.invite_token.is_some() {
                assert_eq!(record.status, DelegationStatus::Pending);
            }
        }
        let _ = pending;
    }
}
