//! Identity directory: account lookup, creation, and delegation back-references

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Account, NewAccount};

/// Resolves and provisions accounts
///
/// The delegation core only ever talks to this trait; the SQLite-backed
/// implementation below is the production one, tests substitute fakes.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;
    async fn create(&self, account: NewAccount) -> Result<Account>;
    /// Add a delegation id to the account's back-reference set.
    async fn link_delegation(&self, account_id: Uuid, delegation_id: Uuid) -> Result<()>;
    /// Delegation ids the account participates in.
    async fn delegations_for(&self, account_id: Uuid) -> Result<Vec<Uuid>>;
}

/// Directory backed by the service's own accounts table
#[derive(Clone)]
pub struct SqliteDirectory {
    pool: SqlitePool,
}

impl SqliteDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityDirectory for SqliteDirectory {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, name, email, phone, password, role, created_at, updated_at
            FROM accounts
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Account::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, name, email, phone, password, role, created_at, updated_at
            FROM accounts
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Account::try_from).transpose()
    }

    async fn create(&self, account: NewAccount) -> Result<Account> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO accounts (id, name, email, phone, password, role, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.phone)
        .bind(&account.password)
        .bind(account.role.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Account {
            id,
            name: account.name,
            email: account.email,
            phone: account.phone,
            role: account.role,
            password: account.password,
            created_at: now,
            updated_at: now,
        })
    }

    async fn link_delegation(&self, account_id: Uuid, delegation_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO account_delegations (account_id, delegation_id)
            VALUES (?, ?)
            "#,
        )
        .bind(account_id.to_string())
        .bind(delegation_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delegations_for(&self, account_id: Uuid) -> Result<Vec<Uuid>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT delegation_id FROM account_delegations WHERE account_id = ?
            "#,
        )
        .bind(account_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(s,)| {
                Uuid::parse_str(&s)
                    .map_err(|e| AppError::Internal(format!("Invalid delegation UUID: {}", e)))
            })
            .collect()
    }
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: String,
    name: String,
    email: String,
    phone: Option<String>,
    password: String,
    role: String,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = AppError;

    fn try_from(row: AccountRow) -> Result<Self> {
        Ok(Account {
            id: Uuid::parse_str(&row.id)
                .map_err(|e| AppError::Internal(format!("Invalid UUID: {}", e)))?,
            name: row.name,
            email: row.email,
            phone: row.phone,
            password: row.password,
            role: row
                .role
                .parse()
                .map_err(|e| AppError::Internal(format!("Invalid role: {}", e)))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
