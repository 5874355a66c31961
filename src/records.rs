//! Per-category financial record storage
//!
//! One store covers all six categories; callers pass the already-resolved
//! effective owner id, so executor sessions read and write the principal's
//! rows without any special handling here.

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    CreateRecordRequest, FinancialRecord, RecordCategory, RecordQuery, UpdateRecordRequest,
};

const COLUMNS: &str = "id, owner_id, category, kind, name, provider, account_number, \
                       amount, due_date, created_at, updated_at";

#[derive(Clone)]
pub struct RecordStore {
    pool: SqlitePool,
}

impl RecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        owner_id: Uuid,
        category: RecordCategory,
        req: CreateRecordRequest,
    ) -> Result<FinancialRecord> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO financial_records
                (id, owner_id, category, kind, name, provider, account_number,
                 amount, due_date, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(owner_id.to_string())
        .bind(category.as_str())
        .bind(&req.kind)
        .bind(&req.name)
        .bind(&req.provider)
        .bind(&req.account_number)
        .bind(req.amount)
        .bind(req.due_date)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(FinancialRecord {
            id,
            owner_id,
            category,
            kind: req.kind,
            name: req.name,
            provider: req.provider,
            account_number: req.account_number,
            amount: req.amount,
            due_date: req.due_date,
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn list(
        &self,
        owner_id: Uuid,
        category: RecordCategory,
        query: &RecordQuery,
    ) -> Result<Vec<FinancialRecord>> {
        let mut sql = format!(
            "SELECT {} FROM financial_records WHERE owner_id = ? AND category = ?",
            COLUMNS
        );
        if query.kind.is_some() {
            sql.push_str(" AND kind = ?");
        }
        if query.search.is_some() {
            sql.push_str(" AND name LIKE ?");
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut q = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(owner_id.to_string())
            .bind(category.as_str());
        if let Some(kind) = &query.kind {
            q = q.bind(kind);
        }
        if let Some(search) = &query.search {
            q = q.bind(format!("%{}%", search));
        }

        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(|r| r.try_into()).collect()
    }

    /// Sum of `amount` across the owner's records in this category.
    pub async fn total_amount(&self, owner_id: Uuid, category: RecordCategory) -> Result<f64> {
        let (total,): (Option<f64>,) = sqlx::query_as(
            r#"
            SELECT SUM(amount) FROM financial_records WHERE owner_id = ? AND category = ?
            "#,
        )
        .bind(owner_id.to_string())
        .bind(category.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0.0))
    }

    pub async fn get(
        &self,
        owner_id: Uuid,
        category: RecordCategory,
        id: Uuid,
    ) -> Result<FinancialRecord> {
        let row = sqlx::query_as::<_, RecordRow>(&format!(
            "SELECT {} FROM financial_records WHERE id = ? AND owner_id = ? AND category = ?",
            COLUMNS
        ))
        .bind(id.to_string())
        .bind(owner_id.to_string())
        .bind(category.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFoundOrUnauthorized("Record"))?;

        row.try_into()
    }

    pub async fn update(
        &self,
        owner_id: Uuid,
        category: RecordCategory,
        id: Uuid,
        patch: UpdateRecordRequest,
    ) -> Result<FinancialRecord> {
        let existing = self.get(owner_id, category, id).await?;

        let kind = patch.kind.unwrap_or(existing.kind);
        let name = patch.name.unwrap_or(existing.name);
        let provider = patch.provider.or(existing.provider);
        let account_number = patch.account_number.or(existing.account_number);
        let amount = patch.amount.or(existing.amount);
        let due_date = patch.due_date.or(existing.due_date);
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE financial_records
            SET kind = ?, name = ?, provider = ?, account_number = ?,
                amount = ?, due_date = ?, updated_at = ?
            WHERE id = ? AND owner_id = ? AND category = ?
            "#,
        )
        .bind(&kind)
        .bind(&name)
        .bind(&provider)
        .bind(&account_number)
        .bind(amount)
        .bind(due_date)
        .bind(now)
        .bind(id.to_string())
        .bind(owner_id.to_string())
        .bind(category.as_str())
        .execute(&self.pool)
        .await?;

        self.get(owner_id, category, id).await
    }

    pub async fn delete(
        &self,
        owner_id: Uuid,
        category: RecordCategory,
        id: Uuid,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM financial_records WHERE id = ? AND owner_id = ? AND category = ?
            "#,
        )
        .bind(id.to_string())
        .bind(owner_id.to_string())
        .bind(category.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFoundOrUnauthorized("Record"));
        }

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct RecordRow {
    id: String,
    owner_id: String,
    category: String,
    kind: String,
    name: String,
    provider: Option<String>,
    account_number: Option<String>,
    amount: Option<f64>,
    due_date: Option<chrono::DateTime<Utc>>,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

impl TryFrom<RecordRow> for FinancialRecord {
    type Error = AppError;

    fn try_from(row: RecordRow) -> Result<Self> {
        Ok(FinancialRecord {
            id: Uuid::parse_str(&row.id)
                .map_err(|e| AppError::Internal(format!("Invalid UUID: {}", e)))?,
            owner_id: Uuid::parse_str(&row.owner_id)
                .map_err(|e| AppError::Internal(format!("Invalid UUID: {}", e)))?,
            category: row
                .category
                .parse()
                .map_err(|e| AppError::Internal(format!("Invalid category: {}", e)))?,
            kind: row.kind,
            name: row.name,
            provider: row.provider,
            account_number: row.account_number,
            amount: row.amount,
            due_date: row.due_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
