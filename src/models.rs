//! Data models for accounts, executor delegations, and financial records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of an executor delegation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelegationStatus {
    Pending,
    Approved,
    Revoked,
}

impl DelegationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DelegationStatus::Pending => "pending",
            DelegationStatus::Approved => "approved",
            DelegationStatus::Revoked => "revoked",
        }
    }
}

impl std::str::FromStr for DelegationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DelegationStatus::Pending),
            "approved" => Ok(DelegationStatus::Approved),
            "revoked" => Ok(DelegationStatus::Revoked),
            _ => Err(format!("Invalid delegation status: {}", s)),
        }
    }
}

/// Role carried by an account and by every authenticated session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
    Executor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Executor => "executor",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "executor" => Ok(Role::Executor),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// The persisted relationship between a principal and an invited executor
///
/// `invite_token` is never serialized; it leaves the system only inside the
/// invitation email.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    #[serde(rename = "name")]
    pub executor_name: String,
    #[serde(rename = "email")]
    pub executor_email: String,
    #[serde(rename = "contactNumber")]
    pub executor_contact: Option<String>,
    pub status: DelegationStatus,
    pub executor_user_id: Option<Uuid>,
    #[serde(skip_serializing)]
    pub invite_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An account as seen through the identity directory
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    #[serde(skip_serializing)]
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating an account through the identity directory
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub password: String,
}

/// Category of a financial record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordCategory {
    Banking,
    Asset,
    Debt,
    Insurance,
    Utility,
    Investment,
}

impl RecordCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordCategory::Banking => "banking",
            RecordCategory::Asset => "asset",
            RecordCategory::Debt => "debt",
            RecordCategory::Insurance => "insurance",
            RecordCategory::Utility => "utility",
            RecordCategory::Investment => "investment",
        }
    }
}

impl std::str::FromStr for RecordCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "banking" => Ok(RecordCategory::Banking),
            "asset" => Ok(RecordCategory::Asset),
            "debt" => Ok(RecordCategory::Debt),
            "insurance" => Ok(RecordCategory::Insurance),
            "utility" => Ok(RecordCategory::Utility),
            "investment" => Ok(RecordCategory::Investment),
            _ => Err(format!("Invalid record category: {}", s)),
        }
    }
}

/// A single per-category financial record
///
/// The optional columns cover the union of the category shapes: banking uses
/// `account_number`/`amount`, insurance uses `provider`/`account_number` as
/// the policy number, debts use `amount`/`due_date`, and so on.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub category: RecordCategory,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub provider: Option<String>,
    pub account_number: Option<String>,
    pub amount: Option<f64>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to designate a new executor
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExecutorRequest {
    pub name: String,
    pub email: String,
    pub contact_number: Option<String>,
}

/// Owner-initiated patch of an executor's descriptive fields
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExecutorRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub contact_number: Option<String>,
}

/// Callback body for the invitation link
#[derive(Debug, Deserialize)]
pub struct InviteActionRequest {
    pub action: String,
    pub token: String,
}

/// Filters for listing executors
#[derive(Debug, Default, Deserialize)]
pub struct ExecutorQuery {
    pub status: Option<DelegationStatus>,
    pub search: Option<String>,
}

/// Request to create a financial record in some category
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub provider: Option<String>,
    pub account_number: Option<String>,
    pub amount: Option<f64>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Patch for an existing financial record
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecordRequest {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
    pub provider: Option<String>,
    pub account_number: Option<String>,
    pub amount: Option<f64>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Filters for listing financial records
#[derive(Debug, Default, Deserialize)]
pub struct RecordQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delegation_status_round_trip() {
        for s in ["pending", "approved", "revoked"] {
            let status: DelegationStatus = s.parse().unwrap();
            assert_eq!(status.as_str(), s);
        }
    }

    #[test]
    fn test_delegation_status_invalid() {
        assert!("accepted".parse::<DelegationStatus>().is_err());
    }

    #[test]
    fn test_role_round_trip() {
        for s in ["user", "admin", "executor"] {
            let role: Role = s.parse().unwrap();
            assert_eq!(role.as_str(), s);
        }
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_record_category_round_trip() {
        for s in ["banking", "asset", "debt", "insurance", "utility", "investment"] {
            let cat: RecordCategory = s.parse().unwrap();
            assert_eq!(cat.as_str(), s);
        }
        assert!("crypto".parse::<RecordCategory>().is_err());
    }

    #[test]
    fn test_delegation_record_serialization_hides_token() {
        let record = DelegationRecord {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            executor_name: "Jane Doe".to_string(),
            executor_email: "jane@example.com".to_string(),
            executor_contact: Some("07700900000".to_string()),
            status: DelegationStatus::Pending,
            executor_user_id: None,
            invite_token: Some("secret-token".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("inviteToken").is_none());
        assert!(json.get("invite_token").is_none());
        assert_eq!(json["name"], "Jane Doe");
        assert_eq!(json["contactNumber"], "07700900000");
        assert_eq!(json["status"], "pending");
    }

    #[test]
    fn test_account_serialization_hides_password() {
        let account = Account {
            id: Uuid::new_v4(),
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            phone: None,
            role: Role::Executor,
            password: "Jane@123".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&account).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["role"], "executor");
    }

    #[test]
    fn test_create_executor_request_camel_case() {
        let req: CreateExecutorRequest = serde_json::from_str(
            r#"{"name": "Jane", "email": "jane@example.com", "contactNumber": "123"}"#,
        )
        .unwrap();
        assert_eq!(req.contact_number.as_deref(), Some("123"));
    }

    #[test]
    fn test_record_request_type_field() {
        let req: CreateRecordRequest = serde_json::from_str(
            r#"{"type": "creditCard", "name": "Barclaycard", "amount": 1200.5}"#,
        )
        .unwrap();
        assert_eq!(req.kind, "creditCard");
        assert_eq!(req.amount, Some(1200.5));
    }
}
