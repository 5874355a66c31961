//! Placerly server - personal finance record-keeping backend

pub mod auth;
pub mod config;
pub mod delegation;
pub mod directory;
pub mod error;
pub mod http;
pub mod models;
pub mod notify;
pub mod records;
pub mod token;

use sqlx::SqlitePool;
use std::sync::Arc;

use auth::SessionTokens;
use delegation::{AccessScopeResolver, DelegationService, ExecutorRegistry, TokenCodec};
use directory::SqliteDirectory;
use notify::NotificationGateway;
use records::RecordStore;
use token::SigningKey;

/// Application state shared across handlers
pub struct AppState {
    pub delegations: DelegationService,
    pub scope: AccessScopeResolver,
    pub records: RecordStore,
    pub sessions: SessionTokens,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        secret: &str,
        app_url: impl Into<String>,
        mailer: Arc<dyn NotificationGateway>,
    ) -> Arc<Self> {
        let key = SigningKey::new(secret);
        let registry = ExecutorRegistry::new(pool.clone());
        let directory = Arc::new(SqliteDirectory::new(pool.clone()));

        let delegations = DelegationService::new(
            registry.clone(),
            directory,
            mailer,
            TokenCodec::new(key.clone()),
            app_url,
        );

        Arc::new(Self {
            delegations,
            scope: AccessScopeResolver::new(registry),
            records: RecordStore::new(pool),
            sessions: SessionTokens::new(key),
        })
    }
}
