//! # Store
//!
//! Seam over the hosted database/auth service. The rest of the code talks
//! to the four row primitives plus the auth calls and never sees whether
//! they hit the remote service or the in-process fallback.
//!
//! Every call is a single request/response with no retries; a failure
//! surfaces immediately as a [`StoreError`] for the caller to translate.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

pub mod memory;
pub mod postgrest;

pub const CATEGORIES: &str = "categories";
pub const PRODUCTS: &str = "products";
pub const AUDIT_LOGS: &str = "audit_logs";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unreachable: {0}")]
    Unreachable(String),

    #[error("{0}")]
    Rejected(String),

    /// The targeted row does not exist. Updates against a missing id report
    /// this instead of succeeding as a no-op.
    #[error("row not found")]
    RowNotFound,
}

/// Equality filter on a single column.
#[derive(Clone, Debug)]
pub struct Filter {
    pub column: &'static str,
    pub value: String,
}

impl Filter {
    pub fn eq(column: &'static str, value: impl Into<String>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Order {
    pub column: &'static str,
    pub ascending: bool,
}

impl Order {
    pub fn ascending(column: &'static str) -> Self {
        Self {
            column,
            ascending: true,
        }
    }

    pub fn descending(column: &'static str) -> Self {
        Self {
            column,
            ascending: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Session {
    pub token: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    pub role: String,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn select(
        &self,
        table: &str,
        filter: Option<Filter>,
        order: Option<Order>,
    ) -> Result<Vec<Value>, StoreError>;

    async fn insert(&self, table: &str, record: Value) -> Result<Value, StoreError>;

    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value, StoreError>;

    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError>;

    /// Deletes every row matching the filter, returning how many went away.
    /// Used for the child leg of a parent-category cascade.
    async fn delete_where(&self, table: &str, filter: Filter) -> Result<u64, StoreError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, StoreError>;

    async fn sign_out(&self, token: &str) -> Result<(), StoreError>;

    async fn current_user(&self, token: &str) -> Result<Option<AuthUser>, StoreError>;
}

pub fn decode<T: DeserializeOwned>(row: Value) -> Result<T, StoreError> {
    serde_json::from_value(row).map_err(|e| StoreError::Rejected(format!("malformed row: {e}")))
}

pub fn decode_all<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, StoreError> {
    rows.into_iter().map(decode).collect()
}
