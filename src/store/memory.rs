//! In-process [`Store`] used when no hosted store is configured, and by the
//! service tests. Rows live as JSON objects in per-table vectors; sessions
//! are plain token-to-user entries backed by one optional admin credential.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AuthUser, Filter, Order, Session, Store, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Value>>>,
    sessions: RwLock<HashMap<String, AuthUser>>,
    admin: Option<(String, String)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_admin(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            admin: Some((email.into(), password.into())),
            ..Self::default()
        }
    }
}

fn matches(row: &Value, filter: &Filter) -> bool {
    match row.get(filter.column) {
        Some(Value::String(s)) => *s == filter.value,
        Some(Value::Bool(b)) => b.to_string() == filter.value,
        Some(Value::Number(n)) => n.to_string() == filter.value,
        _ => false,
    }
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .unwrap_or(0.0)
            .partial_cmp(&y.as_f64().unwrap_or(0.0))
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

fn row_id_is(row: &Value, id: &str) -> bool {
    row.get("id").and_then(Value::as_str) == Some(id)
}

#[async_trait]
impl Store for MemoryStore {
    async fn select(
        &self,
        table: &str,
        filter: Option<Filter>,
        order: Option<Order>,
    ) -> Result<Vec<Value>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Value> = tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| filter.as_ref().map_or(true, |f| matches(row, f)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = order {
            rows.sort_by(|a, b| {
                let ordering = compare(
                    a.get(order.column).unwrap_or(&Value::Null),
                    b.get(order.column).unwrap_or(&Value::Null),
                );
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }

        Ok(rows)
    }

    async fn insert(&self, table: &str, mut record: Value) -> Result<Value, StoreError> {
        let Some(fields) = record.as_object_mut() else {
            return Err(StoreError::Rejected("record must be an object".into()));
        };
        fields
            .entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));

        let mut tables = self.tables.write().await;
        tables.entry(table.to_string()).or_default().push(record.clone());

        Ok(record)
    }

    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value, StoreError> {
        let Some(fields) = patch.as_object() else {
            return Err(StoreError::Rejected("patch must be an object".into()));
        };

        let mut tables = self.tables.write().await;
        let row = tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|row| row_id_is(row, id)))
            .ok_or(StoreError::RowNotFound)?;

        for (key, value) in fields {
            row[key.as_str()] = value.clone();
        }

        Ok(row.clone())
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(rows) = tables.get_mut(table) {
            rows.retain(|row| !row_id_is(row, id));
        }
        Ok(())
    }

    async fn delete_where(&self, table: &str, filter: Filter) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };

        let before = rows.len();
        rows.retain(|row| !matches(row, &filter));
        Ok((before - rows.len()) as u64)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, StoreError> {
        let Some((admin_email, admin_password)) = &self.admin else {
            return Err(StoreError::Rejected("admin credentials not configured".into()));
        };

        if email != admin_email || password != admin_password {
            return Err(StoreError::Rejected("invalid login credentials".into()));
        }

        let token = Uuid::new_v4().to_string();
        self.sessions.write().await.insert(
            token.clone(),
            AuthUser {
                id: "admin".into(),
                email: Some(admin_email.clone()),
                role: "admin".into(),
            },
        );

        Ok(Session { token })
    }

    async fn sign_out(&self, token: &str) -> Result<(), StoreError> {
        self.sessions.write().await.remove(token);
        Ok(())
    }

    async fn current_user(&self, token: &str) -> Result<Option<AuthUser>, StoreError> {
        Ok(self.sessions.read().await.get(token).cloned())
    }
}
