//! Hosted-store client speaking the Supabase flavour of PostgREST.
//!
//! Row calls go to `{base}/rest/v1/{table}` with the service key in both
//! the `apikey` and bearer headers; auth calls go to `{base}/auth/v1/*`.
//! Mutations ask for `return=representation` so an update against a missing
//! id is distinguishable from a successful one.

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::{AuthUser, Filter, Order, Session, Store, StoreError};

pub struct PostgrestStore {
    http: Client,
    base: String,
    key: String,
}

impl PostgrestStore {
    pub fn new(base: &str, key: &str) -> Self {
        Self {
            http: Client::new(),
            base: base.trim_end_matches('/').to_string(),
            key: key.to_string(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base)
    }

    fn keyed(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.key))
    }

    fn apply(request: RequestBuilder, filter: Option<&Filter>, order: Option<Order>) -> RequestBuilder {
        let mut request = request;
        if let Some(filter) = filter {
            request = request.query(&[(filter.column, format!("eq.{}", filter.value))]);
        }
        if let Some(order) = order {
            let direction = if order.ascending { "asc" } else { "desc" };
            request = request.query(&[("order", format!("{}.{direction}", order.column))]);
        }
        request
    }
}

async fn send(request: RequestBuilder) -> Result<Response, StoreError> {
    let response = request
        .send()
        .await
        .map_err(|e| StoreError::Unreachable(e.to_string()))?;

    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message.or(b.error_description).or(b.msg))
        .unwrap_or_else(|| format!("store responded with {status}"));

    Err(StoreError::Rejected(message))
}

async fn rows(response: Response) -> Result<Vec<Value>, StoreError> {
    response
        .json()
        .await
        .map_err(|e| StoreError::Rejected(format!("malformed store response: {e}")))
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error_description: Option<String>,
    msg: Option<String>,
}

#[derive(Deserialize)]
struct TokenPayload {
    access_token: String,
}

#[derive(Deserialize)]
struct UserPayload {
    id: String,
    email: Option<String>,
    #[serde(default)]
    app_metadata: UserMetadata,
}

#[derive(Deserialize, Default)]
struct UserMetadata {
    role: Option<String>,
}

#[async_trait]
impl Store for PostgrestStore {
    async fn select(
        &self,
        table: &str,
        filter: Option<Filter>,
        order: Option<Order>,
    ) -> Result<Vec<Value>, StoreError> {
        let request = Self::apply(
            self.keyed(self.http.get(self.table_url(table))),
            filter.as_ref(),
            order,
        );
        rows(send(request).await?).await
    }

    async fn insert(&self, table: &str, record: Value) -> Result<Value, StoreError> {
        let request = self
            .keyed(self.http.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(&record);

        let mut inserted = rows(send(request).await?).await?;
        inserted
            .pop()
            .ok_or_else(|| StoreError::Rejected("insert returned no row".into()))
    }

    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value, StoreError> {
        let request = self
            .keyed(self.http.patch(self.table_url(table)))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(&patch);

        let mut updated = rows(send(request).await?).await?;
        updated.pop().ok_or(StoreError::RowNotFound)
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError> {
        let request = self
            .keyed(self.http.delete(self.table_url(table)))
            .query(&[("id", format!("eq.{id}"))]);

        send(request).await?;
        Ok(())
    }

    async fn delete_where(&self, table: &str, filter: Filter) -> Result<u64, StoreError> {
        let request = self
            .keyed(self.http.delete(self.table_url(table)))
            .query(&[(filter.column, format!("eq.{}", filter.value))])
            .header("Prefer", "return=representation");

        let deleted = rows(send(request).await?).await?;
        Ok(deleted.len() as u64)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, StoreError> {
        let request = self
            .keyed(
                self.http
                    .post(format!("{}/auth/v1/token", self.base))
                    .query(&[("grant_type", "password")]),
            )
            .json(&serde_json::json!({ "email": email, "password": password }));

        let payload: TokenPayload = send(request)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Rejected(format!("malformed auth response: {e}")))?;

        Ok(Session {
            token: payload.access_token,
        })
    }

    async fn sign_out(&self, token: &str) -> Result<(), StoreError> {
        let request = self
            .http
            .post(format!("{}/auth/v1/logout", self.base))
            .header("apikey", &self.key)
            .header(header::AUTHORIZATION, format!("Bearer {token}"));

        send(request).await?;
        Ok(())
    }

    async fn current_user(&self, token: &str) -> Result<Option<AuthUser>, StoreError> {
        let request = self
            .http
            .get(format!("{}/auth/v1/user", self.base))
            .header("apikey", &self.key)
            .header(header::AUTHORIZATION, format!("Bearer {token}"));

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Unreachable(e.to_string()))?;

        if response.status() == StatusCode::UNAUTHORIZED || response.status() == StatusCode::FORBIDDEN {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            return Err(StoreError::Rejected(format!("store responded with {status}")));
        }

        let payload: UserPayload = response
            .json()
            .await
            .map_err(|e| StoreError::Rejected(format!("malformed auth response: {e}")))?;

        Ok(Some(AuthUser {
            id: payload.id,
            email: payload.email,
            role: payload.app_metadata.role.unwrap_or_else(|| "authenticated".into()),
        }))
    }
}
