//! Session handling for the admin panel. Sign-in and user lookup are
//! delegated to the store's auth primitives; this module only moves the
//! session token through the `menta_session` cookie and gates admin routes
//! on the user's role.

use axum::http::{header, HeaderMap};
use tracing::warn;

use crate::error::AppError;
use crate::store::{AuthUser, Store, StoreError};

pub const SESSION_COOKIE: &str = "menta_session";

pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == SESSION_COOKIE).then(|| value.to_string())
        })
}

pub fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0")
}

pub async fn current_user(
    store: &dyn Store,
    headers: &HeaderMap,
) -> Result<Option<AuthUser>, StoreError> {
    match session_token(headers) {
        Some(token) => store.current_user(&token).await,
        None => Ok(None),
    }
}

/// Resolves the caller's session and requires the admin role.
pub async fn require_admin(store: &dyn Store, headers: &HeaderMap) -> Result<AuthUser, AppError> {
    let user = current_user(store, headers)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if user.role != "admin" {
        warn!(
            "Unauthorized admin access attempt by {}",
            user.email.as_deref().unwrap_or("unknown")
        );
        return Err(AppError::Unauthorized);
    }

    Ok(user)
}

#[cfg(test)]
mod tests {
    use axum::http::{header, HeaderMap, HeaderValue};

    use super::{session_cookie, session_token};

    #[test]
    fn test_token_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; menta_session=abc-123; lang=es"),
        );

        assert_eq!(session_token(&headers), Some("abc-123".to_string()));
    }

    #[test]
    fn test_missing_cookie() {
        let headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn test_set_cookie_round_trip() {
        let mut headers = HeaderMap::new();
        let set = session_cookie("tok-1");
        let cookie_pair = set.split(';').next().unwrap_or_default().to_string();
        headers.insert(header::COOKIE, HeaderValue::from_str(&cookie_pair).unwrap());

        assert_eq!(session_token(&headers), Some("tok-1".to_string()));
    }
}
