use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde_json::json;

use crate::audit::{self, AuditAction};
use crate::auth::{self, clear_session_cookie, session_cookie, session_token};
use crate::categories;
use crate::error::AppError;
use crate::models::{ActiveForm, CategoryForm, LoginForm, ProductForm};
use crate::products;
use crate::state;
use crate::views::View;

type AppState = State<Arc<state::State>>;

fn client_ip(headers: &HeaderMap) -> Option<&str> {
    headers.get("x-forwarded-for").and_then(|v| v.to_str().ok())
}

pub async fn storefront_handler(State(state): AppState) -> Json<serde_json::Value> {
    if let Some(cached) = state.views.get(View::Storefront).await {
        return Json(cached);
    }

    let (products, categories) = tokio::join!(
        products::storefront(state.store.as_ref(), &state.config.affiliate_id),
        categories::tree(state.store.as_ref()),
    );

    // fallback content is served but never cached, so a recovered store
    // takes over on the next request instead of after the next mutation
    let from_fallback = products.is_fallback() || categories.is_fallback();
    let payload = json!({
        "products": products.into_inner(),
        "categories": categories.into_inner(),
    });
    if !from_fallback {
        state.views.put(View::Storefront, payload.clone()).await;
    }

    Json(payload)
}

pub async fn categories_handler(State(state): AppState) -> Json<serde_json::Value> {
    Json(json!(categories::tree(state.store.as_ref()).await.into_inner()))
}

pub async fn login_handler(
    State(state): AppState,
    headers: HeaderMap,
    Form(payload): Form<LoginForm>,
) -> Response {
    let session = match state.store.sign_in(&payload.email, &payload.password).await {
        Ok(session) => session,
        Err(e) => {
            return (StatusCode::UNAUTHORIZED, Json(json!({ "error": e.to_string() })))
                .into_response();
        }
    };

    let user = state
        .store
        .current_user(&session.token)
        .await
        .ok()
        .flatten();
    audit::record(
        state.store.as_ref(),
        user.as_ref().map(|u| u.id.as_str()),
        AuditAction::Login,
        "auth",
        None,
        client_ip(&headers),
    )
    .await;

    (
        [(header::SET_COOKIE, session_cookie(&session.token))],
        Redirect::to("/admin/products"),
    )
        .into_response()
}

pub async fn logout_handler(State(state): AppState, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        let user = state.store.current_user(&token).await.ok().flatten();
        if let Err(e) = state.store.sign_out(&token).await {
            tracing::error!("Error signing out: {e}");
        }
        audit::record(
            state.store.as_ref(),
            user.as_ref().map(|u| u.id.as_str()),
            AuditAction::Logout,
            "auth",
            None,
            client_ip(&headers),
        )
        .await;
    }

    (
        [(header::SET_COOKIE, clear_session_cookie())],
        Redirect::to("/login"),
    )
        .into_response()
}

pub async fn admin_categories_handler(
    State(state): AppState,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    auth::require_admin(state.store.as_ref(), &headers).await?;

    if let Some(cached) = state.views.get(View::AdminCategories).await {
        return Ok(Json(cached));
    }

    let payload = json!(categories::list_with_parent(state.store.as_ref()).await);
    state.views.put(View::AdminCategories, payload.clone()).await;

    Ok(Json(payload))
}

pub async fn create_category_handler(
    State(state): AppState,
    headers: HeaderMap,
    Form(form): Form<CategoryForm>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = auth::require_admin(state.store.as_ref(), &headers).await?;

    let stale = categories::create(state.store.as_ref(), &form).await?;
    state.views.invalidate(stale).await;

    audit::record(
        state.store.as_ref(),
        Some(&user.id),
        AuditAction::CreateCategory,
        "categories",
        Some(json!({ "name": form.name })),
        client_ip(&headers),
    )
    .await;

    Ok(Json(json!({ "success": true })))
}

pub async fn update_category_handler(
    State(state): AppState,
    Path(id): Path<String>,
    headers: HeaderMap,
    Form(form): Form<CategoryForm>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = auth::require_admin(state.store.as_ref(), &headers).await?;

    let stale = categories::update(state.store.as_ref(), &id, &form).await?;
    state.views.invalidate(stale).await;

    audit::record(
        state.store.as_ref(),
        Some(&user.id),
        AuditAction::UpdateCategory,
        "categories",
        Some(json!({ "id": id, "name": form.name })),
        client_ip(&headers),
    )
    .await;

    Ok(Json(json!({ "success": true })))
}

pub async fn delete_category_handler(
    State(state): AppState,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = auth::require_admin(state.store.as_ref(), &headers).await?;

    let stale = categories::delete(state.store.as_ref(), &id).await?;
    state.views.invalidate(stale).await;

    audit::record(
        state.store.as_ref(),
        Some(&user.id),
        AuditAction::DeleteCategory,
        "categories",
        Some(json!({ "id": id })),
        client_ip(&headers),
    )
    .await;

    Ok(Json(json!({ "success": true })))
}

pub async fn admin_products_handler(
    State(state): AppState,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    auth::require_admin(state.store.as_ref(), &headers).await?;

    if let Some(cached) = state.views.get(View::AdminProducts).await {
        return Ok(Json(cached));
    }

    let payload = json!(products::list(state.store.as_ref()).await);
    state.views.put(View::AdminProducts, payload.clone()).await;

    Ok(Json(payload))
}

pub async fn admin_product_handler(
    State(state): AppState,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    auth::require_admin(state.store.as_ref(), &headers).await?;

    let product = products::get(state.store.as_ref(), &id).await?;
    Ok(Json(json!(product)))
}

pub async fn create_product_handler(
    State(state): AppState,
    headers: HeaderMap,
    Form(form): Form<ProductForm>,
) -> Result<Redirect, AppError> {
    let user = auth::require_admin(state.store.as_ref(), &headers).await?;

    let stale = products::create(state.store.as_ref(), &form).await?;
    state.views.invalidate(stale).await;

    audit::record(
        state.store.as_ref(),
        Some(&user.id),
        AuditAction::CreateProduct,
        "products",
        Some(json!({ "name": form.name })),
        client_ip(&headers),
    )
    .await;

    Ok(Redirect::to("/admin/products"))
}

pub async fn update_product_handler(
    State(state): AppState,
    Path(id): Path<String>,
    headers: HeaderMap,
    Form(form): Form<ProductForm>,
) -> Result<Redirect, AppError> {
    let user = auth::require_admin(state.store.as_ref(), &headers).await?;

    let stale = products::update(state.store.as_ref(), &id, &form).await?;
    state.views.invalidate(stale).await;

    audit::record(
        state.store.as_ref(),
        Some(&user.id),
        AuditAction::UpdateProduct,
        "products",
        Some(json!({ "id": id, "name": form.name })),
        client_ip(&headers),
    )
    .await;

    Ok(Redirect::to("/admin/products"))
}

pub async fn delete_product_handler(
    State(state): AppState,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = auth::require_admin(state.store.as_ref(), &headers).await?;

    let stale = products::delete(state.store.as_ref(), &id).await?;
    state.views.invalidate(stale).await;

    audit::record(
        state.store.as_ref(),
        Some(&user.id),
        AuditAction::DeleteProduct,
        "products",
        Some(json!({ "id": id })),
        client_ip(&headers),
    )
    .await;

    Ok(Json(json!({ "success": true })))
}

pub async fn toggle_product_handler(
    State(state): AppState,
    Path(id): Path<String>,
    headers: HeaderMap,
    Form(form): Form<ActiveForm>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = auth::require_admin(state.store.as_ref(), &headers).await?;

    let is_active = form.is_active.as_deref() == Some("true");
    let stale = products::set_active(state.store.as_ref(), &id, is_active).await?;
    state.views.invalidate(stale).await;

    audit::record(
        state.store.as_ref(),
        Some(&user.id),
        AuditAction::ToggleProduct,
        "products",
        Some(json!({ "id": id, "is_active": is_active })),
        client_ip(&headers),
    )
    .await;

    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::extract::State;

    use super::storefront_handler;
    use crate::config::Config;
    use crate::models::{CategoryForm, ProductForm};
    use crate::state;
    use crate::store::memory::MemoryStore;
    use crate::views::{View, ViewCache};
    use crate::{categories, products};

    fn test_state() -> Arc<state::State> {
        Arc::new(state::State {
            config: Config {
                port: 0,
                affiliate_id: "REF".into(),
                store: None,
                admin: None,
            },
            store: Arc::new(MemoryStore::new()),
            views: ViewCache::new(),
        })
    }

    #[tokio::test]
    async fn test_fallback_storefront_is_not_cached() {
        let state = test_state();

        // empty store: samples are served but must not stick in the cache
        storefront_handler(State(state.clone())).await;
        assert_eq!(state.views.get(View::Storefront).await, None);

        categories::create(
            state.store.as_ref(),
            &CategoryForm {
                name: "Perfumes".into(),
                parent_id: None,
                order_index: Some("1".into()),
            },
        )
        .await
        .unwrap();
        products::create(
            state.store.as_ref(),
            &ProductForm {
                name: "Luna Perfume".into(),
                description: None,
                price: Some("129.90".into()),
                image_url: None,
                affiliate_link: Some("https://natura.com.br/produto/luna".into()),
                brand: Some("Natura".into()),
                category_id: None,
                is_active: Some("true".into()),
            },
        )
        .await
        .unwrap();

        // live payload gets cached as usual
        storefront_handler(State(state.clone())).await;
        assert!(state.views.get(View::Storefront).await.is_some());
    }
}
