//! # MENTA
//!
//! Backend for a small affiliate product catalog: a public storefront feed
//! and a cookie-gated admin panel over two tables, `products` and
//! `categories`, held in a hosted database/auth service.
//!
//!
//!
//! # Architecture
//!
//! - Public reads (`/`, `/categories`) build their payload from the store
//!   and fall back to a built-in sample catalog when it is unreachable or
//!   empty, so the storefront never renders blank.
//! - Admin mutations validate locally, write through the [`store::Store`]
//!   seam, then invalidate the cached read views they made stale and append
//!   an audit row.
//! - Categories form a two-level hierarchy. The navigation tree is built in
//!   process from the flat table ([`tree`]); deleting a parent cascades
//!   over its direct children as an explicit two-step delete.
//! - Without `MENTA_STORE_URL` the service runs entirely on the in-memory
//!   store, which is also what the tests drive.
//!
//!
//!
//! # Notes
//!
//! ## Hosted store
//!
//! The store is treated as an opaque CRUD + auth service (PostgREST
//! dialect). No retries, no timeouts beyond the client defaults: a failed
//! call surfaces straight to the caller as a displayable error, and list
//! surfaces degrade to empty or sample content instead of an error page.
//!
//! ## View invalidation
//!
//! Every mutation returns the set of views it invalidates rather than
//! relying on a framework revalidation hook; see [`views`].
use std::time::Duration;

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};

use signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub mod audit;
pub mod auth;
pub mod categories;
pub mod config;
pub mod error;
pub mod fallback;
pub mod models;
pub mod products;
pub mod routes;
pub mod slug;
pub mod state;
pub mod store;
pub mod tree;
pub mod views;

use routes::{
    admin_categories_handler, admin_product_handler, admin_products_handler, categories_handler,
    create_category_handler, create_product_handler, delete_category_handler,
    delete_product_handler, login_handler, logout_handler, storefront_handler,
    toggle_product_handler, update_category_handler, update_product_handler,
};
use state::State;

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = State::new().await;

    info!("Starting server...");

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let app = Router::new()
        .route("/", get(storefront_handler))
        .route("/categories", get(categories_handler))
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .route(
            "/admin/categories",
            get(admin_categories_handler).post(create_category_handler),
        )
        .route(
            "/admin/categories/{id}",
            post(update_category_handler).delete(delete_category_handler),
        )
        .route(
            "/admin/products",
            get(admin_products_handler).post(create_product_handler),
        )
        .route(
            "/admin/products/{id}",
            get(admin_product_handler)
                .post(update_product_handler)
                .delete(delete_product_handler),
        )
        .route("/admin/products/{id}/active", post(toggle_product_handler))
        .layer(cors)
        .with_state(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
