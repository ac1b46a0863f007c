//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                        - Storefront page (catalog + new empty cart)
//! GET  /health                  - Health check
//!
//! # Cart widget (HTMX fragments)
//! GET  /widget/{id}/cart        - Cart fragment
//! POST /widget/{id}/events      - Cart event (action, product_id, quantity, image)
//! POST /widget/{id}/checkout    - Checkout (form fragment + out-of-band cart)
//! ```

pub mod cart;
pub mod checkout;
pub mod home;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart widget routes router.
pub fn widget_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}/cart", get(cart::show))
        .route("/{id}/events", post(cart::events))
        .route("/{id}/checkout", post(checkout::submit))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health))
        .nest("/widget", widget_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}
