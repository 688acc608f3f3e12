pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::infra::http::RouterState;
use crate::infra::http::middleware::log_responses;

pub fn build_api_router(state: RouterState) -> Router<RouterState> {
    let caller_state = state.api.clone();

    Router::new()
        .route("/api/v1/auth/me", get(handlers::get_me))
        .route("/api/v1/monitor/run", post(handlers::run_monitor))
        .route(
            "/api/v1/reviews",
            get(handlers::list_reviews).post(handlers::create_review),
        )
        .route(
            "/api/v1/reviews/{id}",
            get(handlers::get_review).delete(handlers::delete_review),
        )
        .route(
            "/api/v1/cart-items",
            get(handlers::list_cart_items).post(handlers::add_cart_item),
        )
        .route(
            "/api/v1/cart-items/{id}",
            get(handlers::get_cart_item).delete(handlers::remove_cart_item),
        )
        .route(
            "/api/v1/wishlist-items",
            get(handlers::list_wishlist_items).post(handlers::add_wishlist_item),
        )
        .route(
            "/api/v1/wishlist-items/{id}",
            get(handlers::get_wishlist_item).delete(handlers::remove_wishlist_item),
        )
        .route(
            "/api/v1/orders",
            get(handlers::list_orders).post(handlers::create_order),
        )
        .route("/api/v1/{resource}", get(handlers::list_collection))
        .route("/api/v1/{resource}/{id}", get(handlers::retrieve_record))
        .with_state(state)
        .layer(axum_middleware::from_fn_with_state(
            caller_state,
            middleware::resolve_caller,
        ))
        .layer(axum_middleware::from_fn(log_responses))
}
