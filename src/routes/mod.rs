mod health;
mod products;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::AppState;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/api/products", get(products::list_products))
        .route("/api/upload", post(products::upload_product))
        .route("/api/update", put(products::update_product))
        .route("/api/delete", delete(products::delete_product))
}
