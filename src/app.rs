//! The product API: route table and handlers.
//!
//! | Method | Path | Stages | |
//! |---|---|---|---|
//! | GET | `/` | | welcome text |
//! | GET | `/api/products` | | all products |
//! | GET | `/api/products/{id}` | | one product or 404 |
//! | POST | `/api/products` | [`ValidateProduct::full`] | create, 201 |
//! | PUT | `/api/products/{id}` | [`ValidateProduct::partial`] | partial update or 404 |
//! | DELETE | `/api/products/{id}` | | always 200 |
//!
//! Every route sits behind [`RequestLogger`] and [`ApiKeyAuth`], in that order.

use std::sync::Arc;

use serde_json::Number;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::method::Method;
use crate::middleware::{ApiKeyAuth, BoxedMiddleware, RequestLogger, ValidateProduct};
use crate::request::Request;
use crate::response::{IntoResponse, Json, Response};
use crate::router::Router;
use crate::status::Status;
use crate::store::{NewProduct, ProductId, ProductPatch, SharedStore, Store};

pub const WELCOME: &str = "Welcome to the Product API! Go to /api/products to see all products.";

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self { store: Arc::new(Mutex::new(store)) }
    }
}

/// Builds the full application: global stages, routes, and route stages.
pub fn router(state: AppState, api_key: Option<String>) -> Router<AppState> {
    Router::new(state)
        .wrap(RequestLogger)
        .wrap(ApiKeyAuth::new(api_key))
        .on(Method::Get, "/", welcome)
        .on(Method::Get, "/api/products", list_products)
        .on(Method::Get, "/api/products/{id}", get_product)
        .on_with(Method::Post, "/api/products", [stage(ValidateProduct::full())], create_product)
        .on_with(Method::Put, "/api/products/{id}", [stage(ValidateProduct::partial())], update_product)
        .on(Method::Delete, "/api/products/{id}", delete_product)
}

fn stage(v: ValidateProduct) -> BoxedMiddleware {
    Arc::new(v)
}

fn product_id(req: &Request) -> ProductId {
    ProductId::new(req.param("id").unwrap_or_default().trim())
}

// GET /
async fn welcome(_req: Request, _state: AppState) -> Response {
    Response::text(WELCOME)
}

// GET /api/products
async fn list_products(_req: Request, state: AppState) -> Response {
    let store = state.store.lock().await;
    Json(store.list()).into_response()
}

// GET /api/products/{id}
async fn get_product(req: Request, state: AppState) -> Response {
    let id = product_id(&req);
    let store = state.store.lock().await;
    match store.get(&id) {
        Some(product) => Json(product).into_response(),
        None => ApiError::NotFound.reject(),
    }
}

// POST /api/products
async fn create_product(req: Request, state: AppState) -> Result<Response, ApiError> {
    let fields: NewProduct = req.json()?;
    if fields.name.is_empty() || is_zero(&fields.price) {
        return Err(ApiError::validation("Product name and price required"));
    }

    let product = state.store.lock().await.create(fields);
    info!(id = %product.id, "product created");

    let location = format!("/api/products/{}", product.id);
    let body = serde_json::to_vec(&product).map_err(|e| ApiError::Internal(Some(e.to_string())))?;
    Ok(Response::builder()
        .status(Status::Created)
        .header("location", &location)
        .json(body))
}

// PUT /api/products/{id}
async fn update_product(req: Request, state: AppState) -> Result<Response, ApiError> {
    let id = product_id(&req);
    let patch: ProductPatch = req.json()?;

    let updated = state.store.lock().await.update(&id, patch);
    Ok(match updated {
        Some(product) => {
            info!(%id, "product updated");
            Json(product).into_response()
        }
        None => ApiError::NotFound.reject(),
    })
}

// DELETE /api/products/{id}
async fn delete_product(req: Request, state: AppState) -> Response {
    let id = product_id(&req);
    let removed = state.store.lock().await.delete(&id);
    debug!(%id, removed, "product delete");
    Response::message(Status::Ok, "Product deleted successfully")
}

fn is_zero(n: &Number) -> bool {
    n.as_f64() == Some(0.0)
}
