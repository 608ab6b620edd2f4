//! # stockroom
//!
//! A small HTTP/JSON service that keeps a catalogue of products in memory.
//! Nothing is persisted: the process starts with three products and forgets
//! everything when it exits.
//!
//! ## The pipeline
//!
//! Every request runs through the same ordered stages:
//!
//! ```text
//! RequestLogger → ApiKeyAuth → route lookup → [ValidateProduct] → handler
//!                                                                   ↓ Err
//!                                                            error responder
//! ```
//!
//! A stage either lets the request through or answers it itself; see
//! [`middleware`]. Handlers that fail return an [`ApiError`], which is
//! rendered as `{"status": "error", "message": …}`.
//!
//! What's underneath:
//!
//! - Radix-tree routing via [`matchit`]
//! - hyper on tokio, HTTP/1.1 and HTTP/2
//! - Graceful shutdown on SIGTERM / Ctrl-C, draining in-flight requests
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use stockroom::{AppState, Server, Store, app};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), stockroom::Error> {
//!     let state = AppState::new(Store::seeded());
//!     let router = app::router(state, Some("s3cret".to_owned()));
//!
//!     Server::bind("0.0.0.0:3000").await?.serve(router).await
//! }
//! ```

mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod app;
pub mod config;
pub mod middleware;
pub mod store;

pub use app::AppState;
pub use config::Config;
pub use error::{ApiError, Error};
pub use handler::Handler;
pub use method::Method;
pub use request::Request;
pub use response::{IntoResponse, Json, Response, ResponseBuilder};
pub use router::Router;
pub use server::{DEFAULT_BODY_LIMIT, Server};
pub use status::Status;
pub use store::{NewProduct, Product, ProductId, ProductPatch, SharedStore, Store};
