//! Middleware layer.
//!
//! A request passes through an explicit, ordered list of stages before it
//! reaches its handler. Each stage inspects the request and either lets it
//! through ([`Flow::Continue`]) or answers it on the spot
//! ([`Flow::Respond`]), in which case no later stage and no handler runs.
//!
//! Stages come in two scopes:
//!
//! - **global**, registered with [`Router::wrap`](crate::Router::wrap), run
//!   for every request, before routing;
//! - **route**, registered with [`Router::on_with`](crate::Router::on_with),
//!   run after routing, only for that method + path.
//!
//! Built-in stages:
//! - [`RequestLogger`]: records method and path
//! - [`ApiKeyAuth`]: shared-secret `x-api-key` check
//! - [`ValidateProduct`]: product body presence/type checks

use std::sync::Arc;

use crate::request::Request;
use crate::response::Response;

mod auth;
mod logging;
mod validation;

pub use auth::{API_KEY_HEADER, ApiKeyAuth};
pub use logging::RequestLogger;
pub use validation::ValidateProduct;

/// What a stage decided.
#[derive(Debug)]
pub enum Flow {
    /// Hand the request to the next stage (or the handler).
    Continue,
    /// Terminate the pipeline with this response.
    Respond(Response),
}

/// One pipeline stage.
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, req: &Request) -> Flow;
}

/// A type-erased stage shared across concurrent requests.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An ordered list of stages.
#[derive(Clone, Default)]
pub(crate) struct Pipeline {
    stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    pub(crate) fn push(&mut self, stage: BoxedMiddleware) {
        self.stages.push(stage);
    }

    /// Runs the stages in order, stopping at the first one that responds.
    pub(crate) fn run(&self, req: &Request) -> Flow {
        for stage in &self.stages {
            if let Flow::Respond(res) = stage.handle(req) {
                return Flow::Respond(res);
            }
        }
        Flow::Continue
    }
}

impl FromIterator<BoxedMiddleware> for Pipeline {
    fn from_iter<I: IntoIterator<Item = BoxedMiddleware>>(iter: I) -> Self {
        Self { stages: iter.into_iter().collect() }
    }
}
