//! Radix-tree request router and the per-request pipeline.
//!
//! One tree per HTTP method, O(path-length) lookup. Each registered path maps
//! to an endpoint: the route's own middleware stages followed by its handler.
//! Global stages run before the lookup, so they see every request, including
//! ones that match no route or use a method the router does not know.

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;
use tracing::error;

use crate::error::ApiError;
use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::middleware::{BoxedMiddleware, Flow, Middleware, Pipeline};
use crate::request::Request;
use crate::response::{IntoResponse, Response};

struct Endpoint<S> {
    stages: Pipeline,
    handler: BoxedHandler<S>,
}

/// The application router.
///
/// Build it once at startup with the application state `S`; pass it to
/// [`Server::serve`](crate::Server::serve). Every builder method returns
/// `self` so registrations chain naturally.
pub struct Router<S> {
    global: Pipeline,
    routes: HashMap<Method, MatchitRouter<Arc<Endpoint<S>>>>,
    state: S,
}

impl<S> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(state: S) -> Self {
        Self { global: Pipeline::default(), routes: HashMap::new(), state }
    }

    /// Appends a stage that runs for every request, before routing.
    /// Stages run in the order they were added.
    pub fn wrap(mut self, stage: impl Middleware) -> Self {
        self.global.push(Arc::new(stage));
        self
    }

    /// Register a handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them:
    ///
    /// ```rust,no_run
    /// # use stockroom::{Method, Request, Response, Router};
    /// # async fn get_product(_: Request, _: ()) -> Response { Response::text("") }
    /// # async fn delete_product(_: Request, _: ()) -> Response { Response::text("") }
    /// Router::new(())
    ///     .on(Method::Get,    "/api/products/{id}", get_product)
    ///     .on(Method::Delete, "/api/products/{id}", delete_product);
    /// ```
    pub fn on(self, method: Method, path: &str, handler: impl Handler<S>) -> Self {
        self.add(method, path, Pipeline::default(), handler)
    }

    /// Like [`on`](Router::on), with stages that run only for this route,
    /// after the global ones.
    pub fn on_with(
        self,
        method: Method,
        path: &str,
        stages: impl IntoIterator<Item = BoxedMiddleware>,
        handler: impl Handler<S>,
    ) -> Self {
        self.add(method, path, stages.into_iter().collect(), handler)
    }

    fn add(mut self, method: Method, path: &str, stages: Pipeline, handler: impl Handler<S>) -> Self {
        let endpoint = Arc::new(Endpoint { stages, handler: handler.into_boxed_handler() });
        // Route tables are fixed at startup; a bad pattern is a programming error.
        self.routes
            .entry(method)
            .or_default()
            .insert(path, endpoint)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    fn lookup(
        &self,
        method: &str,
        path: &str,
    ) -> Result<(Arc<Endpoint<S>>, HashMap<String, String>), ApiError> {
        let Ok(method) = method.parse::<Method>() else {
            return Err(ApiError::MethodNotAllowed);
        };
        let matched = self.routes.get(&method).and_then(|tree| tree.at(path).ok());
        let Some(matched) = matched else {
            let other_method = self.routes.values().any(|tree| tree.at(path).is_ok());
            return Err(if other_method { ApiError::MethodNotAllowed } else { ApiError::RouteNotFound });
        };
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Ok((Arc::clone(matched.value), params))
    }

    /// Runs one request through the whole pipeline: global stages, routing,
    /// route stages, handler. Handler failures, including panics, come back
    /// as error envelopes; this never fails to produce a response.
    pub async fn handle(&self, req: Request) -> Response {
        match self.screen(&req) {
            Flow::Respond(res) => res,
            Flow::Continue => self.route(req).await,
        }
    }

    /// Runs the global stages only. The server calls this on the request head
    /// before it reads the body.
    pub(crate) fn screen(&self, req: &Request) -> Flow {
        self.global.run(req)
    }

    /// Everything after the global stages: lookup, route stages, handler.
    pub(crate) async fn route(&self, mut req: Request) -> Response {
        let (endpoint, params) = match self.lookup(&req.method, &req.path) {
            Ok(found) => found,
            Err(e) => return e.into_response(),
        };
        req.params = params;

        if let Flow::Respond(res) = endpoint.stages.run(&req) {
            return res;
        }

        // The handler gets its own task so a panic surfaces as a JoinError
        // instead of tearing down the connection.
        let fut = endpoint.handler.call(req, self.state.clone());
        match tokio::spawn(fut).await {
            Ok(res) => res,
            Err(e) => {
                error!("handler failed: {e}");
                ApiError::Internal(None).into_response()
            }
        }
    }
}
