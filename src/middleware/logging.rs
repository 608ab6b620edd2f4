//! Request logging stage.

use tracing::info;

use super::{Flow, Middleware};
use crate::request::Request;

/// Records every request's method and path. Never stops a request.
///
/// The timestamp is added by the installed `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestLogger;

impl Middleware for RequestLogger {
    fn handle(&self, req: &Request) -> Flow {
        info!(method = %req.method(), path = %req.path(), "request");
        Flow::Continue
    }
}
