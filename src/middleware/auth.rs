//! Shared-secret API key stage.

use tracing::warn;

use super::{Flow, Middleware};
use crate::error::ApiError;
use crate::request::Request;

/// Header carrying the client's key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Rejects any request whose `x-api-key` header does not equal the
/// configured secret.
///
/// With no secret configured no key can match, so every request is rejected.
/// The comparison is a plain byte comparison, not constant-time.
#[derive(Debug, Clone)]
pub struct ApiKeyAuth {
    secret: Option<String>,
}

impl ApiKeyAuth {
    pub fn new(secret: Option<String>) -> Self {
        Self { secret }
    }
}

impl Middleware for ApiKeyAuth {
    fn handle(&self, req: &Request) -> Flow {
        match (req.header(API_KEY_HEADER), self.secret.as_deref()) {
            (Some(presented), Some(secret)) if presented == secret => Flow::Continue,
            (presented, _) => {
                warn!(
                    path = %req.path(),
                    key_present = presented.is_some(),
                    "rejected request with invalid API key"
                );
                Flow::Respond(ApiError::Unauthorized.reject())
            }
        }
    }
}
