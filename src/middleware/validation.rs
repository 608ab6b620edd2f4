//! Product body validation stage.
//!
//! Runs before the create and update handlers. Checks happen in a fixed
//! order and the first failure answers `400 {"message": …}`.

use serde_json::{Map, Value};

use super::{Flow, Middleware};
use crate::error::ApiError;
use crate::request::Request;

const TEXT_FIELDS: [&str; 3] = ["name", "description", "category"];

const MISSING: &str = "All fields are required";
const NOT_TEXT: &str = "Name, description, and category must be strings";
const EMPTY_TEXT: &str = "Name, description, and category must not be empty";
const NOT_NUMBER: &str = "Price must be a number";
const NOT_BOOL: &str = "inStock must be a boolean (true/false)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Full,
    Partial,
}

/// Checks a product write body.
#[derive(Debug, Clone, Copy)]
pub struct ValidateProduct {
    mode: Mode,
}

impl ValidateProduct {
    /// Every field must be present and well-typed (create).
    pub fn full() -> Self {
        Self { mode: Mode::Full }
    }

    /// Only the fields that are present are checked (update).
    pub fn partial() -> Self {
        Self { mode: Mode::Partial }
    }

    /// Validates an already-decoded body object.
    pub fn check(&self, body: &Map<String, Value>) -> Result<(), ApiError> {
        match self.mode {
            Mode::Full => check_full(body),
            Mode::Partial => check_partial(body),
        }
    }
}

impl Middleware for ValidateProduct {
    fn handle(&self, req: &Request) -> Flow {
        match req.json_object().and_then(|body| self.check(&body)) {
            Ok(()) => Flow::Continue,
            Err(e) => Flow::Respond(e.reject()),
        }
    }
}

/// Null counts as absent.
fn field<'a>(body: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    body.get(key).filter(|v| !v.is_null())
}

fn check_full(body: &Map<String, Value>) -> Result<(), ApiError> {
    // Empty text is missing; `0` and `false` are present.
    let text_present = TEXT_FIELDS
        .iter()
        .all(|k| field(body, k).is_some_and(|v| v.as_str() != Some("")));
    if !text_present || field(body, "price").is_none() || field(body, "inStock").is_none() {
        return Err(ApiError::validation(MISSING));
    }
    check_types(body)
}

fn check_partial(body: &Map<String, Value>) -> Result<(), ApiError> {
    check_types(body)?;
    if TEXT_FIELDS.iter().any(|k| field(body, k).and_then(Value::as_str) == Some("")) {
        return Err(ApiError::validation(EMPTY_TEXT));
    }
    Ok(())
}

/// Type checks for whichever fields are present.
fn check_types(body: &Map<String, Value>) -> Result<(), ApiError> {
    if TEXT_FIELDS.iter().any(|k| field(body, k).is_some_and(|v| !v.is_string())) {
        return Err(ApiError::validation(NOT_TEXT));
    }
    if field(body, "price").is_some_and(|v| !v.is_number()) {
        return Err(ApiError::validation(NOT_NUMBER));
    }
    if field(body, "inStock").is_some_and(|v| !v.is_boolean()) {
        return Err(ApiError::validation(NOT_BOOL));
    }
    Ok(())
}
