//! Response definitions
//!
//! Represents responses to clients: a success flag followed by results.

use serde::{Deserialize, Serialize};

use super::Value;

/// A response tuple `(success, result1, result2, ...)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Whether the command succeeded
    pub success: bool,

    /// Results on success, a single error message on failure
    pub results: Vec<Value>,
}

impl Response {
    /// Create a successful response carrying `results`
    pub fn ok(results: Vec<Value>) -> Self {
        Self {
            success: true,
            results,
        }
    }

    /// Create a successful response with a single null result
    pub fn done() -> Self {
        Self::ok(vec![Value::Null])
    }

    /// Create a failed response
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            results: vec![Value::Text(message.into())],
        }
    }

    /// Error message of a failed response
    pub fn error_message(&self) -> Option<&str> {
        if self.success {
            return None;
        }
        self.results.first().and_then(Value::as_text)
    }
}
