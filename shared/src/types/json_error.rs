use serde::{Deserialize, Serialize};

/// Standard error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            status: "error".to_string(),
            code: code.to_string(),
            message: message.to_string(),
        }
    }

    pub fn not_found(path: &str) -> Self {
        Self::new("NOT_FOUND", &format!("No route for {}", path))
    }

    pub fn method_not_allowed(method: &str, path: &str) -> Self {
        Self::new(
            "METHOD_NOT_ALLOWED",
            &format!("{} is not allowed on {}", method, path),
        )
    }
}
