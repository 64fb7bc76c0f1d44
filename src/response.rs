//! Standard response envelope.
//!
//! Success: `{"code": 0, "message": "", "result": data}`.
//! Failure: `{"code": n, "message": "...", "data": detail, "app": origin}`.

use axum::{http::StatusCode, Json};
use serde::Serialize;
use serde_json::Value;

/// App identifier reported for faults raised inside this crate.
pub const DEFAULT_ERROR_APP: &str = "prism";

#[derive(Serialize)]
pub struct SuccessBody {
    pub code: u32,
    pub message: String,
    pub result: Value,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub code: u32,
    pub message: String,
    pub data: Option<Value>,
    pub app: String,
}

pub fn success_body(result: Value) -> SuccessBody {
    SuccessBody {
        code: 0,
        message: String::new(),
        result,
    }
}

pub fn success_response(result: Value) -> (StatusCode, Json<SuccessBody>) {
    (StatusCode::OK, Json(success_body(result)))
}

pub fn error_body(code: u32, message: String, data: Option<Value>, app: Option<String>) -> ErrorBody {
    ErrorBody {
        code,
        message,
        data,
        app: app.unwrap_or_else(|| DEFAULT_ERROR_APP.to_string()),
    }
}
