//! Typed errors, business codes, and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::response::error_body;

pub const CODE_SYSTEM: u32 = 10000;
pub const CODE_PARAMETER_FORMAT: u32 = 10001;
pub const CODE_PARAMETER_BUSINESS: u32 = 10002;
pub const CODE_SERVER_BUSY: u32 = 10003;
pub const CODE_FORBIDDEN: u32 = 10004;
pub const CODE_OBJECT_NOT_FOUND: u32 = 10005;
pub const CODE_APP_LABEL_INVALID: u32 = 10006;
pub const CODE_MODEL_SLUG_INVALID: u32 = 10007;
pub const CODE_MODEL_NOT_FOUND: u32 = 10008;
pub const CODE_BATCH_ACTION: u32 = 10009;
pub const CODE_FUNCTION_NOT_FOUND: u32 = 10010;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("duplicate {kind}: {id}")]
    Duplicate { kind: &'static str, id: String },
    #[error("validation: {0}")]
    Validation(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("internal error: {0}")]
    System(String),
    #[error("parameter format: {0}")]
    ParameterFormat(String),
    #[error("parameter rejected: {0}")]
    ParameterBusiness(String),
    #[error("server busy")]
    ServerBusy,
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    ObjectNotFound(String),
    #[error("invalid app label: {0}")]
    AppLabelInvalid(String),
    #[error("invalid model slug: {0}")]
    ModelSlugInvalid(String),
    #[error("unknown model: {0}")]
    ModelNotFound(String),
    #[error("batch handler failed: {0}")]
    BatchAction(String),
    #[error("no function handler: {0}")]
    FunctionNotFound(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

impl AppError {
    /// Numeric business code carried in the response envelope.
    pub fn code(&self) -> u32 {
        match self {
            AppError::Config(_) | AppError::System(_) | AppError::Db(_) => CODE_SYSTEM,
            AppError::ParameterFormat(_) => CODE_PARAMETER_FORMAT,
            AppError::ParameterBusiness(_) => CODE_PARAMETER_BUSINESS,
            AppError::ServerBusy => CODE_SERVER_BUSY,
            AppError::Forbidden(_) => CODE_FORBIDDEN,
            AppError::ObjectNotFound(_) => CODE_OBJECT_NOT_FOUND,
            AppError::AppLabelInvalid(_) => CODE_APP_LABEL_INVALID,
            AppError::ModelSlugInvalid(_) => CODE_MODEL_SLUG_INVALID,
            AppError::ModelNotFound(_) => CODE_MODEL_NOT_FOUND,
            AppError::BatchAction(_) => CODE_BATCH_ACTION,
            AppError::FunctionNotFound(_) => CODE_FUNCTION_NOT_FOUND,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_) | AppError::System(_) | AppError::BatchAction(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Db(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            AppError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ParameterFormat(_)
            | AppError::AppLabelInvalid(_)
            | AppError::ModelSlugInvalid(_) => StatusCode::BAD_REQUEST,
            AppError::ParameterBusiness(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ServerBusy => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::ObjectNotFound(_)
            | AppError::ModelNotFound(_)
            | AppError::FunctionNotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = error_body(self.code(), self.to_string(), None, None);
        (status, Json(body)).into_response()
    }
}
