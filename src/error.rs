use std::fmt;
use std::path::PathBuf;

use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use crate::models::ApiResponse;

/// Failures after the request body has been accepted. All of them are
/// terminal for the request and surface as a 500.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("cannot read model artifact {}: {source}", .path.display())]
    ArtifactIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported model artifact {}: expected a .onnx or .json file", .path.display())]
    UnsupportedArtifact { path: PathBuf },
    #[error("invalid model artifact {}: {reason}", .path.display())]
    ArtifactFormat { path: PathBuf, reason: String },
    #[error("model inference failed: {0}")]
    Inference(String),
    #[error("blocking task failed: {0}")]
    Blocking(String),
}

impl ResponseError for ScoringError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ApiResponse::<()>::error(&self.to_string()))
    }
}

/// One rejected input location, shaped like the `detail` entries the
/// service has always returned for bad bodies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl FieldError {
    fn new(loc: Vec<String>, msg: &str, kind: &str) -> Self {
        FieldError {
            loc,
            msg: msg.to_string(),
            kind: kind.to_string(),
        }
    }

    fn field(field: &str) -> Vec<String> {
        vec!["body".to_string(), field.to_string()]
    }

    pub fn missing(field: &str) -> Self {
        Self::new(Self::field(field), "field required", "value_error.missing")
    }

    pub fn not_a_float(field: &str) -> Self {
        Self::new(Self::field(field), "value is not a valid float", "type_error.float")
    }

    pub fn none_not_allowed(field: &str) -> Self {
        Self::new(
            Self::field(field),
            "none is not an allowed value",
            "type_error.none.not_allowed",
        )
    }

    pub fn not_a_dict() -> Self {
        Self::new(vec!["body".to_string()], "value is not a valid dict", "type_error.dict")
    }

    pub fn undecodable(reason: &str) -> Self {
        Self::new(vec!["body".to_string()], reason, "value_error.jsondecode")
    }
}

/// Rejected request body. Rendered as a 422 with `{"detail": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationErrors {
    pub detail: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn single(error: FieldError) -> Self {
        ValidationErrors { detail: vec![error] }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.detail.len();
        write!(f, "{n} validation error{}", if n == 1 { "" } else { "s" })?;
        for error in &self.detail {
            write!(f, "; {}: {}", error.loc.join("."), error.msg)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl ResponseError for ValidationErrors {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNPROCESSABLE_ENTITY
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }
}

/// Error handler for the JSON extractor: oversized bodies get a 413, every
/// other decoding failure is a validation error.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = match &err {
        JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
            HttpResponse::PayloadTooLarge().json(ApiResponse::<()>::error(&err.to_string()))
        }
        _ => ValidationErrors::single(FieldError::undecodable(&err.to_string())).error_response(),
    };
    InternalError::from_response(err, response).into()
}
