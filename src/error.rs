use actix_web::HttpResponse;
use log::{error, warn};

/// Errors surfaced by the document store and the repositories built on it.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A lookup that expects exactly one document found none.
    #[error("{collection} document {id} not found")]
    NotFound { collection: &'static str, id: String },
    /// An insert hit an id that is already taken.
    #[error("{collection} document {id} already exists")]
    DuplicateId { collection: &'static str, id: String },
    /// Any network or backend-side failure; propagated as-is, never retried.
    #[error("store backend error: {0}")]
    Backend(String),
    /// A document failed to (de)serialize.
    #[error("document encoding error: {0}")]
    Encoding(String),
}

impl StoreError {
    pub fn not_found(collection: &'static str, id: &str) -> Self {
        StoreError::NotFound {
            collection,
            id: id.to_string(),
        }
    }

    pub fn duplicate(collection: &'static str, id: &str) -> Self {
        StoreError::DuplicateId {
            collection,
            id: id.to_string(),
        }
    }

    /// Maps the error onto the HTTP response handlers return when they
    /// talk to a repository directly.
    pub fn http_response(&self) -> HttpResponse {
        match self {
            StoreError::NotFound { .. } => HttpResponse::NotFound().body(self.to_string()),
            StoreError::DuplicateId { .. } => HttpResponse::Conflict().body(self.to_string()),
            _ => {
                error!("store failure: {}", self);
                HttpResponse::InternalServerError().body(format!("Error: {}", self))
            }
        }
    }
}

/// Errors surfaced by the task and group services.
///
/// `Invalid` and `Forbidden` are raised before any store call; `Store`
/// wraps whatever the primary write or read propagated. Secondary
/// notification writes never surface here; they are swallowed (and
/// logged) by the services' best-effort dispatch.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Internal(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        ServiceError::Invalid(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ServiceError::Forbidden(msg.into())
    }

    /// Maps the error onto the HTTP response the handlers return.
    pub fn http_response(&self) -> HttpResponse {
        match self {
            ServiceError::Invalid(msg) => {
                warn!("rejected request: {}", msg);
                HttpResponse::BadRequest().body(msg.clone())
            }
            ServiceError::Forbidden(msg) => {
                warn!("forbidden: {}", msg);
                HttpResponse::Unauthorized().body(msg.clone())
            }
            ServiceError::Internal(msg) => {
                error!("internal failure: {}", msg);
                HttpResponse::InternalServerError().body(format!("Error: {}", msg))
            }
            ServiceError::Store(e) => e.http_response(),
        }
    }
}
