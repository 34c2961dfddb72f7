//! Error taxonomy shared by every service in the crate.
//!
//! Services return [`ServiceError`]; the HTTP layer maps each variant onto a
//! status code and the response envelope. Database errors are folded here so
//! uniqueness violations surface as a distinguishable conflict instead of a
//! generic failure.

/// A single field-level validation failure, reported back to the caller.
#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct FieldError {
    /// Name of the offending input field.
    pub field: String,
    /// Human-readable description of the problem.
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Input failed validation before any write happened.
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    /// A uniqueness constraint was violated (duplicate NIK, username, email).
    #[error("duplicate value: {0}")]
    Conflict(String),

    /// Credentials, code or token were rejected.
    #[error("{0}")]
    Unauthorized(String),

    /// The entity does not exist, is purged, or is not in the required state.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl ServiceError {
    /// Shorthand for a single-field validation error.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ServiceError::Validation(vec![FieldError::new(field, message)])
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) {
                return ServiceError::Conflict(db.message().to_string());
            }
        }
        ServiceError::Database(err)
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
