use thiserror::Error;
use actix_web::{ResponseError, HttpResponse, http::StatusCode};
use serde_json::json;

/// Postgres SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    AuthError(#[from] AuthError),

    #[error("Authorization error: {0}")]
    AuthorizationError(#[from] AuthorizationError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err.into())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::DatabaseError(DatabaseError::ConnectionError(err.to_string()))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl AppError {
    /// Message safe to show a client. Faults that are not the caller's doing
    /// collapse to a generic message; the detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::AuthError(AuthError::ValidationFailure(msg)) => msg.clone(),
            AppError::AuthError(AuthError::DuplicateAccount) => "Account already exists".into(),
            AppError::AuthError(AuthError::InvalidCredentials) => "Invalid credentials".into(),
            AppError::AuthError(AuthError::PersistenceFailure(DatabaseError::NotFound)) => {
                "Record not found".into()
            }
            AppError::AuthorizationError(_) => "Unauthorized".into(),
            AppError::DatabaseError(DatabaseError::NotFound) => "Record not found".into(),
            AppError::DatabaseError(DatabaseError::Duplicate) => "Duplicate record".into(),
            AppError::ValidationError(msg) => msg.clone(),
            AppError::NotFound(what) => format!("{} not found", what),
            _ => "Internal server error".into(),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        let response = json!({
            "error": {
                "status": status.as_u16(),
                "message": self.public_message()
            }
        });
        HttpResponse::build(status).json(response)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::AuthError(e) => match e {
                AuthError::ValidationFailure(_) => StatusCode::BAD_REQUEST,
                AuthError::DuplicateAccount => StatusCode::CONFLICT,
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::PersistenceFailure(DatabaseError::NotFound) => StatusCode::NOT_FOUND,
                AuthError::HashingFailure(_)
                | AuthError::TokenFailure(_)
                | AuthError::PersistenceFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::AuthorizationError(_) => StatusCode::UNAUTHORIZED,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DatabaseError(DatabaseError::NotFound) => StatusCode::NOT_FOUND,
            AppError::DatabaseError(DatabaseError::Duplicate) => StatusCode::CONFLICT,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ConfigError(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Outcomes of registration and login.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Validation failed: {0}")]
    ValidationFailure(String),

    #[error("Account already exists")]
    DuplicateAccount,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password hashing failed: {0}")]
    HashingFailure(#[from] HashError),

    #[error("Token issuance failed: {0}")]
    TokenFailure(#[from] TokenError),

    #[error("Persistence failure: {0}")]
    PersistenceFailure(#[from] DatabaseError),
}

/// Why a protected request was turned away. All variants look the same to
/// the client.
#[derive(Error, Debug)]
pub enum AuthorizationError {
    #[error("Missing authorization header")]
    MissingCredential,

    #[error("Malformed authorization header")]
    MalformedCredential,

    #[error("Invalid credential: {0}")]
    InvalidCredential(TokenError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token is malformed")]
    Malformed,

    #[error("Token signature is invalid")]
    SignatureInvalid,

    #[error("Token expired")]
    Expired,

    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HashError {
    #[error("Cost factor {0} is outside the supported range")]
    CostOutOfRange(u32),

    #[error("Password exceeds the permitted length")]
    PasswordTooLong,

    #[error("Stored password hash is corrupt: {0}")]
    CorruptHash(String),

    #[error("Hashing backend failed: {0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Record not found")]
    NotFound,

    #[error("Duplicate record")]
    Duplicate,
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound,
            sqlx::Error::Database(ref db_err)
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
            {
                DatabaseError::Duplicate
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseError::ConnectionError(err.to_string())
            }
            _ => DatabaseError::QueryError(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::InternalError(_)));

        let config_err = config::ConfigError::NotFound(String::from("key not found"));
        let app_err: AppError = config_err.into();
        assert!(matches!(app_err, AppError::ConfigError(_)));

        let db_err = sqlx::Error::RowNotFound;
        let app_err: AppError = db_err.into();
        assert!(matches!(app_err, AppError::DatabaseError(DatabaseError::NotFound)));

        let app_err: AppError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(app_err, AppError::DatabaseError(DatabaseError::ConnectionError(_))));
    }

    #[test]
    fn test_error_status_codes() {
        let err = AppError::AuthError(AuthError::InvalidCredentials);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let err = AppError::AuthError(AuthError::DuplicateAccount);
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let err = AppError::AuthError(AuthError::ValidationFailure("short".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = AppError::AuthError(AuthError::HashingFailure(HashError::CostOutOfRange(0)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = AppError::AuthorizationError(AuthorizationError::MissingCredential);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let err = AppError::ValidationError("invalid input".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = AppError::DatabaseError(DatabaseError::NotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_error_display() {
        let err = AppError::ValidationError("test error".to_string());
        assert_eq!(err.to_string(), "Validation error: test error");

        let err = AppError::AuthError(AuthError::InvalidCredentials);
        assert_eq!(err.to_string(), "Authentication error: Invalid credentials");

        let err = AppError::DatabaseError(DatabaseError::NotFound);
        assert_eq!(err.to_string(), "Database error: Record not found");
    }

    #[test]
    fn test_authorization_failures_share_public_message() {
        let reasons = [
            AuthorizationError::MissingCredential,
            AuthorizationError::MalformedCredential,
            AuthorizationError::InvalidCredential(TokenError::Expired),
            AuthorizationError::InvalidCredential(TokenError::SignatureInvalid),
        ];
        for reason in reasons {
            let err = AppError::AuthorizationError(reason);
            assert_eq!(err.public_message(), "Unauthorized");
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_internal_faults_hide_detail() {
        let err = AppError::AuthError(AuthError::PersistenceFailure(
            DatabaseError::QueryError("relation \"users\" does not exist".into()),
        ));
        assert_eq!(err.public_message(), "Internal server error");

        let err = AppError::AuthError(AuthError::HashingFailure(HashError::CorruptHash(
            "bad".into(),
        )));
        assert_eq!(err.public_message(), "Internal server error");
    }
}
