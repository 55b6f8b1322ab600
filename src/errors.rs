use actix_web::{error, http::header::ContentType, http::StatusCode, HttpResponse};
use derive_more::{Display, Error};
use log::error;
use serde::Serialize;

pub type AppResult<T> = Result<T, AppError>;

/// Every failure a store operation or handler can surface.
///
/// Ownership mismatches are reported as [`AppError::NotFound`], never as a
/// separate "forbidden" kind, so callers cannot discover task ids they do
/// not own.
#[derive(Debug, Display, Error)]
pub enum AppError {
    #[display("{_0}")]
    Validation(#[error(not(source))] String),

    #[display("{_0}")]
    Conflict(#[error(not(source))] String),

    #[display("{_0}")]
    NotFound(#[error(not(source))] String),

    #[display("{_0}")]
    Unauthorized(#[error(not(source))] String),

    #[display("database error: {_0}")]
    Database(rusqlite::Error),

    #[display("connection pool error: {_0}")]
    Pool(r2d2::Error),

    #[display("password hashing error: {_0}")]
    Hash(bcrypt::BcryptError),

    #[display("render error: {_0}")]
    Render(#[error(not(source))] String),
}

impl AppError {
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound(message.into())
    }

    pub fn task_not_found() -> Self {
        Self::NotFound("Task not found or you don't have permission".to_string())
    }

    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Pool(_) | Self::Hash(_) | Self::Render(_)
        )
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err)
    }
}

impl From<r2d2::Error> for AppError {
    fn from(err: r2d2::Error) -> Self {
        Self::Pool(err)
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        Self::Hash(err)
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        Self::Render(err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    detail: &'a str,
}

impl error::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let detail = if self.is_internal() {
            error!("{}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(ErrorBody { detail: &detail })
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            AppError::Validation(_) | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Database(_)
            | AppError::Pool(_)
            | AppError::Hash(_)
            | AppError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
