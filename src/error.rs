use poem::error::ResponseError;
use poem::http::{StatusCode, header};
use poem::Response;
use sea_orm::DbErr;
use thiserror::Error;

use crate::auth::login_url;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Anonymous access to a page that needs a user; `next` is where to
    /// come back after logging in.
    #[error("login required for {next}")]
    LoginRequired { next: String },

    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("session token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("password hashing failed: {0}")]
    PasswordHash(password_hash::Error),
}

impl ResponseError for AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::LoginRequired { .. } => StatusCode::FOUND,
            AppError::Database(_)
            | AppError::Template(_)
            | AppError::Token(_)
            | AppError::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn as_response(&self) -> Response {
        match self {
            AppError::NotFound(what) => Response::builder()
                .status(StatusCode::NOT_FOUND)
                .content_type("text/html; charset=utf-8")
                .body(format!("<h1>Not Found</h1><p>The requested {what} does not exist.</p>")),
            AppError::LoginRequired { next } => redirect(login_url(next)),
            other => {
                tracing::error!(error = %other, "request failed");
                Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .body("Internal Server Error")
            }
        }
    }
}

/// 302 to `location`, the status every redirect in the site uses.
pub fn redirect(location: impl AsRef<str>) -> Response {
    Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, location.as_ref())
        .finish()
}
