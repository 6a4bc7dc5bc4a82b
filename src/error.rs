use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};

use crate::flash::{self, Flash};

/// Every way a request can be refused. Hard denials (`Forbidden`,
/// `NotFound`) terminate the request with a status code; soft denials
/// redirect to a safe prior page with a flash message so the user can
/// correct and retry.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Not found")]
    NotFound,

    #[error("Forbidden")]
    Forbidden,

    #[error("This post is private.")]
    PrivatePost,

    #[error("You cannot delete your own account.")]
    SelfDeleteBlocked,

    #[error("{0}")]
    Validation(String),

    #[error("User {0} is already registered.")]
    UsernameTaken(String),

    #[error("{0}")]
    FetchFailed(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            // Entity-scoped request without a session: back to the login page
            AppError::Unauthenticated => Redirect::to("/").into_response(),

            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()).into_response(),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()).into_response(),

            // Soft denials: recoverable, redirect with a notice
            AppError::PrivatePost => flash::redirect("/home", Flash::error(self.to_string())),
            AppError::SelfDeleteBlocked => flash::redirect("/admin", Flash::error(self.to_string())),
            AppError::Validation(_) | AppError::UsernameTaken(_) => {
                flash::redirect("/", Flash::error(self.to_string()))
            }

            AppError::FetchFailed(_) => {
                (StatusCode::BAD_GATEWAY, self.to_string()).into_response()
            }

            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
                    .into_response()
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
                    .into_response()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
                    .into_response()
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
