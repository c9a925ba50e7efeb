//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Redirect, Response},
};
use quill_core::form::{EMAIL_TAKEN, FieldErrors};
use serde_json::json;
use thiserror::Error;

use crate::flash;

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const NOT_OWNER: &str = "You can only change your own posts.";
pub const DELETE_FAILED: &str = "Could not delete post";

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] quill_core::Error),

  #[error("invalid credentials")]
  InvalidCredentials,

  /// A protected route was hit without a live session.
  #[error("login required")]
  LoginRequired { next: String },
}

fn field_errors(errors: FieldErrors) -> Response {
  (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "errors": errors }))).into_response()
}

fn message(status: StatusCode, message: &str) -> Response {
  (status, Json(json!({ "error": message }))).into_response()
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    use quill_core::Error as Core;

    match self {
      Error::Core(Core::Validation(errors)) => field_errors(errors),
      Error::Core(Core::DuplicateEmail) => {
        field_errors(FieldErrors::single("email", EMAIL_TAKEN))
      }
      Error::Core(Core::PostNotFound(_) | Core::AccountNotFound(_)) => {
        message(StatusCode::NOT_FOUND, "Not Found")
      }
      Error::Core(Core::NotOwner { account, post }) => {
        tracing::warn!(%account, %post, "rejected change to another account's post");
        flash::redirect_with_flash("/", NOT_OWNER)
      }
      Error::Core(Core::DeleteFailed(e)) => {
        tracing::warn!(error = %e, "post delete failed");
        flash::redirect_with_flash("/", DELETE_FAILED)
      }
      Error::Core(e) => {
        tracing::error!(error = %e, "request failed");
        message(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
      }
      Error::InvalidCredentials => message(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS),
      Error::LoginRequired { next } => {
        let next: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
        Redirect::to(&format!("/login?next={next}")).into_response()
      }
    }
  }
}
