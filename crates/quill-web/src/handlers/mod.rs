//! Route handlers.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/` | All posts, newest first, plus any flash message |
//! | `GET`  | `/post/{slug}/` | 404 if not found |
//! | `POST` | `/login` | Optional `?next=` redirect target |
//! | `POST` | `/signup/` | |
//! | `GET`  | `/logout` | Session required |
//! | `POST` | `/admin/post/` | Session required |
//! | `POST` | `/admin/post/{slug}/edit` | Session and ownership required |
//! | `POST` | `/admin/post/{slug}/delete` | Session and ownership required |

pub mod admin;
pub mod posts;
pub mod session;
pub mod signup;

use axum::response::{IntoResponse, Redirect, Response};

use crate::cookie;

/// `303 See Other` to `to`, setting each cookie in `cookies`.
pub(crate) fn redirect_setting(to: &str, cookies: &[String]) -> Response {
  let mut response = Redirect::to(to).into_response();
  for value in cookies {
    cookie::append(&mut response, value);
  }
  response
}
