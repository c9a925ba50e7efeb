//! One-shot flash messages carried in a short-lived cookie.
//!
//! A message is set on a redirect and handed back, then cleared, by the next
//! page read.

use axum::{
  http::HeaderMap,
  response::{IntoResponse, Redirect, Response},
};
use url::form_urlencoded;

use crate::cookie;

pub const FLASH_COOKIE: &str = "quill_flash";

const FLASH_MAX_AGE_SECS: i64 = 300;

pub fn set_cookie(message: &str) -> String {
  let encoded: String = form_urlencoded::byte_serialize(message.as_bytes()).collect();
  cookie::build(FLASH_COOKIE, &encoded, Some(FLASH_MAX_AGE_SECS), false)
}

pub fn clear_cookie() -> String { cookie::expired(FLASH_COOKIE, false) }

/// The pending message, if the request carries one.
pub fn read(headers: &HeaderMap) -> Option<String> {
  let raw = cookie::read(headers, FLASH_COOKIE)?;
  form_urlencoded::parse(format!("m={raw}").as_bytes())
    .next()
    .map(|(_, message)| message.into_owned())
    .filter(|message| !message.is_empty())
}

/// `303 See Other` to `to`, leaving `message` for the next page.
pub fn redirect_with_flash(to: &str, message: &str) -> Response {
  let mut response = Redirect::to(to).into_response();
  cookie::append(&mut response, &set_cookie(message));
  response
}

#[cfg(test)]
mod tests {
  use axum::http::{HeaderValue, StatusCode, header};

  use super::*;

  fn request_with(set_cookie: &str) -> HeaderMap {
    let pair = set_cookie.split(';').next().unwrap();
    let mut headers = HeaderMap::new();
    headers.insert(header::COOKIE, HeaderValue::from_str(pair).unwrap());
    headers
  }

  #[test]
  fn message_survives_the_cookie() {
    let message = "Could not delete post: ¿qué? 100% & more";
    let headers = request_with(&set_cookie(message));
    assert_eq!(read(&headers).as_deref(), Some(message));
  }

  #[test]
  fn cleared_cookie_reads_as_none() {
    let headers = request_with(&clear_cookie());
    assert_eq!(read(&headers), None);
  }

  #[test]
  fn redirect_carries_flash() {
    let response = redirect_with_flash("/post/x/", "nope");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/post/x/");
    let set = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set.starts_with("quill_flash=nope;"));
  }
}
