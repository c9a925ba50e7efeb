//! Minimal `Cookie` / `Set-Cookie` header handling.

use axum::{
  http::{HeaderMap, HeaderValue, header},
  response::Response,
};

/// Value of the cookie `name` in the request's `Cookie` header, if any.
pub fn read(headers: &HeaderMap, name: &str) -> Option<String> {
  headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(key, _)| *key == name)
    .map(|(_, value)| value.to_owned())
}

/// A `Set-Cookie` value scoped to the whole site.
pub fn build(name: &str, value: &str, max_age: Option<i64>, secure: bool) -> String {
  let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax");
  if let Some(seconds) = max_age {
    cookie.push_str(&format!("; Max-Age={seconds}"));
  }
  if secure {
    cookie.push_str("; Secure");
  }
  cookie
}

/// A `Set-Cookie` value that makes the browser drop `name` immediately.
pub fn expired(name: &str, secure: bool) -> String { build(name, "", Some(0), secure) }

/// Append a `Set-Cookie` header. Values that are not valid header text are
/// dropped with a warning.
pub fn append(response: &mut Response, cookie: &str) {
  match HeaderValue::from_str(cookie) {
    Ok(value) => {
      response.headers_mut().append(header::SET_COOKIE, value);
    }
    Err(e) => tracing::warn!(error = %e, "dropping malformed Set-Cookie value"),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn headers(cookie: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
    headers
  }

  #[test]
  fn reads_named_cookie() {
    let h = headers("a=1; quill_session=abc; b=2");
    assert_eq!(read(&h, "quill_session").as_deref(), Some("abc"));
    assert_eq!(read(&h, "b").as_deref(), Some("2"));
    assert_eq!(read(&h, "missing"), None);
  }

  #[test]
  fn prefix_is_not_a_match() {
    let h = headers("quill_session_old=zzz");
    assert_eq!(read(&h, "quill_session"), None);
  }

  #[test]
  fn build_attributes() {
    assert_eq!(build("s", "v", None, false), "s=v; Path=/; HttpOnly; SameSite=Lax");
    assert_eq!(
      build("s", "v", Some(60), true),
      "s=v; Path=/; HttpOnly; SameSite=Lax; Max-Age=60; Secure"
    );
    assert!(expired("s", false).contains("Max-Age=0"));
  }
}
