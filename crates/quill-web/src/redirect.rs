//! Post-login redirect target validation.

use url::Url;

/// Whether `target`, resolved against the current request's `host`, stays on
/// the same origin over http or https.
///
/// Relative paths are resolved against the host; absolute and
/// scheme-relative URLs must name exactly the same host and port. Targets
/// carrying credentials are rejected.
pub fn is_safe_redirect(target: &str, host: &str) -> bool {
  if target.is_empty() || host.is_empty() {
    return false;
  }
  let Ok(base) = Url::parse(&format!("http://{host}/")) else {
    return false;
  };
  let Ok(resolved) = base.join(target) else {
    return false;
  };

  matches!(resolved.scheme(), "http" | "https")
    && resolved.host_str() == base.host_str()
    && resolved.port() == base.port()
    && resolved.username().is_empty()
    && resolved.password().is_none()
}

/// `next` if it is a safe redirect for `host`, otherwise the home page.
pub fn safe_target(next: Option<&str>, host: Option<&str>) -> String {
  match (next, host) {
    (Some(next), Some(host)) if is_safe_redirect(next, host) => next.to_owned(),
    _ => "/".to_owned(),
  }
}
