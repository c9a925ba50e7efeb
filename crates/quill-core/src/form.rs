//! Form input and field-level validation.
//!
//! Validation never raises: each form returns either its cleaned value or a
//! [`FieldErrors`] map for the presentation layer to show next to the fields.

use std::{collections::BTreeMap, fmt, sync::OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::post::{CATEGORY_MAX_CHARS, CONTENT_MIN_CHARS, TITLE_MAX_CHARS, TITLE_MIN_CHARS};

pub const USERNAME_MIN_CHARS: usize = 2;
pub const USERNAME_MAX_CHARS: usize = 80;
pub const PASSWORD_MIN_CHARS: usize = 6;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_EMAIL: &str = "Invalid email address.";
pub const EMAIL_TAKEN: &str = "Email already registered";

// ─── FieldErrors ─────────────────────────────────────────────────────────────

/// Messages keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
  pub fn new() -> Self { Self::default() }

  /// A single message on a single field.
  pub fn single(field: &str, message: impl Into<String>) -> Self {
    let mut errors = Self::new();
    errors.add(field, message);
    errors
  }

  pub fn add(&mut self, field: &str, message: impl Into<String>) {
    self.0.entry(field.to_owned()).or_default().push(message.into());
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn get(&self, field: &str) -> &[String] {
    self.0.get(field).map(Vec::as_slice).unwrap_or_default()
  }

  pub fn fields(&self) -> impl Iterator<Item = &str> { self.0.keys().map(String::as_str) }

  /// `Ok(value)` when no errors were recorded.
  pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
    if self.is_empty() { Ok(value) } else { Err(self) }
  }
}

impl fmt::Display for FieldErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for (field, messages) in &self.0 {
      for message in messages {
        if !first {
          f.write_str("; ")?;
        }
        write!(f, "{field}: {message}")?;
        first = false;
      }
    }
    Ok(())
  }
}

// ─── Field checks ────────────────────────────────────────────────────────────

fn is_blank(value: &str) -> bool { value.trim().is_empty() }

fn char_len(value: &str) -> usize { value.chars().count() }

fn check_required(errors: &mut FieldErrors, field: &str, value: &str) -> bool {
  if is_blank(value) {
    errors.add(field, REQUIRED);
    false
  } else {
    true
  }
}

fn check_length(
  errors: &mut FieldErrors,
  field: &str,
  value: &str,
  min: Option<usize>,
  max: Option<usize>,
) {
  let len = char_len(value);
  let message = match (min, max) {
    (Some(min), Some(max)) if len < min || len > max => {
      format!("Field must be between {min} and {max} characters long.")
    }
    (Some(min), None) if len < min => {
      format!("Field must be at least {min} characters long.")
    }
    (None, Some(max)) if len > max => {
      format!("Field cannot be longer than {max} characters.")
    }
    _ => return,
  };
  errors.add(field, message);
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

/// Structural email check: one `@`, no whitespace, a dotted domain.
pub fn is_valid_email(value: &str) -> bool {
  let re = EMAIL_RE.get_or_init(|| {
    Regex::new(r"^[^@\s]+@[^@\s.]+(\.[^@\s.]+)+$").expect("email pattern compiles")
  });
  re.is_match(value)
}

fn check_email(errors: &mut FieldErrors, field: &str, value: &str) {
  if check_required(errors, field, value) && !is_valid_email(value) {
    errors.add(field, INVALID_EMAIL);
  }
}

/// Title, content and category bounds shared by [`PostForm`] and the
/// content store's pre-persist check.
pub fn check_post_fields(
  title: &str,
  content: &str,
  category: Option<&str>,
) -> Result<(), FieldErrors> {
  let mut errors = FieldErrors::new();
  if check_required(&mut errors, "title", title) {
    check_length(&mut errors, "title", title, Some(TITLE_MIN_CHARS), Some(TITLE_MAX_CHARS));
  }
  if check_required(&mut errors, "content", content) {
    check_length(&mut errors, "content", content, Some(CONTENT_MIN_CHARS), None);
  }
  if let Some(category) = category {
    check_length(&mut errors, "category", category, None, Some(CATEGORY_MAX_CHARS));
  }
  errors.into_result(())
}

// ─── Forms ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupForm {
  #[serde(default)]
  pub username: String,
  #[serde(default)]
  pub email:    String,
  #[serde(default)]
  pub password: String,
}

impl SignupForm {
  pub fn validate(&self) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if check_required(&mut errors, "username", &self.username) {
      check_length(
        &mut errors,
        "username",
        &self.username,
        Some(USERNAME_MIN_CHARS),
        Some(USERNAME_MAX_CHARS),
      );
    }
    check_email(&mut errors, "email", &self.email);
    if check_required(&mut errors, "password", &self.password) {
      check_length(&mut errors, "password", &self.password, Some(PASSWORD_MIN_CHARS), None);
    }
    errors.into_result(())
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
  #[serde(default)]
  pub email:       String,
  #[serde(default)]
  pub password:    String,
  /// HTML checkboxes submit `on` (or nothing at all).
  #[serde(default, deserialize_with = "checkbox")]
  pub remember_me: bool,
}

impl LoginForm {
  pub fn validate(&self) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    check_email(&mut errors, "email", &self.email);
    check_required(&mut errors, "password", &self.password);
    errors.into_result(())
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostForm {
  #[serde(default)]
  pub title:    String,
  #[serde(default)]
  pub content:  String,
  #[serde(default)]
  pub category: Option<String>,
}

impl PostForm {
  /// Blank categories are treated as absent.
  pub fn category(&self) -> Option<String> {
    self
      .category
      .as_deref()
      .map(str::trim)
      .filter(|c| !c.is_empty())
      .map(str::to_owned)
  }

  pub fn validate(&self) -> Result<(), FieldErrors> {
    check_post_fields(&self.title, &self.content, self.category().as_deref())
  }
}

fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
  D: serde::Deserializer<'de>,
{
  let raw = String::deserialize(deserializer)?;
  Ok(matches!(raw.as_str(), "on" | "true" | "1" | "yes" | "y"))
}
