//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings.

use chrono::{DateTime, Utc};
use quill_core::{
  account::{Account, AccountId, AccountSummary},
  credential::Credential,
  post::{Post, PostId},
  session::Session,
  store::UniqueKey,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Constraint violations ───────────────────────────────────────────────────

/// Classify a failed statement as one of the uniqueness constraints callers
/// know how to recover from.
pub fn unique_violation(err: &rusqlite::Error) -> Option<UniqueKey> {
  let rusqlite::Error::SqliteFailure(e, Some(msg)) = err else {
    return None;
  };
  if e.code != rusqlite::ErrorCode::ConstraintViolation {
    return None;
  }
  if msg.contains("posts.slug") {
    Some(UniqueKey::PostSlug)
  } else if msg.contains("accounts.email") {
    Some(UniqueKey::AccountEmail)
  } else {
    None
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const ACCOUNT_COLUMNS: &str =
  "account_id, username, email, password_hash, created_at";

/// Raw values read directly from an `accounts` row.
pub struct RawAccount {
  pub account_id:    i64,
  pub username:      String,
  pub email:         String,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawAccount {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      account_id:    row.get(0)?,
      username:      row.get(1)?,
      email:         row.get(2)?,
      password_hash: row.get(3)?,
      created_at:    row.get(4)?,
    })
  }

  pub fn into_account(self) -> Result<Account> {
    Ok(Account {
      id:         AccountId(self.account_id),
      username:   self.username,
      email:      self.email,
      credential: Credential::from_phc(self.password_hash),
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// An `accounts` row plus its post count.
pub struct RawAccountSummary {
  pub account:    RawAccount,
  pub post_count: i64,
}

impl RawAccountSummary {
  pub fn into_summary(self) -> Result<AccountSummary> {
    Ok(AccountSummary {
      account:    self.account.into_account()?,
      post_count: self.post_count.max(0) as u64,
    })
  }
}

pub const POST_COLUMNS: &str =
  "post_id, account_id, title, content, category, slug, created_at, updated_at";

/// Raw values read directly from a `posts` row.
pub struct RawPost {
  pub post_id:    i64,
  pub account_id: i64,
  pub title:      String,
  pub content:    String,
  pub category:   Option<String>,
  pub slug:       String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawPost {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      post_id:    row.get(0)?,
      account_id: row.get(1)?,
      title:      row.get(2)?,
      content:    row.get(3)?,
      category:   row.get(4)?,
      slug:       row.get(5)?,
      created_at: row.get(6)?,
      updated_at: row.get(7)?,
    })
  }

  pub fn into_post(self) -> Result<Post> {
    Ok(Post {
      id:         PostId(self.post_id),
      owner_id:   AccountId(self.account_id),
      title:      self.title,
      content:    self.content,
      category:   self.category,
      slug:       self.slug,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from a `sessions` row.
pub struct RawSession {
  pub token_hash: String,
  pub account_id: i64,
  pub created_at: String,
  pub expires_at: String,
}

impl RawSession {
  pub fn into_session(self) -> Result<Session> {
    Ok(Session {
      token_hash: self.token_hash,
      account_id: AccountId(self.account_id),
      created_at: decode_dt(&self.created_at)?,
      expires_at: decode_dt(&self.expires_at)?,
    })
  }
}
