//! Login sessions and the request principal.
//!
//! The raw session token only ever lives in the client's cookie; the store
//! keys sessions by a hash of it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  account::{Account, AccountId},
  post::Post,
};

/// A persisted login session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
  pub token_hash: String,
  pub account_id: AccountId,
  pub created_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

impl Session {
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool { self.expires_at <= now }
}

/// Input to [`crate::store::BlogStore::insert_session`].
#[derive(Debug, Clone)]
pub struct NewSession {
  pub token_hash: String,
  pub account_id: AccountId,
  pub expires_at: DateTime<Utc>,
}

/// The authenticated identity attached to a request.
///
/// Handlers receive it as an explicit value; there is no ambient
/// "current user".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
  pub account_id: AccountId,
  pub username:   String,
}

impl Principal {
  pub fn owns(&self, post: &Post) -> bool { post.is_owned_by(self.account_id) }

  /// Fail with [`Error::NotOwner`] unless this principal owns `post`.
  pub fn ensure_owner(&self, post: &Post) -> Result<()> {
    if self.owns(post) {
      Ok(())
    } else {
      Err(Error::NotOwner { account: self.account_id, post: post.id })
    }
  }
}

impl From<&Account> for Principal {
  fn from(account: &Account) -> Self {
    Self { account_id: account.id, username: account.username.clone() }
  }
}
