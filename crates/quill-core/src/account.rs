//! Accounts: the registered authors that own posts.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::credential::Credential;

/// Numeric account identity; assigned by the store and never changed.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AccountId(pub i64);

impl fmt::Display for AccountId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// A persisted account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
  pub id:         AccountId,
  /// Display name.
  pub username:   String,
  /// Unique across all accounts; compared as an exact string.
  pub email:      String,
  #[serde(skip_serializing)]
  pub credential: Credential,
  pub created_at: DateTime<Utc>,
}

impl Account {
  /// The hook used at login to decide whether to establish a session.
  pub fn check_password(&self, plaintext: &str) -> bool {
    self.credential.verify(plaintext)
  }
}

/// Input to [`crate::store::BlogStore::insert_account`].
/// `id` and `created_at` are always set by the store.
#[derive(Debug, Clone)]
pub struct NewAccount {
  pub username:   String,
  pub email:      String,
  pub credential: Credential,
}

/// One row of the account listing: the account plus how many posts it owns.
#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
  pub account:    Account,
  pub post_count: u64,
}
