//! Posts: the content items authors publish.
//!
//! A post's public identity is its slug. The slug is derived from the title
//! by [`crate::slug`] and is only ever rewritten when the title changes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::AccountId;

pub const TITLE_MIN_CHARS: usize = 2;
pub const TITLE_MAX_CHARS: usize = 200;
pub const CONTENT_MIN_CHARS: usize = 10;
pub const CATEGORY_MAX_CHARS: usize = 80;

/// Numeric post identity. Ids are monotonic, so ordering by id is ordering by
/// creation.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PostId(pub i64);

impl fmt::Display for PostId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// A persisted post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
  pub id:         PostId,
  pub owner_id:   AccountId,
  pub title:      String,
  pub content:    String,
  pub category:   Option<String>,
  pub slug:       String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Post {
  /// Path of the public detail page.
  pub fn public_url(&self) -> String { format!("/post/{}/", self.slug) }

  /// Change the title. A different title clears the slug so the next save
  /// allocates a fresh one.
  pub fn retitle(&mut self, title: impl Into<String>) {
    let title = title.into();
    if title != self.title {
      self.title = title;
      self.slug.clear();
    }
  }

  pub fn is_owned_by(&self, account: AccountId) -> bool {
    self.owner_id == account
  }
}

/// Input to [`crate::content::ContentStore::create`]. The slug starts empty and
/// is filled in before the first persist.
#[derive(Debug, Clone)]
pub struct NewPost {
  pub owner_id: AccountId,
  pub title:    String,
  pub content:  String,
  pub category: Option<String>,
  pub slug:     String,
}

impl NewPost {
  pub fn new(
    owner_id: AccountId,
    title: impl Into<String>,
    content: impl Into<String>,
    category: Option<String>,
  ) -> Self {
    Self {
      owner_id,
      title: title.into(),
      content: content.into(),
      category,
      slug: String::new(),
    }
  }
}
