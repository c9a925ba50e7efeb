//! The `BlogStore` trait, the persistence boundary.
//!
//! Implemented by storage backends (e.g. `quill-store-sqlite`). The services in
//! [`crate::accounts`] and [`crate::content`] depend on this abstraction, not on
//! any concrete backend. Stores perform no authorization; every write is one
//! atomic unit of work that either commits fully or rolls back.

use std::{fmt, future::Future};

use crate::{
  account::{Account, AccountId, AccountSummary, NewAccount},
  post::{NewPost, Post, PostId},
  session::{NewSession, Session},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// The uniqueness constraints a backend must enforce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueKey {
  PostSlug,
  AccountEmail,
}

impl fmt::Display for UniqueKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::PostSlug => "posts.slug",
      Self::AccountEmail => "accounts.email",
    })
  }
}

/// Backend errors must say when they are a uniqueness violation so callers
/// can recover from exactly that case and nothing else.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn violated_key(&self) -> Option<UniqueKey>;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a blog persistence backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait BlogStore: Send + Sync {
  type Error: StoreError;

  // ── Accounts ──────────────────────────────────────────────────────────

  /// Persist a new account. Fails with a [`UniqueKey::AccountEmail`]
  /// violation if the email is already registered.
  fn insert_account(
    &self,
    input: NewAccount,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;

  fn get_account(
    &self,
    id: AccountId,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  /// Exact-match lookup; no case folding.
  fn find_account_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + 'a;

  /// Every account with its post count, ordered by id.
  fn list_accounts(
    &self,
  ) -> impl Future<Output = Result<Vec<AccountSummary>, Self::Error>> + Send + '_;

  /// Delete an account together with its posts and sessions in one unit of
  /// work. Returns `false` if no such account existed.
  fn delete_account(
    &self,
    id: AccountId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Posts ─────────────────────────────────────────────────────────────

  /// Slugs currently in use that equal `base` or extend it as `base-…`,
  /// ignoring the post `exclude` (the one being re-slugged, if any).
  fn existing_slugs<'a>(
    &'a self,
    base: &'a str,
    exclude: Option<PostId>,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + 'a;

  /// Persist a new post. `input.slug` must already be allocated. Fails with a
  /// [`UniqueKey::PostSlug`] violation if another post holds the slug.
  fn insert_post(
    &self,
    input: NewPost,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  /// Overwrite title, content, category and slug of an existing post.
  /// Returns `None` if the post no longer exists.
  fn update_post(
    &self,
    post: Post,
  ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send + '_;

  fn get_post_by_slug<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send + 'a;

  /// All posts, newest (highest id) first.
  fn list_posts(
    &self,
  ) -> impl Future<Output = Result<Vec<Post>, Self::Error>> + Send + '_;

  /// Returns `false` if no such post existed.
  fn delete_post(
    &self,
    id: PostId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Sessions ──────────────────────────────────────────────────────────

  fn insert_session(
    &self,
    input: NewSession,
  ) -> impl Future<Output = Result<Session, Self::Error>> + Send + '_;

  fn find_session<'a>(
    &'a self,
    token_hash: &'a str,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + 'a;

  fn delete_session<'a>(
    &'a self,
    token_hash: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}
