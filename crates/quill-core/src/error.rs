//! Error types for `quill-core`.

use thiserror::Error;

use crate::{account::AccountId, form::FieldErrors, post::PostId};

#[derive(Debug, Error)]
pub enum Error {
  /// One or more form fields failed validation; nothing was persisted.
  #[error("validation failed: {0}")]
  Validation(FieldErrors),

  #[error("email already registered")]
  DuplicateEmail,

  /// The slug still collided after the configured number of retries.
  #[error("slug {0:?} is still taken after retrying")]
  SlugCollision(String),

  #[error("account {account} does not own post {post}")]
  NotOwner { account: AccountId, post: PostId },

  #[error("post not found: {0}")]
  PostNotFound(String),

  #[error("account not found: {0}")]
  AccountNotFound(AccountId),

  /// The delete was rolled back; the caller should report it and carry on.
  #[error("could not delete post: {0}")]
  DeleteFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("credential error: {0}")]
  Credential(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend failure as a fatal storage error.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }

  /// Whether the caller can recover from this error by showing a message
  /// instead of failing the request.
  pub fn is_recoverable(&self) -> bool {
    !matches!(self, Self::Store(_) | Self::Credential(_) | Self::SlugCollision(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
