//! HTTP layer for the Quill blog.
//!
//! Exposes an axum [`Router`] over any [`BlogStore`]: public reads, login and
//! signup, and the session-guarded authoring routes. Responses are JSON read
//! models or `303` redirects; HTML rendering is left to a front end.

pub mod auth;
pub mod cookie;
pub mod error;
pub mod flash;
pub mod handlers;
pub mod redirect;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use quill_core::{
  accounts::AccountManager,
  content::{ContentStore, DEFAULT_SLUG_RETRIES},
  store::BlogStore,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use handlers::{admin, posts, session, signup};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `QUILL_*` environment variables. Every key is optional.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:              String,
  pub port:              u16,
  pub store_path:        PathBuf,
  /// Lifetime of a session created without "remember me".
  pub session_ttl_hours: i64,
  /// Lifetime of a remembered session and its cookie.
  pub remember_days:     i64,
  /// Mark session cookies `Secure`; enable behind TLS.
  pub secure_cookies:    bool,
  /// Re-allocations allowed after a post save loses a slug race.
  pub slug_retries:      u32,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:              "127.0.0.1".to_string(),
      port:              5000,
      store_path:        PathBuf::from("quill.db"),
      session_ttl_hours: 24,
      remember_days:     365,
      secure_cookies:    false,
      slug_retries:      DEFAULT_SLUG_RETRIES,
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:    Arc<S>,
  pub accounts: AccountManager<S>,
  pub posts:    ContentStore<S>,
  pub config:   Arc<ServerConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      accounts: self.accounts.clone(),
      posts:    self.posts.clone(),
      config:   Arc::clone(&self.config),
    }
  }
}

impl<S: BlogStore> AppState<S> {
  pub fn new(store: Arc<S>, config: ServerConfig) -> Self {
    Self {
      accounts: AccountManager::new(Arc::clone(&store)),
      posts:    ContentStore::new(Arc::clone(&store)).with_slug_retries(config.slug_retries),
      store,
      config:   Arc::new(config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the blog.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: BlogStore + 'static,
{
  Router::new()
    .route("/",                          get(posts::index::<S>))
    .route("/post/{slug}/",              get(posts::detail::<S>))
    .route("/login",                     post(session::login::<S>))
    .route("/logout",                    get(session::logout::<S>))
    .route("/signup/",                   post(signup::signup::<S>))
    .route("/admin/post/",               post(admin::create::<S>))
    .route("/admin/post/{slug}/edit",    post(admin::edit::<S>))
    .route("/admin/post/{slug}/delete",  post(admin::delete::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
