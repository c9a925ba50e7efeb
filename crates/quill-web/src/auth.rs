//! Session-backed authentication gate.
//!
//! A login issues a random token in the `quill_session` cookie; the store only
//! ever sees its SHA-256. Handlers receive the outcome as an explicit
//! [`CurrentPrincipal`] or [`RequirePrincipal`] extractor.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use quill_core::{
  account::AccountId,
  session::{NewSession, Principal},
  store::BlogStore,
};
use rand_core::{OsRng, RngCore as _};
use sha2::{Digest as _, Sha256};

use crate::{AppState, cookie, error::Error};

pub const SESSION_COOKIE: &str = "quill_session";

const TOKEN_BYTES: usize = 32;

// ─── Tokens ──────────────────────────────────────────────────────────────────

/// A fresh, URL-safe session token.
pub fn generate_token() -> String {
  let mut bytes = [0u8; TOKEN_BYTES];
  OsRng.fill_bytes(&mut bytes);
  URL_SAFE_NO_PAD.encode(bytes)
}

/// The form a token is stored and looked up in.
pub fn hash_token(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

// ─── Sessions ────────────────────────────────────────────────────────────────

/// Persist a new session for `account_id` and return the `Set-Cookie` value
/// that hands its token to the client.
///
/// A remembered session outlives the browser for `remember_days`; otherwise
/// the cookie has no `Max-Age` and the session expires after
/// `session_ttl_hours`.
pub async fn start_session<S: BlogStore>(
  state: &AppState<S>,
  account_id: AccountId,
  remember: bool,
) -> Result<String, Error> {
  let token = generate_token();
  let config = &state.config;

  let (lifetime, max_age) = if remember {
    let lifetime = Duration::days(config.remember_days);
    (lifetime, Some(lifetime.num_seconds()))
  } else {
    (Duration::hours(config.session_ttl_hours), None)
  };

  state
    .store
    .insert_session(NewSession {
      token_hash: hash_token(&token),
      account_id,
      expires_at: Utc::now() + lifetime,
    })
    .await
    .map_err(quill_core::Error::store)?;

  tracing::info!(%account_id, remember, "session started");
  Ok(cookie::build(SESSION_COOKIE, &token, max_age, config.secure_cookies))
}

/// Revoke the request's session, if any, and return the `Set-Cookie` value
/// that clears it.
pub async fn end_session<S: BlogStore>(
  state: &AppState<S>,
  headers: &HeaderMap,
) -> Result<String, Error> {
  if let Some(token) = cookie::read(headers, SESSION_COOKIE) {
    state
      .store
      .delete_session(&hash_token(&token))
      .await
      .map_err(quill_core::Error::store)?;
  }
  Ok(cookie::expired(SESSION_COOKIE, state.config.secure_cookies))
}

/// Resolve the request's session cookie to a principal.
///
/// Unknown tokens resolve to `None`. Expired sessions are deleted and also
/// resolve to `None`.
pub async fn resolve_principal<S: BlogStore>(
  state: &AppState<S>,
  headers: &HeaderMap,
) -> Result<Option<Principal>, Error> {
  let Some(token) = cookie::read(headers, SESSION_COOKIE) else {
    return Ok(None);
  };
  let token_hash = hash_token(&token);

  let Some(session) = state
    .store
    .find_session(&token_hash)
    .await
    .map_err(quill_core::Error::store)?
  else {
    return Ok(None);
  };

  if session.is_expired(Utc::now()) {
    tracing::debug!(account_id = %session.account_id, "session expired");
    state
      .store
      .delete_session(&token_hash)
      .await
      .map_err(quill_core::Error::store)?;
    return Ok(None);
  }

  let account = state.accounts.get(session.account_id).await?;
  Ok(account.as_ref().map(Principal::from))
}

// ─── Extractors ──────────────────────────────────────────────────────────────

/// The authenticated principal, or `None` for anonymous requests.
pub struct CurrentPrincipal(pub Option<Principal>);

/// An authenticated principal. Anonymous requests are redirected to the login
/// page with the original path as `next`.
pub struct RequirePrincipal(pub Principal);

impl<S> FromRequestParts<AppState<S>> for CurrentPrincipal
where
  S: BlogStore + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    Ok(Self(resolve_principal(state, &parts.headers).await?))
  }
}

impl<S> FromRequestParts<AppState<S>> for RequirePrincipal
where
  S: BlogStore + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    match resolve_principal(state, &parts.headers).await? {
      Some(principal) => Ok(Self(principal)),
      None => {
        let next = parts
          .uri
          .path_and_query()
          .map_or("/", |pq| pq.as_str())
          .to_owned();
        Err(Error::LoginRequired { next })
      }
    }
  }
}
