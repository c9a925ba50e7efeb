//! Login and logout.

use axum::{
  Form,
  extract::{Query, State},
  http::{HeaderMap, header},
  response::{IntoResponse, Redirect, Response},
};
use quill_core::{form::LoginForm, store::BlogStore};
use serde::Deserialize;

use crate::{
  AppState,
  auth::{self, CurrentPrincipal, RequirePrincipal},
  error::Error,
  handlers::redirect_setting,
  redirect,
};

#[derive(Debug, Default, Deserialize)]
pub struct NextParam {
  pub next: Option<String>,
}

/// `POST /login[?next=<path>]`
///
/// On success the session cookie is set and the client is sent to `next` if
/// it is a same-origin target, otherwise to the home page.
pub async fn login<S>(
  State(state): State<AppState<S>>,
  CurrentPrincipal(current): CurrentPrincipal,
  Query(params): Query<NextParam>,
  headers: HeaderMap,
  Form(form): Form<LoginForm>,
) -> Result<Response, Error>
where
  S: BlogStore + 'static,
{
  if current.is_some() {
    return Ok(Redirect::to("/").into_response());
  }
  form.validate().map_err(quill_core::Error::Validation)?;

  let account = state
    .accounts
    .authenticate(&form.email, &form.password)
    .await?
    .ok_or(Error::InvalidCredentials)?;

  let session = auth::start_session(&state, account.id, form.remember_me).await?;

  let host = headers.get(header::HOST).and_then(|v| v.to_str().ok());
  let target = redirect::safe_target(params.next.as_deref(), host);
  Ok(redirect_setting(&target, &[session]))
}

/// `GET /logout`
pub async fn logout<S>(
  State(state): State<AppState<S>>,
  RequirePrincipal(principal): RequirePrincipal,
  headers: HeaderMap,
) -> Result<Response, Error>
where
  S: BlogStore + 'static,
{
  let cleared = auth::end_session(&state, &headers).await?;
  tracing::info!(account_id = %principal.account_id, "logged out");
  Ok(redirect_setting("/", &[cleared]))
}
