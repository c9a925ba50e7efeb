//! Account registration.

use axum::{
  Form,
  extract::State,
  response::{IntoResponse, Redirect, Response},
};
use quill_core::{form::SignupForm, store::BlogStore};

use crate::{
  AppState,
  auth::{self, CurrentPrincipal},
  error::Error,
  handlers::redirect_setting,
};

/// `POST /signup/`: create the account and log it in.
///
/// A taken email is reported as a field error on `email`; no account is
/// created.
pub async fn signup<S>(
  State(state): State<AppState<S>>,
  CurrentPrincipal(current): CurrentPrincipal,
  Form(form): Form<SignupForm>,
) -> Result<Response, Error>
where
  S: BlogStore + 'static,
{
  if current.is_some() {
    return Ok(Redirect::to("/").into_response());
  }

  let account = state.accounts.register(&form).await?;
  let session = auth::start_session(&state, account.id, false).await?;
  Ok(redirect_setting("/", &[session]))
}
