//! Authoring handlers. Every route requires a session; edit and delete also
//! require that the principal owns the post.

use axum::{
  Form,
  extract::{Path, State},
  response::{IntoResponse, Redirect, Response},
};
use quill_core::{
  form::PostForm,
  post::NewPost,
  store::BlogStore,
};

use crate::{
  AppState,
  auth::RequirePrincipal,
  error::{DELETE_FAILED, Error},
  flash,
};

/// `POST /admin/post/`: create a post owned by the principal.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  RequirePrincipal(principal): RequirePrincipal,
  Form(form): Form<PostForm>,
) -> Result<Response, Error>
where
  S: BlogStore + 'static,
{
  form.validate().map_err(quill_core::Error::Validation)?;

  let input = NewPost::new(
    principal.account_id,
    form.title.clone(),
    form.content.clone(),
    form.category(),
  );
  let post = state.posts.create(input).await?;
  Ok(Redirect::to(&post.public_url()).into_response())
}

/// `POST /admin/post/{slug}/edit`: the slug is regenerated if the title
/// changes, and the client is sent to the post's (possibly new) URL.
pub async fn edit<S>(
  State(state): State<AppState<S>>,
  Path(slug): Path<String>,
  RequirePrincipal(principal): RequirePrincipal,
  Form(form): Form<PostForm>,
) -> Result<Response, Error>
where
  S: BlogStore + 'static,
{
  let post = state.posts.require(&slug).await?;
  principal.ensure_owner(&post)?;

  let saved = state.posts.edit(post, &form).await?;
  Ok(Redirect::to(&saved.public_url()).into_response())
}

/// `POST /admin/post/{slug}/delete`
///
/// A failed delete sends the client back to the post with a message instead
/// of failing the request.
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  Path(slug): Path<String>,
  RequirePrincipal(principal): RequirePrincipal,
) -> Result<Response, Error>
where
  S: BlogStore + 'static,
{
  let post = state.posts.require(&slug).await?;
  principal.ensure_owner(&post)?;

  match state.posts.delete(&post).await {
    Ok(()) => Ok(Redirect::to("/").into_response()),
    Err(quill_core::Error::DeleteFailed(_)) => {
      Ok(flash::redirect_with_flash(&post.public_url(), DELETE_FAILED))
    }
    Err(e) => Err(e.into()),
  }
}
