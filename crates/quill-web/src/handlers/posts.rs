//! Public read handlers.

use axum::{
  Json,
  extract::{Path, State},
  http::HeaderMap,
  response::{IntoResponse, Response},
};
use quill_core::{post::Post, session::Principal, store::BlogStore};
use serde::Serialize;

use crate::{
  AppState,
  auth::CurrentPrincipal,
  cookie,
  error::Error,
  flash,
};

#[derive(Debug, Serialize)]
pub struct IndexPage {
  pub posts:     Vec<Post>,
  pub flash:     Option<String>,
  pub principal: Option<Principal>,
}

/// `GET /`: every post, newest first. A pending flash message is returned
/// once and then cleared.
pub async fn index<S>(
  State(state): State<AppState<S>>,
  CurrentPrincipal(principal): CurrentPrincipal,
  headers: HeaderMap,
) -> Result<Response, Error>
where
  S: BlogStore + 'static,
{
  let posts = state.posts.get_all().await?;
  let flash = flash::read(&headers);
  Ok(with_flash_cleared(Json(IndexPage { posts, flash, principal }), &headers))
}

#[derive(Debug, Serialize)]
pub struct PostPage {
  pub post:  Post,
  pub flash: Option<String>,
}

/// `GET /post/{slug}/`
pub async fn detail<S>(
  State(state): State<AppState<S>>,
  Path(slug): Path<String>,
  headers: HeaderMap,
) -> Result<Response, Error>
where
  S: BlogStore + 'static,
{
  let post = state.posts.require(&slug).await?;
  let flash = flash::read(&headers);
  Ok(with_flash_cleared(Json(PostPage { post, flash }), &headers))
}

/// Render `page`, clearing the flash cookie if the request carried one.
fn with_flash_cleared(page: impl IntoResponse, headers: &HeaderMap) -> Response {
  let mut response = page.into_response();
  if flash::read(headers).is_some() {
    cookie::append(&mut response, &flash::clear_cookie());
  }
  response
}
