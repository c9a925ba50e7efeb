//! [`ContentStore`]: post persistence with slug allocation and retry.
//!
//! Slug allocation scans a snapshot of the slugs in use and picks the first
//! free candidate. Between that scan and the insert another writer can claim
//! the same slug; the backend's unique constraint catches it, and the save is
//! retried with a freshly allocated slug up to `slug_retries` times.

use std::{collections::HashSet, future::Future, sync::Arc};

use crate::{
  Error, Result,
  form::{PostForm, check_post_fields},
  post::{NewPost, Post, PostId},
  slug,
  store::{BlogStore, StoreError as _, UniqueKey},
};

/// One retry after a slug collision; a second collision is fatal.
pub const DEFAULT_SLUG_RETRIES: u32 = 1;

/// Post operations over any [`BlogStore`]. Performs no authorization; callers
/// check ownership before editing or deleting.
pub struct ContentStore<S> {
  store:        Arc<S>,
  slug_retries: u32,
}

impl<S> Clone for ContentStore<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), slug_retries: self.slug_retries }
  }
}

impl<S: BlogStore> ContentStore<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store, slug_retries: DEFAULT_SLUG_RETRIES }
  }

  /// How many times a save is retried after losing a slug race.
  pub fn with_slug_retries(mut self, retries: u32) -> Self {
    self.slug_retries = retries;
    self
  }

  /// Allocate a slug for `title` against the slugs currently stored,
  /// ignoring those held by `exclude`.
  pub async fn allocate_slug(
    &self,
    title: &str,
    exclude: Option<PostId>,
  ) -> Result<String> {
    let base = slug::base_slug(title);
    let existing: HashSet<String> = self
      .store
      .existing_slugs(&base, exclude)
      .await
      .map_err(Error::store)?
      .into_iter()
      .collect();
    Ok(slug::first_free(&base, |candidate| existing.contains(candidate)))
  }

  /// Persist a new post, allocating its slug if it has none.
  pub async fn create(&self, mut input: NewPost) -> Result<Post> {
    check_post_fields(&input.title, &input.content, input.category.as_deref())
      .map_err(Error::Validation)?;

    if input.slug.is_empty() {
      input.slug = self.allocate_slug(&input.title, None).await?;
    }

    let title = input.title.clone();
    let post = self
      .persist_with_retry(&title, None, input.slug.clone(), |slug| {
        let mut attempt = input.clone();
        attempt.slug = slug;
        self.store.insert_post(attempt)
      })
      .await?;

    tracing::info!(post_id = %post.id, slug = %post.slug, "post created");
    Ok(post)
  }

  /// Persist changes to an existing post. An empty slug (see
  /// [`Post::retitle`]) is re-allocated first.
  pub async fn save(&self, mut post: Post) -> Result<Post> {
    check_post_fields(&post.title, &post.content, post.category.as_deref())
      .map_err(Error::Validation)?;

    if post.slug.is_empty() {
      post.slug = self.allocate_slug(&post.title, Some(post.id)).await?;
    }

    let id = post.id;
    let title = post.title.clone();
    let saved = self
      .persist_with_retry(&title, Some(id), post.slug.clone(), |slug| {
        let mut attempt = post.clone();
        attempt.slug = slug;
        self.store.update_post(attempt)
      })
      .await?
      .ok_or_else(|| Error::PostNotFound(id.to_string()))?;

    tracing::info!(post_id = %saved.id, slug = %saved.slug, "post saved");
    Ok(saved)
  }

  /// Apply a validated edit form to `post` and save it. The slug changes only
  /// if the title does.
  pub async fn edit(&self, mut post: Post, form: &PostForm) -> Result<Post> {
    form.validate().map_err(Error::Validation)?;
    post.retitle(form.title.clone());
    post.content = form.content.clone();
    post.category = form.category();
    self.save(post).await
  }

  /// Exact lookup; no case folding.
  pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>> {
    self.store.get_post_by_slug(slug).await.map_err(Error::store)
  }

  /// Like [`Self::get_by_slug`] but a missing post is an error.
  pub async fn require(&self, slug: &str) -> Result<Post> {
    self
      .get_by_slug(slug)
      .await?
      .ok_or_else(|| Error::PostNotFound(slug.to_owned()))
  }

  /// Every post, newest first.
  pub async fn get_all(&self) -> Result<Vec<Post>> {
    self.store.list_posts().await.map_err(Error::store)
  }

  /// Permanently delete `post`. A failed delete is rolled back by the store
  /// and reported as the recoverable [`Error::DeleteFailed`].
  pub async fn delete(&self, post: &Post) -> Result<()> {
    match self.store.delete_post(post.id).await {
      Ok(true) => {
        tracing::info!(post_id = %post.id, slug = %post.slug, "post deleted");
        Ok(())
      }
      Ok(false) => Err(Error::PostNotFound(post.slug.clone())),
      Err(e) => {
        tracing::warn!(post_id = %post.id, error = %e, "post delete rolled back");
        Err(Error::DeleteFailed(Box::new(e)))
      }
    }
  }

  /// Run `persist` with `slug`; on a slug uniqueness violation re-allocate and
  /// try again, at most `slug_retries` more times.
  async fn persist_with_retry<T, F, Fut>(
    &self,
    title: &str,
    exclude: Option<PostId>,
    mut slug: String,
    mut persist: F,
  ) -> Result<T>
  where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, S::Error>>,
  {
    let mut retries = 0;
    loop {
      match persist(slug.clone()).await {
        Ok(value) => return Ok(value),
        Err(e) if e.violated_key() == Some(UniqueKey::PostSlug) => {
          if retries >= self.slug_retries {
            tracing::error!(%slug, retries, "slug still taken after retrying");
            return Err(Error::SlugCollision(slug));
          }
          retries += 1;
          tracing::warn!(%slug, retries, "slug taken by a concurrent write, re-allocating");
          slug = self.allocate_slug(title, exclude).await?;
        }
        Err(e) => {
          tracing::error!(error = %e, "post persist failed");
          return Err(Error::store(e));
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{account::AccountId, testing::MemoryStore};

  const OWNER: AccountId = AccountId(1);

  fn content() -> (Arc<MemoryStore>, ContentStore<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    (Arc::clone(&store), ContentStore::new(store))
  }

  fn draft(title: &str) -> NewPost {
    NewPost::new(OWNER, title, "Some body text that is long enough.", None)
  }

  #[tokio::test]
  async fn create_fills_empty_slug() {
    let (_, posts) = content();
    let post = posts.create(draft("Hello World")).await.unwrap();
    assert_eq!(post.slug, "hello-world");
    assert_eq!(post.public_url(), "/post/hello-world/");
  }

  #[tokio::test]
  async fn same_title_gets_counter_suffix() {
    let (_, posts) = content();
    let a = posts.create(draft("My Title")).await.unwrap();
    let b = posts.create(draft("My Title")).await.unwrap();
    let c = posts.create(draft("my title!")).await.unwrap();
    assert_eq!(a.slug, "my-title");
    assert_eq!(b.slug, "my-title-1");
    assert_eq!(c.slug, "my-title-2");
  }

  #[tokio::test]
  async fn unsluggable_title_uses_fallback() {
    let (_, posts) = content();
    let a = posts.create(draft("???")).await.unwrap();
    let b = posts.create(draft("!!")).await.unwrap();
    assert_eq!(a.slug, "post");
    assert_eq!(b.slug, "post-1");
  }

  #[tokio::test]
  async fn invalid_post_is_never_persisted() {
    let (store, posts) = content();
    let err = posts
      .create(NewPost::new(OWNER, "x", "short", None))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(store.list_posts().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn lost_race_is_retried_once() {
    let (store, posts) = content();
    posts.create(draft("Race")).await.unwrap();

    // The next snapshot misses "race", as if another writer committed it
    // between the scan and the insert.
    store.hide_slugs(1);
    let post = posts.create(draft("Race")).await.unwrap();
    assert_eq!(post.slug, "race-1");
    assert_eq!(store.list_posts().await.unwrap().len(), 2);
  }

  #[tokio::test]
  async fn second_collision_is_fatal() {
    let (store, posts) = content();
    posts.create(draft("Race")).await.unwrap();

    store.hide_slugs(2);
    let err = posts.create(draft("Race")).await.unwrap_err();
    assert!(matches!(err, Error::SlugCollision(ref s) if s == "race"));
    assert!(!err.is_recoverable());
    assert_eq!(store.list_posts().await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn raised_retry_bound_absorbs_more_collisions() {
    let (store, posts) = content();
    let posts = posts.with_slug_retries(3);
    posts.create(draft("Race")).await.unwrap();

    store.hide_slugs(3);
    let post = posts.create(draft("Race")).await.unwrap();
    assert_eq!(post.slug, "race-1");
  }

  #[tokio::test]
  async fn other_store_failures_are_not_retried() {
    let (store, posts) = content();
    store.fail_writes(true);
    let err = posts.create(draft("Anything")).await.unwrap_err();
    assert!(matches!(err, Error::Store(_)));
    assert_eq!(store.insert_attempts(), 1);
  }

  #[tokio::test]
  async fn retitle_reallocates_slug() {
    let (_, posts) = content();
    let mut post = posts.create(draft("First Title")).await.unwrap();
    post.retitle("Second Title");
    let saved = posts.save(post).await.unwrap();
    assert_eq!(saved.slug, "second-title");
    assert!(posts.get_by_slug("first-title").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn unchanged_title_keeps_slug() {
    let (_, posts) = content();
    let post = posts.create(draft("Stable")).await.unwrap();
    let form = PostForm {
      title:    "Stable".into(),
      content:  "Completely rewritten body.".into(),
      category: Some("notes".into()),
    };
    let saved = posts.edit(post, &form).await.unwrap();
    assert_eq!(saved.slug, "stable");
    assert_eq!(saved.category.as_deref(), Some("notes"));
  }

  #[tokio::test]
  async fn retitle_to_same_base_does_not_collide_with_itself() {
    let (_, posts) = content();
    let mut post = posts.create(draft("Hello")).await.unwrap();
    post.retitle("Hello!");
    let saved = posts.save(post).await.unwrap();
    assert_eq!(saved.slug, "hello");
  }

  #[tokio::test]
  async fn get_all_is_newest_first() {
    let (_, posts) = content();
    let first = posts.create(draft("One")).await.unwrap();
    let second = posts.create(draft("Two")).await.unwrap();
    let all = posts.get_all().await.unwrap();
    let ids: Vec<_> = all.iter().map(|p| p.id).collect();
    assert_eq!(ids, [second.id, first.id]);
  }

  #[tokio::test]
  async fn delete_then_lookup_misses() {
    let (_, posts) = content();
    let post = posts.create(draft("Gone")).await.unwrap();
    posts.delete(&post).await.unwrap();
    assert!(posts.get_by_slug("gone").await.unwrap().is_none());
    assert!(matches!(posts.require("gone").await, Err(Error::PostNotFound(_))));
  }

  #[tokio::test]
  async fn failed_delete_is_recoverable() {
    let (store, posts) = content();
    let post = posts.create(draft("Sticky")).await.unwrap();
    store.fail_writes(true);
    let err = posts.delete(&post).await.unwrap_err();
    assert!(matches!(err, Error::DeleteFailed(_)));
    assert!(err.is_recoverable());
    store.fail_writes(false);
    assert!(posts.get_by_slug("sticky").await.unwrap().is_some());
  }

  #[tokio::test]
  async fn lookup_is_case_sensitive() {
    let (_, posts) = content();
    posts.create(draft("Case")).await.unwrap();
    assert!(posts.get_by_slug("Case").await.unwrap().is_none());
  }
}
