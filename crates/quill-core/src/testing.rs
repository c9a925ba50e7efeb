//! In-memory [`BlogStore`] used by the service tests.
//!
//! Enforces the same uniqueness rules as a real backend and can be told to
//! serve stale reads, so the check-then-insert races can be replayed
//! deterministically.

use std::sync::{
  Mutex,
  atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering},
};

use chrono::Utc;
use thiserror::Error;

use crate::{
  account::{Account, AccountId, AccountSummary, NewAccount},
  post::{NewPost, Post, PostId},
  session::{NewSession, Session},
  store::{BlogStore, StoreError, UniqueKey},
};

#[derive(Debug, Error)]
pub enum MemoryError {
  #[error("unique constraint violated: {0}")]
  Conflict(UniqueKey),
  #[error("store unavailable")]
  Unavailable,
}

impl StoreError for MemoryError {
  fn violated_key(&self) -> Option<UniqueKey> {
    match self {
      Self::Conflict(key) => Some(*key),
      Self::Unavailable => None,
    }
  }
}

#[derive(Default)]
struct Tables {
  accounts:        Vec<Account>,
  posts:           Vec<Post>,
  sessions:        Vec<Session>,
  next_account_id: i64,
  next_post_id:    i64,
}

#[derive(Default)]
pub struct MemoryStore {
  tables:           Mutex<Tables>,
  stale_slug_reads: AtomicU32,
  stale_email_read: AtomicBool,
  fail_writes:      AtomicBool,
  insert_attempts:  AtomicUsize,
}

impl MemoryStore {
  /// The next `n` slug snapshots come back empty.
  pub fn hide_slugs(&self, n: u32) { self.stale_slug_reads.store(n, Ordering::SeqCst); }

  /// The next email lookup misses.
  pub fn hide_emails_once(&self) { self.stale_email_read.store(true, Ordering::SeqCst); }

  /// Make every write fail with a non-constraint error.
  pub fn fail_writes(&self, fail: bool) { self.fail_writes.store(fail, Ordering::SeqCst); }

  pub fn insert_attempts(&self) -> usize { self.insert_attempts.load(Ordering::SeqCst) }

  pub fn account_count(&self) -> usize { self.lock().accounts.len() }

  fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
    self.tables.lock().expect("memory store poisoned")
  }

  fn check_writable(&self) -> Result<(), MemoryError> {
    if self.fail_writes.load(Ordering::SeqCst) {
      Err(MemoryError::Unavailable)
    } else {
      Ok(())
    }
  }

  fn take_stale(flag: &AtomicU32) -> bool {
    flag
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
      .is_ok()
  }
}

impl BlogStore for MemoryStore {
  type Error = MemoryError;

  async fn insert_account(&self, input: NewAccount) -> Result<Account, MemoryError> {
    self.check_writable()?;
    let mut tables = self.lock();
    if tables.accounts.iter().any(|a| a.email == input.email) {
      return Err(MemoryError::Conflict(UniqueKey::AccountEmail));
    }
    tables.next_account_id += 1;
    let account = Account {
      id:         AccountId(tables.next_account_id),
      username:   input.username,
      email:      input.email,
      credential: input.credential,
      created_at: Utc::now(),
    };
    tables.accounts.push(account.clone());
    Ok(account)
  }

  async fn get_account(&self, id: AccountId) -> Result<Option<Account>, MemoryError> {
    Ok(self.lock().accounts.iter().find(|a| a.id == id).cloned())
  }

  async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, MemoryError> {
    if self.stale_email_read.swap(false, Ordering::SeqCst) {
      return Ok(None);
    }
    Ok(self.lock().accounts.iter().find(|a| a.email == email).cloned())
  }

  async fn list_accounts(&self) -> Result<Vec<AccountSummary>, MemoryError> {
    let tables = self.lock();
    Ok(
      tables
        .accounts
        .iter()
        .map(|account| AccountSummary {
          account:    account.clone(),
          post_count: tables.posts.iter().filter(|p| p.owner_id == account.id).count() as u64,
        })
        .collect(),
    )
  }

  async fn delete_account(&self, id: AccountId) -> Result<bool, MemoryError> {
    self.check_writable()?;
    let mut tables = self.lock();
    let before = tables.accounts.len();
    tables.accounts.retain(|a| a.id != id);
    tables.posts.retain(|p| p.owner_id != id);
    tables.sessions.retain(|s| s.account_id != id);
    Ok(tables.accounts.len() != before)
  }

  async fn existing_slugs(
    &self,
    base: &str,
    exclude: Option<PostId>,
  ) -> Result<Vec<String>, MemoryError> {
    if Self::take_stale(&self.stale_slug_reads) {
      return Ok(Vec::new());
    }
    let prefix = format!("{base}-");
    Ok(
      self
        .lock()
        .posts
        .iter()
        .filter(|p| Some(p.id) != exclude)
        .filter(|p| p.slug == base || p.slug.starts_with(&prefix))
        .map(|p| p.slug.clone())
        .collect(),
    )
  }

  async fn insert_post(&self, input: NewPost) -> Result<Post, MemoryError> {
    self.insert_attempts.fetch_add(1, Ordering::SeqCst);
    self.check_writable()?;
    let mut tables = self.lock();
    if tables.posts.iter().any(|p| p.slug == input.slug) {
      return Err(MemoryError::Conflict(UniqueKey::PostSlug));
    }
    tables.next_post_id += 1;
    let now = Utc::now();
    let post = Post {
      id:         PostId(tables.next_post_id),
      owner_id:   input.owner_id,
      title:      input.title,
      content:    input.content,
      category:   input.category,
      slug:       input.slug,
      created_at: now,
      updated_at: now,
    };
    tables.posts.push(post.clone());
    Ok(post)
  }

  async fn update_post(&self, mut post: Post) -> Result<Option<Post>, MemoryError> {
    self.check_writable()?;
    let mut tables = self.lock();
    if tables.posts.iter().any(|p| p.id != post.id && p.slug == post.slug) {
      return Err(MemoryError::Conflict(UniqueKey::PostSlug));
    }
    let Some(stored) = tables.posts.iter_mut().find(|p| p.id == post.id) else {
      return Ok(None);
    };
    post.updated_at = Utc::now();
    post.created_at = stored.created_at;
    *stored = post.clone();
    Ok(Some(post))
  }

  async fn get_post_by_slug(&self, slug: &str) -> Result<Option<Post>, MemoryError> {
    Ok(self.lock().posts.iter().find(|p| p.slug == slug).cloned())
  }

  async fn list_posts(&self) -> Result<Vec<Post>, MemoryError> {
    let mut posts = self.lock().posts.clone();
    posts.sort_by(|a, b| b.id.cmp(&a.id));
    Ok(posts)
  }

  async fn delete_post(&self, id: PostId) -> Result<bool, MemoryError> {
    self.check_writable()?;
    let mut tables = self.lock();
    let before = tables.posts.len();
    tables.posts.retain(|p| p.id != id);
    Ok(tables.posts.len() != before)
  }

  async fn insert_session(&self, input: NewSession) -> Result<Session, MemoryError> {
    self.check_writable()?;
    let session = Session {
      token_hash: input.token_hash,
      account_id: input.account_id,
      created_at: Utc::now(),
      expires_at: input.expires_at,
    };
    self.lock().sessions.push(session.clone());
    Ok(session)
  }

  async fn find_session(&self, token_hash: &str) -> Result<Option<Session>, MemoryError> {
    Ok(self.lock().sessions.iter().find(|s| s.token_hash == token_hash).cloned())
  }

  async fn delete_session(&self, token_hash: &str) -> Result<bool, MemoryError> {
    let mut tables = self.lock();
    let before = tables.sessions.len();
    tables.sessions.retain(|s| s.token_hash != token_hash);
    Ok(tables.sessions.len() != before)
  }
}
