//! [`SqliteStore`], the SQLite implementation of [`BlogStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use quill_core::{
  account::{Account, AccountId, AccountSummary, NewAccount},
  post::{NewPost, Post, PostId},
  session::{NewSession, Session},
  store::{BlogStore, UniqueKey},
};

use crate::{
  Error, Result,
  encode::{
    ACCOUNT_COLUMNS, POST_COLUMNS, RawAccount, RawAccountSummary, RawPost,
    RawSession, encode_dt, unique_violation,
  },
  schema::SCHEMA,
};

/// Outcome of a write inside a connection call: either the value, or the
/// uniqueness constraint that forced a rollback.
type Checked<T> = std::result::Result<T, UniqueKey>;

/// Split the constraint violations callers can recover from off from genuine
/// database failures.
fn checked<T>(
  result: rusqlite::Result<T>,
) -> std::result::Result<Checked<T>, tokio_rusqlite::Error> {
  match result {
    Ok(value) => Ok(Ok(value)),
    Err(e) => match unique_violation(&e) {
      Some(key) => Ok(Err(key)),
      None => Err(e.into()),
    },
  }
}

fn conflict(key: UniqueKey) -> Error {
  tracing::debug!(%key, "write rolled back on unique constraint");
  Error::Conflict(key)
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Quill blog store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── BlogStore impl ──────────────────────────────────────────────────────────

impl BlogStore for SqliteStore {
  type Error = Error;

  // ── Accounts ──────────────────────────────────────────────────────────────

  async fn insert_account(&self, input: NewAccount) -> Result<Account> {
    let created_at = Utc::now();
    let at_str     = encode_dt(created_at);
    let username   = input.username.clone();
    let email      = input.email.clone();
    let hash       = input.credential.as_phc().to_owned();

    let id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Err(key) = checked(tx.execute(
          "INSERT INTO accounts (username, email, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![username, email, hash, at_str],
        ))? {
          return Ok(Err(key));
        }
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(Ok(id))
      })
      .await?
      .map_err(conflict)?;

    Ok(Account {
      id: AccountId(id),
      username: input.username,
      email: input.email,
      credential: input.credential,
      created_at,
    })
  }

  async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_id = ?1"),
            rusqlite::params![id.0],
            RawAccount::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
    let email = email.to_owned();

    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?1"),
            rusqlite::params![email],
            RawAccount::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  async fn list_accounts(&self) -> Result<Vec<AccountSummary>> {
    let raws: Vec<RawAccountSummary> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT a.account_id, a.username, a.email, a.password_hash, a.created_at,
                  COUNT(p.post_id)
           FROM accounts a
           LEFT JOIN posts p ON p.account_id = a.account_id
           GROUP BY a.account_id
           ORDER BY a.account_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawAccountSummary {
              account:    RawAccount::from_row(row)?,
              post_count: row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAccountSummary::into_summary).collect()
  }

  async fn delete_account(&self, id: AccountId) -> Result<bool> {
    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM sessions WHERE account_id = ?1", rusqlite::params![id.0])?;
        tx.execute("DELETE FROM posts WHERE account_id = ?1", rusqlite::params![id.0])?;
        let n = tx.execute("DELETE FROM accounts WHERE account_id = ?1", rusqlite::params![id.0])?;
        tx.commit()?;
        Ok(n > 0)
      })
      .await?;
    Ok(deleted)
  }

  // ── Posts ─────────────────────────────────────────────────────────────────

  async fn existing_slugs(&self, base: &str, exclude: Option<PostId>) -> Result<Vec<String>> {
    let base       = base.to_owned();
    let prefix     = format!("{base}-");
    let exclude_id = exclude.map(|id| id.0);

    let slugs = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT slug FROM posts
           WHERE (slug = ?1 OR substr(slug, 1, length(?2)) = ?2)
             AND (?3 IS NULL OR post_id <> ?3)",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![base, prefix, exclude_id], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(slugs)
  }

  async fn insert_post(&self, input: NewPost) -> Result<Post> {
    let now      = Utc::now();
    let at_str   = encode_dt(now);
    let owner    = input.owner_id.0;
    let title    = input.title.clone();
    let content  = input.content.clone();
    let category = input.category.clone();
    let slug     = input.slug.clone();

    let id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Err(key) = checked(tx.execute(
          "INSERT INTO posts (account_id, title, content, category, slug, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
          rusqlite::params![owner, title, content, category, slug, at_str],
        ))? {
          return Ok(Err(key));
        }
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(Ok(id))
      })
      .await?
      .map_err(conflict)?;

    Ok(Post {
      id:         PostId(id),
      owner_id:   input.owner_id,
      title:      input.title,
      content:    input.content,
      category:   input.category,
      slug:       input.slug,
      created_at: now,
      updated_at: now,
    })
  }

  async fn update_post(&self, post: Post) -> Result<Option<Post>> {
    let at_str = encode_dt(Utc::now());

    let raw: Option<RawPost> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = match checked(tx.execute(
          "UPDATE posts
           SET title = ?1, content = ?2, category = ?3, slug = ?4, updated_at = ?5
           WHERE post_id = ?6",
          rusqlite::params![post.title, post.content, post.category, post.slug, at_str, post.id.0],
        ))? {
          Ok(n) => n,
          Err(key) => return Ok(Err(key)),
        };
        if changed == 0 {
          return Ok(Ok(None));
        }
        let raw = tx.query_row(
          &format!("SELECT {POST_COLUMNS} FROM posts WHERE post_id = ?1"),
          rusqlite::params![post.id.0],
          RawPost::from_row,
        )?;
        tx.commit()?;
        Ok(Ok(Some(raw)))
      })
      .await?
      .map_err(conflict)?;

    raw.map(RawPost::into_post).transpose()
  }

  async fn get_post_by_slug(&self, slug: &str) -> Result<Option<Post>> {
    let slug = slug.to_owned();

    let raw: Option<RawPost> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {POST_COLUMNS} FROM posts WHERE slug = ?1"),
            rusqlite::params![slug],
            RawPost::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPost::into_post).transpose()
  }

  async fn list_posts(&self) -> Result<Vec<Post>> {
    let raws: Vec<RawPost> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {POST_COLUMNS} FROM posts ORDER BY post_id DESC"))?;
        let rows = stmt
          .query_map([], RawPost::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPost::into_post).collect()
  }

  async fn delete_post(&self, id: PostId) -> Result<bool> {
    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let n = tx.execute("DELETE FROM posts WHERE post_id = ?1", rusqlite::params![id.0])?;
        tx.commit()?;
        Ok(n > 0)
      })
      .await?;
    Ok(deleted)
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn insert_session(&self, input: NewSession) -> Result<Session> {
    let session = Session {
      token_hash: input.token_hash,
      account_id: input.account_id,
      created_at: Utc::now(),
      expires_at: input.expires_at,
    };

    let hash    = session.token_hash.clone();
    let account = session.account_id.0;
    let created = encode_dt(session.created_at);
    let expires = encode_dt(session.expires_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (token_hash, account_id, created_at, expires_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![hash, account, created, expires],
        )?;
        Ok(())
      })
      .await?;

    Ok(session)
  }

  async fn find_session(&self, token_hash: &str) -> Result<Option<Session>> {
    let hash = token_hash.to_owned();

    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT token_hash, account_id, created_at, expires_at
             FROM sessions WHERE token_hash = ?1",
            rusqlite::params![hash],
            |row| {
              Ok(RawSession {
                token_hash: row.get(0)?,
                account_id: row.get(1)?,
                created_at: row.get(2)?,
                expires_at: row.get(3)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSession::into_session).transpose()
  }

  async fn delete_session(&self, token_hash: &str) -> Result<bool> {
    let hash = token_hash.to_owned();

    let deleted = self
      .conn
      .call(move |conn| {
        let n = conn.execute("DELETE FROM sessions WHERE token_hash = ?1", rusqlite::params![hash])?;
        Ok(n > 0)
      })
      .await?;
    Ok(deleted)
  }
}
