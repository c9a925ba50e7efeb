//! [`AccountManager`]: signup, lookup, login checks and account removal.

use std::sync::Arc;

use crate::{
  Error, Result,
  account::{Account, AccountId, AccountSummary, NewAccount},
  credential::Credential,
  form::SignupForm,
  store::{BlogStore, StoreError as _, UniqueKey},
};

/// Account operations over any [`BlogStore`].
pub struct AccountManager<S> {
  store: Arc<S>,
}

impl<S> Clone for AccountManager<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: BlogStore> AccountManager<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Exact lookup; no two accounts ever share an email.
  pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
    self.store.find_account_by_email(email).await.map_err(Error::store)
  }

  pub async fn get(&self, id: AccountId) -> Result<Option<Account>> {
    self.store.get_account(id).await.map_err(Error::store)
  }

  /// Create an account unless the email is already registered.
  ///
  /// The lookup-then-insert is backed by the store's unique constraint, so a
  /// concurrent signup with the same email also ends in
  /// [`Error::DuplicateEmail`].
  pub async fn create_account(
    &self,
    username: &str,
    email: &str,
    password: &str,
  ) -> Result<Account> {
    if self.find_by_email(email).await?.is_some() {
      return Err(Error::DuplicateEmail);
    }

    let input = NewAccount {
      username:   username.to_owned(),
      email:      email.to_owned(),
      credential: Credential::new(password)?,
    };

    match self.store.insert_account(input).await {
      Ok(account) => {
        tracing::info!(account_id = %account.id, "account created");
        Ok(account)
      }
      Err(e) if e.violated_key() == Some(UniqueKey::AccountEmail) => {
        Err(Error::DuplicateEmail)
      }
      Err(e) => Err(Error::store(e)),
    }
  }

  /// Validate a signup form, then create the account it describes.
  pub async fn register(&self, form: &SignupForm) -> Result<Account> {
    form.validate().map_err(Error::Validation)?;
    self
      .create_account(&form.username, &form.email, &form.password)
      .await
  }

  /// The account for `email` if `password` matches its credential.
  pub async fn authenticate(
    &self,
    email: &str,
    password: &str,
  ) -> Result<Option<Account>> {
    let account = self
      .find_by_email(email)
      .await?
      .filter(|account| account.check_password(password));

    match &account {
      Some(a) => tracing::info!(account_id = %a.id, "credentials accepted"),
      None => tracing::info!("credentials rejected"),
    }
    Ok(account)
  }

  pub async fn list(&self) -> Result<Vec<AccountSummary>> {
    self.store.list_accounts().await.map_err(Error::store)
  }

  /// Delete an account and, in the same unit of work, every post it owns.
  pub async fn delete_account(&self, id: AccountId) -> Result<()> {
    let deleted = self.store.delete_account(id).await.map_err(Error::store)?;
    if !deleted {
      return Err(Error::AccountNotFound(id));
    }
    tracing::info!(account_id = %id, "account deleted");
    Ok(())
  }
}
