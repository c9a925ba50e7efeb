//! Password credentials.
//!
//! Only the argon2 PHC string (`$argon2id$v=19$…`) is ever kept; the plaintext
//! is dropped as soon as it has been hashed.

use std::fmt;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A salted one-way password hash.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
  /// Hash `plaintext` with a fresh random salt.
  pub fn new(plaintext: &str) -> Result<Self> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(plaintext.as_bytes(), &salt)
      .map_err(|e| Error::Credential(format!("argon2 error: {e}")))?
      .to_string();
    Ok(Self(hash))
  }

  /// Wrap a PHC string read back from storage.
  pub fn from_phc(phc: impl Into<String>) -> Self { Self(phc.into()) }

  /// Replace the stored hash with one derived from `plaintext`.
  pub fn set(&mut self, plaintext: &str) -> Result<()> {
    *self = Self::new(plaintext)?;
    Ok(())
  }

  /// `true` iff `plaintext` hashes to the stored value.
  ///
  /// A malformed stored hash verifies nothing rather than erroring.
  pub fn verify(&self, plaintext: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(&self.0) else {
      tracing::warn!("stored credential is not a valid PHC string");
      return false;
    };
    Argon2::default()
      .verify_password(plaintext.as_bytes(), &parsed)
      .is_ok()
  }

  pub fn as_phc(&self) -> &str { &self.0 }
}

// Never print the hash by accident.
impl fmt::Debug for Credential {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("Credential(<redacted>)")
  }
}
