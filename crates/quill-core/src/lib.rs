//! Core types, services and the storage trait for the Quill blog.
//!
//! This crate is free of HTTP and database dependencies. Backends implement
//! [`store::BlogStore`]; the web layer drives [`accounts::AccountManager`] and
//! [`content::ContentStore`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod account;
pub mod accounts;
pub mod content;
pub mod credential;
pub mod error;
pub mod form;
pub mod post;
pub mod session;
pub mod slug;
pub mod store;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
