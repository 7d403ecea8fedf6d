//! Core types and trait definitions for the student risk platform.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! record store and the language-model service are reached only through the
//! [`store::RecordStore`] and [`engine::CompletionService`] traits, so every
//! piece of decision logic here can be exercised against test doubles.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod aggregate;
pub mod engine;
pub mod error;
pub mod generate;
pub mod record;
pub mod router;
pub mod store;
pub mod summary;
pub mod table;

pub use error::{Error, Result};
