//! Shared foundational types used across the kiln build engine.
//!
//! This crate provides the content digest type that every fingerprint, cache
//! key, and secondary-input hash is built from.

#![warn(missing_docs)]

pub mod hash;

pub use hash::{ContentHash, HashBuilder};
