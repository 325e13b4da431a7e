//! # Work abstractions.
//!
//! This module provides:
//! - [`Work`] - single-shot or lazy-sequence user work, optionally token-aware
//! - [`ItemStream`] - the iterator type produced by lazy-sequence work

mod work;

pub(crate) use work::Output;
pub use work::{ItemStream, Work};
