//! # shotdiff-core
//!
//! Core types for comparing browser UI screenshots across two revisions.
//!
//! ## Core Paradigm
//!
//! - A screenshot is identified by its platform and combination key
//! - Each side ("old" and "new") is one revision's set of screenshots
//! - Comparison outcomes come from an external pixel comparator, keyed per platform
//! - Everything here is a plain value, built fresh for each comparison request

mod error;
mod types;

pub mod config;
pub mod fail_open;

pub use config::{DisplayDefaults, LegacyPrefixConfig, ShotdiffConfig};
pub use error::{Result, ShotdiffError};
pub use types::*;
