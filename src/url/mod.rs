//! URL handling module for Ripple-Parse
//!
//! This module provides canonicalization of outgoing link targets: relative
//! references are resolved against the page context and the result is normalized
//! so that equivalent spellings of one URL compare equal.

mod canonical;

pub use canonical::canonicalize_url;
