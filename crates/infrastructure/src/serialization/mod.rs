//! Deterministic JSON serialization for the config and slot files.
//!
//! Output uses 2-space indentation and a trailing newline; maps are
//! `BTreeMap`s so keys come out sorted.

mod json;

pub use json::*;
