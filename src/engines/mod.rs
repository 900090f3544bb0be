//! Speech synthesis engines.
//!
//! This module contains implementations of voice-cloning text-to-speech engines.
//!
//! # Available Engines
//!
//! Enable engines via Cargo features:
//! - `xtts` - XTTS v2 through an HTTP inference server (default)

#[cfg(feature = "xtts")]
pub mod xtts;
