//! Core types shared across the `eelab` workspace.
//!
//! Holds the crate-wide [`Error`] and numpy-flavoured helpers in [`num_rs`]
//! that the signal engine builds on.

#![deny(missing_docs)]

mod error;
pub use error::*;

/// Numpy-style array constructors.
pub mod num_rs;
