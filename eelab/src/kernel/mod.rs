//! Shared kernel substrate.
//!
//! Every analysis in this crate is a validated kernel: a plain config struct
//! is checked once by [`KernelLifecycle::try_new`], and the resulting kernel
//! reads its input through the [`Read1D`] / [`Write1D`] adapters.

mod errors;
mod io;
mod lifecycle;

pub use errors::*;
pub use io::*;
pub use lifecycle::*;
