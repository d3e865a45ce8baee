pub use eelab_core::{Error, Result};
