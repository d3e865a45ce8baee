//! Edge extension helpers for forward-backward filtering.

use eelab_core::{Error, Result};
use ndarray::{concatenate, s, Array1, ArrayView1, Axis};

/// Odd extension of `x` by `n` samples at each end.
///
/// Each end is reflected about its own endpoint value, so the extension
/// continues the local slope: `[1, 2, 4]` extended by 2 is
/// `[-2, 0, 1, 2, 4, 6, 7]`.
///
/// # Errors
/// `n` is not smaller than the input length.
pub fn odd_ext(x: ArrayView1<'_, f64>, n: usize) -> Result<Array1<f64>> {
    if n == 0 {
        return Ok(x.to_owned());
    }
    let len = x.len();
    if n >= len {
        return Err(Error::InvalidArg {
            arg: "n".into(),
            reason: format!("extension length {n} must be less than input length {len}"),
        });
    }
    let first = x[0];
    let last = x[len - 1];
    let left = x.slice(s![1..=n;-1]).mapv(|v| 2.0 * first - v);
    let right = x.slice(s![len - n - 1..len - 1;-1]).mapv(|v| 2.0 * last - v);
    concatenate(Axis(0), &[left.view(), x.view(), right.view()]).map_err(|e| {
        Error::ExecInvariantViolation {
            reason: e.to_string(),
        }
    })
}
