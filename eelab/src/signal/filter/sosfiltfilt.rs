use core::cmp::min;
use eelab_core::{Error, Result};
use ndarray::ArrayView1;

use super::{arraytools::odd_ext, design::Sos, sosfilt_checked_slice, sosfilt_zi_checked_slice};

/// Number of samples [`sosfiltfilt_checked_slice`] adds to each end of the
/// input. Inputs must be strictly longer than this.
pub fn sosfiltfilt_padlen(sos: &[Sos]) -> usize {
    let bzeros = sos.iter().filter(|s| s.b[2] == 0.0).count();
    let azeros = sos.iter().filter(|s| s.a[2] == 0.0).count();
    let ntaps = 2 * sos.len() + 1 - min(bzeros, azeros);
    3 * ntaps
}

///
/// A forward-backward digital filter using cascaded second-order sections.
///
/// The input is oddly extended by [`sosfiltfilt_padlen`] samples at both
/// ends, filtered forwards and then backwards with each pass started from
/// its step steady state, and trimmed back to the input length. The result
/// has zero phase distortion and the squared magnitude response of `sos`.
///
/// <https://docs.scipy.org/doc/scipy/reference/generated/scipy.signal.sosfiltfilt.html>
///
/// # Errors
/// `y` is empty, `sos` is empty, or `y` is not longer than the padding.
///
pub fn sosfiltfilt_checked_slice(y: &[f64], sos: &[Sos]) -> Result<Vec<f64>> {
    if y.is_empty() {
        return Err(Error::invalid_arg("y", "input must be non-empty."));
    }
    if sos.is_empty() {
        return Err(Error::invalid_arg("sos", "at least one section is required"));
    }
    let edge = sosfiltfilt_padlen(sos);
    if y.len() <= edge {
        return Err(Error::invalid_arg(
            "y",
            format!(
                "input length {} must be greater than padlen {edge}",
                y.len()
            ),
        ));
    }
    let y_len = y.len();
    let ext = odd_ext(ArrayView1::from(y), edge)?;
    let ext = ext.to_vec();

    let mut init_sos = sos.to_vec();
    sosfilt_zi_checked_slice(&mut init_sos)?;

    let x0 = ext[0];
    let mut sos_x = init_sos.clone();
    for s in sos_x.iter_mut() {
        s.zi0 *= x0;
        s.zi1 *= x0;
    }
    let forward = sosfilt_checked_slice(&ext, &mut sos_x)?;

    let y0 = *forward
        .last()
        .ok_or_else(|| Error::invalid_arg("y", "input must be non-empty."))?;
    let mut sos_y = init_sos;
    for s in sos_y.iter_mut() {
        s.zi0 *= y0;
        s.zi1 *= y0;
    }
    let mut y_rev = forward;
    y_rev.reverse();
    let mut z = sosfilt_checked_slice(&y_rev, &mut sos_y)?
        .into_iter()
        .skip(edge)
        .take(y_len)
        .collect::<Vec<_>>();
    z.reverse();
    Ok(z)
}
