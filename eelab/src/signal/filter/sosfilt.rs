use eelab_core::{Error, Result};

use super::design::Sos;

/// Run `x` through a cascade of second-order sections in Direct Form II
/// transposed, carrying each section's delay state forward.
///
/// Denominators are expected to be normalised so that `a[0] == 1`.
///
/// # Errors
/// `sos` is empty.
pub fn sosfilt_checked_slice(x: &[f64], sos: &mut [Sos]) -> Result<Vec<f64>> {
    if sos.is_empty() {
        return Err(Error::invalid_arg("sos", "at least one section is required"));
    }
    Ok(x.iter()
        .map(|&xi| {
            sos.iter_mut().fold(xi, |x, s| {
                let y = s.b[0] * x + s.zi0;
                s.zi0 = s.b[1] * x - s.a[1] * y + s.zi1;
                s.zi1 = s.b[2] * x - s.a[2] * y;
                y
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn identity_section_passes_through() {
        let mut sos = vec![Sos::new([1.0, 0.0, 0.0], [1.0, 0.0, 0.0])];
        let x = [1.0, -2.0, 3.5];
        assert_eq!(sosfilt_checked_slice(&x, &mut sos).unwrap(), x.to_vec());
    }

    #[test]
    fn one_pole_impulse_response_decays_geometrically() {
        let mut sos = vec![Sos::new([1.0, 0.0, 0.0], [1.0, -0.5, 0.0])];
        let mut x = vec![0.0; 5];
        x[0] = 1.0;
        let y = sosfilt_checked_slice(&x, &mut sos).unwrap();
        for (i, yi) in y.iter().enumerate() {
            assert_relative_eq!(*yi, 0.5f64.powi(i as i32), epsilon = 1e-15);
        }
    }

    #[test]
    fn state_carries_across_calls() {
        let mut whole = vec![Sos::new([0.2, 0.3, 0.1], [1.0, -0.4, 0.2])];
        let mut split = whole.clone();
        let x: Vec<f64> = (0..10).map(|i| (i as f64 * 0.7).sin()).collect();
        let y_whole = sosfilt_checked_slice(&x, &mut whole).unwrap();
        let mut y_split = sosfilt_checked_slice(&x[..4], &mut split).unwrap();
        y_split.extend(sosfilt_checked_slice(&x[4..], &mut split).unwrap());
        assert_eq!(y_whole, y_split);
    }

    #[test]
    fn empty_cascade_is_rejected() {
        assert!(sosfilt_checked_slice(&[1.0], &mut []).is_err());
    }
}
