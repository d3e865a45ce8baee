use eelab_core::{Error, Result};
use nalgebra::{Matrix2, Vector2};

use super::design::Sos;

/// Set each section's delay state to the steady state of a unit step.
///
/// Scaling the result by the first input sample starts a filter as if that
/// sample had been applied forever, which suppresses the start-up transient.
///
/// # Errors
/// `sos` is empty, or a section has a pole at `z = 1` so no steady state
/// exists.
pub fn sosfilt_zi_checked_slice(sos: &mut [Sos]) -> Result<()> {
    if sos.is_empty() {
        return Err(Error::invalid_arg("sos", "at least one section is required"));
    }
    let mut scale = 1.0;
    for s in sos.iter_mut() {
        let [b0, b1, b2] = s.b;
        let [_, a1, a2] = s.a;
        let lhs = Matrix2::new(1.0 + a1, -1.0, a2, 1.0);
        let rhs = Vector2::new(b1 - a1 * b0, b2 - a2 * b0);
        let zi = lhs.lu().solve(&rhs).ok_or(Error::ExecInvariantViolation {
            reason: "section has no step steady state".into(),
        })?;
        s.zi0 = scale * zi[0];
        s.zi1 = scale * zi[1];
        scale *= s.b.iter().sum::<f64>() / s.a.iter().sum::<f64>();
    }
    Ok(())
}
