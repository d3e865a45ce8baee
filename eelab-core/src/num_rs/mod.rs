use num_traits::Float;

/// Return `num` evenly spaced samples over `[start, stop]`.
///
/// Matches `numpy.linspace(start, stop, num)` with `endpoint=True`.
/// `num == 0` yields an empty vector and `num == 1` yields `[start]`.
///
/// ```
/// use eelab_core::num_rs::linspace;
///
/// assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
/// assert_eq!(linspace(2.0f64, 9.0, 1), vec![2.0]);
/// assert!(linspace(0.0f64, 1.0, 0).is_empty());
/// ```
pub fn linspace<F: Float>(start: F, stop: F, num: usize) -> Vec<F> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let Some(steps) = F::from(num - 1) else {
                return Vec::new();
            };
            let step = (stop - start) / steps;
            (0..num)
                .map(|i| match F::from(i) {
                    Some(i) if i == steps => stop,
                    Some(i) => start + step * i,
                    None => F::nan(),
                })
                .collect()
        }
    }
}

/// Return `num` samples spaced evenly on a log scale from `start` to `stop`
/// inclusive.
///
/// Unlike `numpy.logspace` the bounds are the frequencies themselves rather
/// than their exponents, i.e. this is `10 ** linspace(log10(start), log10(stop))`.
/// Both bounds must be positive for the result to be finite.
///
/// ```
/// use approx::assert_relative_eq;
/// use eelab_core::num_rs::logspace;
///
/// let f = logspace(1.0f64, 1000.0, 4);
/// assert_relative_eq!(f[0], 1.0);
/// assert_relative_eq!(f[1], 10.0, max_relative = 1e-12);
/// assert_relative_eq!(f[3], 1000.0);
/// ```
pub fn logspace<F: Float>(start: F, stop: F, num: usize) -> Vec<F> {
    let ten = match F::from(10.0) {
        Some(ten) => ten,
        None => return Vec::new(),
    };
    let mut exps = linspace(start.log10(), stop.log10(), num);
    exps.iter_mut().for_each(|e| *e = ten.powf(*e));
    // Pin the endpoints so round-tripping through log10 cannot drift them.
    if let Some(first) = exps.first_mut() {
        *first = start;
    }
    if num > 1 {
        if let Some(last) = exps.last_mut() {
            *last = stop;
        }
    }
    exps
}

/// Discrete Fourier transform sample frequencies.
///
/// Matches `numpy.fft.fftfreq(n, d)`: `[0, 1, ..., n/2-1, -n/2, ..., -1] / (d*n)`
/// for even `n` and `[0, 1, ..., (n-1)/2, -(n-1)/2, ..., -1] / (d*n)` for odd `n`.
///
/// ```
/// use eelab_core::num_rs::fftfreq;
///
/// assert_eq!(fftfreq(4, 1.0), vec![0.0, 0.25, -0.5, -0.25]);
/// assert_eq!(fftfreq(5, 0.1), vec![0.0, 2.0, 4.0, -4.0, -2.0]);
/// ```
pub fn fftfreq(n: usize, d: f64) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let scale = 1.0 / (d * n as f64);
    let positive = n.div_ceil(2);
    (0..n)
        .map(|k| {
            if k < positive {
                k as f64 * scale
            } else {
                (k as f64 - n as f64) * scale
            }
        })
        .collect()
}
