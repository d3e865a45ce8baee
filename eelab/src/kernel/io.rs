use super::ConfigError;
use crate::signal::Signal;
use ndarray::{Array1, ArrayView1, ArrayViewMut1};

/// Adapter trait for reading contiguous 1D input.
pub trait Read1D<T> {
    /// Borrow the underlying input as a contiguous slice.
    fn read_slice(&self) -> Result<&[T], ConfigError>;
}

/// Adapter trait for writing contiguous 1D output.
pub trait Write1D<T> {
    /// Borrow the underlying output as a mutable contiguous slice.
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError>;
}

impl<T> Read1D<T> for [T] {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        Ok(self)
    }
}

impl<T> Write1D<T> for [T] {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        Ok(self)
    }
}

impl<T, const N: usize> Read1D<T> for [T; N] {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        Ok(self)
    }
}

impl<T, const N: usize> Write1D<T> for [T; N] {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        Ok(self)
    }
}

impl<T> Read1D<T> for Vec<T> {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        Ok(self.as_slice())
    }
}

impl<T> Write1D<T> for Vec<T> {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        Ok(self.as_mut_slice())
    }
}

impl<T> Read1D<T> for Array1<T> {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        self.as_slice()
            .ok_or(ConfigError::NonContiguous { arg: "array" })
    }
}

impl<T> Write1D<T> for Array1<T> {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        self.as_slice_mut()
            .ok_or(ConfigError::NonContiguous { arg: "array" })
    }
}

impl<T> Read1D<T> for ArrayView1<'_, T> {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        self.as_slice()
            .ok_or(ConfigError::NonContiguous { arg: "array_view" })
    }
}

impl<T> Write1D<T> for ArrayViewMut1<'_, T> {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        self.as_slice_mut().ok_or(ConfigError::NonContiguous {
            arg: "array_view_mut",
        })
    }
}

impl Read1D<f64> for Signal {
    fn read_slice(&self) -> Result<&[f64], ConfigError> {
        Ok(self.samples())
    }
}

/// Borrow a non-empty input slice.
pub(crate) fn read_nonempty<'a, T, I>(
    input: &'a I,
    arg: &'static str,
) -> Result<&'a [T], ConfigError>
where
    I: Read1D<T> + ?Sized,
{
    let slice = input.read_slice()?;
    if slice.is_empty() {
        return Err(ConfigError::EmptyInput { arg });
    }
    Ok(slice)
}

#[cfg(test)]
mod tests {
    use super::{read_nonempty, ConfigError, Read1D, Write1D};
    use ndarray::{s, Array1};

    #[test]
    fn slice_and_array_adapters() {
        let a = [1.0f64, 2.0, 3.0];
        assert_eq!(a.read_slice().expect("array adapter").len(), 3);

        let s: &[f64] = &a;
        assert_eq!(s.read_slice().expect("slice adapter")[1], 2.0);
    }

    #[test]
    fn vec_write_adapter() {
        let mut out = vec![0.0f64; 4];
        let slice = out.write_slice_mut().expect("vec write adapter");
        slice.copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(out, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn ndarray_adapters() {
        let arr = Array1::from(vec![1.0f64, 2.0, 3.0, 4.0]);
        assert_eq!(arr.read_slice().expect("array1 read")[2], 3.0);

        let strided = arr.slice(s![..;2]);
        assert_eq!(
            strided.read_slice(),
            Err(ConfigError::NonContiguous { arg: "array_view" })
        );
    }

    #[test]
    fn empty_input_is_rejected() {
        let empty: Vec<f64> = Vec::new();
        assert_eq!(
            read_nonempty(&empty, "signal"),
            Err(ConfigError::EmptyInput { arg: "signal" })
        );
    }
}
