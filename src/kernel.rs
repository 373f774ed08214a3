//! # Prediction Kernel Seam
//!
//! [`TideKernel`] is the boundary between marshalling and the code that
//! actually synthesises tide heights. The production implementation is
//! [`crate::native::Otps2Library`], which forwards the buffers to the shared
//! library; tests plug in stubs that record what they were handed.
//!
//! Every buffer is passed exactly as the native ABI lays it out. The dimension
//! helpers in this module check lengths, contiguity and `int` ranges so an
//! implementation can cross into `unsafe` code knowing the buffers agree with
//! the counts it passes along.

use crate::error::{Otps2Error, Result};
use crate::ConstituentId;
use ndarray::{ArrayView2, ArrayViewMut2};
use std::os::raw::c_int;

/// The two OTPS2 entry points over Rust buffers.
pub trait TideKernel {
    /// Single location: fill `result[ntime]` from `ncon` constituents.
    ///
    /// `cid`, `z1_re` and `z1_im` have one entry per constituent; `result` has
    /// the length of `times`.
    fn predict_tide(
        &self,
        cid: &[ConstituentId],
        z1_re: &[f64],
        z1_im: &[f64],
        latitude: f64,
        times: &[f64],
        result: &mut [f64],
    ) -> Result<()>;

    /// `n` locations: fill `result[ntime][n]` from `(ncon, n)` coefficients.
    fn predict_tide_2d(
        &self,
        cid: &[ConstituentId],
        z1_re: ArrayView2<'_, f64>,
        z1_im: ArrayView2<'_, f64>,
        latitude: &[f64],
        times: &[f64],
        result: ArrayViewMut2<'_, f64>,
    ) -> Result<()>;
}

impl<K: TideKernel + ?Sized> TideKernel for &K {
    fn predict_tide(
        &self,
        cid: &[ConstituentId],
        z1_re: &[f64],
        z1_im: &[f64],
        latitude: f64,
        times: &[f64],
        result: &mut [f64],
    ) -> Result<()> {
        (**self).predict_tide(cid, z1_re, z1_im, latitude, times, result)
    }

    fn predict_tide_2d(
        &self,
        cid: &[ConstituentId],
        z1_re: ArrayView2<'_, f64>,
        z1_im: ArrayView2<'_, f64>,
        latitude: &[f64],
        times: &[f64],
        result: ArrayViewMut2<'_, f64>,
    ) -> Result<()> {
        (**self).predict_tide_2d(cid, z1_re, z1_im, latitude, times, result)
    }
}

/// Native counts for the single-location call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScalarDims {
    pub ncon: c_int,
    pub ntime: c_int,
}

/// Native counts for the gridded call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridDims {
    pub n: c_int,
    pub ncon: c_int,
    pub ntime: c_int,
}

/// Convert a count to the native `int`.
pub fn native_int(what: &'static str, value: usize) -> Result<c_int> {
    c_int::try_from(value).map_err(|_| Otps2Error::CountOverflow { what, value })
}

fn check_len(buffer: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(Otps2Error::BufferLength {
            buffer,
            expected,
            found,
        });
    }
    Ok(())
}

fn check_coefficients(
    name: &'static str,
    view: &ArrayView2<'_, f64>,
    ncon: usize,
    n: usize,
) -> Result<()> {
    check_len(name, ncon, view.nrows())?;
    check_len(name, n, view.ncols())?;
    if !view.is_standard_layout() {
        return Err(Otps2Error::NonContiguous(name));
    }
    Ok(())
}

/// Validate the single-location buffers against each other.
pub fn scalar_dims(
    cid: &[ConstituentId],
    z1_re: &[f64],
    z1_im: &[f64],
    times: &[f64],
    result: &[f64],
) -> Result<ScalarDims> {
    let ncon = cid.len();
    check_len("z1Re", ncon, z1_re.len())?;
    check_len("z1Im", ncon, z1_im.len())?;
    check_len("result", times.len(), result.len())?;

    Ok(ScalarDims {
        ncon: native_int("ncon", ncon)?,
        ntime: native_int("ntime", times.len())?,
    })
}

/// Validate the gridded buffers against each other, including row-major
/// contiguity of the two-dimensional views.
pub fn grid_dims(
    cid: &[ConstituentId],
    z1_re: &ArrayView2<'_, f64>,
    z1_im: &ArrayView2<'_, f64>,
    latitude: &[f64],
    times: &[f64],
    result: &ArrayViewMut2<'_, f64>,
) -> Result<GridDims> {
    let ncon = cid.len();
    let n = latitude.len();

    check_coefficients("z1Re", z1_re, ncon, n)?;
    check_coefficients("z1Im", z1_im, ncon, n)?;
    check_len("result", times.len(), result.nrows())?;
    check_len("result", n, result.ncols())?;
    if !result.is_standard_layout() {
        return Err(Otps2Error::NonContiguous("result"));
    }

    Ok(GridDims {
        n: native_int("n", n)?,
        ncon: native_int("ncon", ncon)?,
        ntime: native_int("ntime", times.len())?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn cids(n: usize) -> Vec<ConstituentId> {
        ["M2", "S2", "N2", "K1"][..n]
            .iter()
            .map(|name| ConstituentId::new(name).unwrap())
            .collect()
    }

    #[test]
    fn test_scalar_dims_accepts_consistent_buffers() {
        let dims = scalar_dims(&cids(2), &[1.0, 2.0], &[0.0, 0.0], &[0.0; 5], &[0.0; 5]).unwrap();
        assert_eq!(dims, ScalarDims { ncon: 2, ntime: 5 });
    }

    #[test]
    fn test_scalar_dims_rejects_ragged_coefficients() {
        let err = scalar_dims(&cids(2), &[1.0], &[0.0, 0.0], &[0.0], &[0.0]).unwrap_err();
        assert!(matches!(
            err,
            Otps2Error::BufferLength {
                buffer: "z1Re",
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn test_scalar_dims_rejects_short_result() {
        let err = scalar_dims(&cids(1), &[1.0], &[0.0], &[0.0; 3], &[0.0; 2]).unwrap_err();
        assert!(matches!(err, Otps2Error::BufferLength { buffer: "result", .. }));
    }

    #[test]
    fn test_grid_dims_checks_layout() {
        let re = Array2::<f64>::zeros((2, 3));
        let im = Array2::<f64>::zeros((3, 2));
        let mut result = Array2::<f64>::zeros((4, 3));

        let dims = grid_dims(
            &cids(2),
            &re.view(),
            &re.view(),
            &[0.0; 3],
            &[0.0; 4],
            &result.view_mut(),
        )
        .unwrap();
        assert_eq!(dims, GridDims { n: 3, ncon: 2, ntime: 4 });

        // Right shape, wrong memory order
        let err = grid_dims(
            &cids(2),
            &re.view(),
            &im.t(),
            &[0.0; 3],
            &[0.0; 4],
            &result.view_mut(),
        )
        .unwrap_err();
        assert!(matches!(err, Otps2Error::NonContiguous("z1Im")));
    }

    #[test]
    fn test_grid_dims_accepts_views_of_separate_arrays() {
        let re = Array2::<f64>::ones((1, 2));
        let mut result = Array2::<f64>::zeros((3, 2));

        let dims = {
            let im = Array2::<f64>::zeros((1, 2));
            grid_dims(
                &cids(1),
                &re.view(),
                &im.view(),
                &[10.0, 20.0],
                &[0.0; 3],
                &result.view_mut(),
            )
            .unwrap()
        };
        assert_eq!(dims, GridDims { n: 2, ncon: 1, ntime: 3 });

        let short = Array2::<f64>::zeros((1, 1));
        let err = grid_dims(
            &cids(1),
            &re.view(),
            &short.view(),
            &[10.0, 20.0],
            &[0.0; 3],
            &result.view_mut(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Otps2Error::BufferLength {
                buffer: "z1Im",
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn test_native_int_range() {
        assert_eq!(native_int("n", 7).unwrap(), 7);
        assert!(matches!(
            native_int("n", c_int::MAX as usize + 1),
            Err(Otps2Error::CountOverflow { what: "n", .. })
        ));
    }
}
