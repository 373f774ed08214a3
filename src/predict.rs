//! # Tide Prediction Calls
//!
//! The two public operations. Each one validates its inputs, builds the
//! native buffers, hands them to a [`TideKernel`] and shapes the filled
//! result buffer into an `ndarray` array.
//!
//! The `*_with` variants take the kernel explicitly; [`predict_tide`] and
//! [`predict_tide_2d`] use the process-wide [`Otps2Library::global`].

use crate::constituents::{ConstituentSet, GridCoefficient};
use crate::error::{Otps2Error, Result};
use crate::kernel::TideKernel;
use crate::native::Otps2Library;
use crate::time_grid::TimeGrid;
use crate::Coefficient;
use chrono::NaiveDateTime;
use ndarray::{Array1, Array2, ArrayBase, ArrayD, Data, Dimension, IxDyn};
use tracing::debug;

/// Predict a tide height series at one location.
///
/// Returns `ntime` heights, the `i`-th at `start_time + i * delta_time`
/// seconds. Heights are in the units of the coefficients.
pub fn predict_tide_with<K: TideKernel + ?Sized>(
    kernel: &K,
    components: &ConstituentSet<Coefficient>,
    latitude: f64,
    start_time: NaiveDateTime,
    ntime: usize,
    delta_time: f64,
) -> Result<Array1<f64>> {
    let grid = TimeGrid::new(start_time, ntime, delta_time)?;
    let times = grid.days()?;
    let buffers = components.to_buffers();
    debug!(
        ncon = components.len(),
        ntime,
        first_day = times[0],
        "predicting tide at one location"
    );

    let mut result = vec![0.0; ntime];
    kernel.predict_tide(
        &buffers.cid,
        &buffers.z1_re,
        &buffers.z1_im,
        latitude,
        &times,
        &mut result,
    )?;
    Ok(Array1::from(result))
}

/// Predict tide height series at every location of `latitude`.
///
/// Each constituent's real and imaginary grids must have exactly the shape of
/// `latitude`; this is checked before the kernel is called. The result has
/// shape `(ntime,) + latitude.shape()`: the leading axis is time and the rest
/// mirrors the latitude array. A rank-0 latitude gives a result of shape
/// `(ntime,)`.
pub fn predict_tide_2d_with<K, S, D>(
    kernel: &K,
    components: &ConstituentSet<GridCoefficient>,
    latitude: &ArrayBase<S, D>,
    start_time: NaiveDateTime,
    ntime: usize,
    delta_time: f64,
) -> Result<ArrayD<f64>>
where
    K: TideKernel + ?Sized,
    S: Data<Elem = f64>,
    D: Dimension,
{
    let shape = latitude.shape();
    let buffers = components.to_grid_buffers(shape)?;
    let grid = TimeGrid::new(start_time, ntime, delta_time)?;
    let times = grid.days()?;

    let latitudes: Vec<f64> = latitude.iter().copied().collect();
    let n = latitudes.len();
    debug!(
        ncon = components.len(),
        n,
        ntime,
        shape = ?shape,
        "predicting tide on a grid"
    );

    let mut result = Array2::<f64>::zeros((ntime, n));
    kernel.predict_tide_2d(
        &buffers.cid,
        buffers.z1_re.view(),
        buffers.z1_im.view(),
        &latitudes,
        &times,
        result.view_mut(),
    )?;

    let mut out_shape = Vec::with_capacity(shape.len() + 1);
    out_shape.push(ntime);
    out_shape.extend_from_slice(shape);
    result
        .into_shape(IxDyn(&out_shape))
        .map_err(|_| Otps2Error::BufferLength {
            buffer: "result",
            expected: out_shape.iter().product(),
            found: ntime * n,
        })
}

/// [`predict_tide_with`] on the process-wide OTPS2 library.
///
/// Loads the library on first use and exits the process if it cannot be found
/// or loaded.
pub fn predict_tide(
    components: &ConstituentSet<Coefficient>,
    latitude: f64,
    start_time: NaiveDateTime,
    ntime: usize,
    delta_time: f64,
) -> Result<Array1<f64>> {
    predict_tide_with(
        Otps2Library::global(),
        components,
        latitude,
        start_time,
        ntime,
        delta_time,
    )
}

/// [`predict_tide_2d_with`] on the process-wide OTPS2 library.
///
/// Loads the library on first use and exits the process if it cannot be found
/// or loaded.
pub fn predict_tide_2d<S, D>(
    components: &ConstituentSet<GridCoefficient>,
    latitude: &ArrayBase<S, D>,
    start_time: NaiveDateTime,
    ntime: usize,
    delta_time: f64,
) -> Result<ArrayD<f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    predict_tide_2d_with(
        Otps2Library::global(),
        components,
        latitude,
        start_time,
        ntime,
        delta_time,
    )
}
