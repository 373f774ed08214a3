//! # Constituent Sets and Buffer Marshalling
//!
//! A prediction is driven by an ordered set of harmonic constituents. The
//! native entry points take that set as parallel arrays indexed by constituent:
//!
//! - `cid`: `char[ncon][4]` identifiers
//! - `z1Re`: real parts, `float64[ncon]` or `float64[ncon][n]`
//! - `z1Im`: imaginary parts, same shape as `z1Re`
//!
//! Row `i` of every buffer belongs to the `i`-th constituent in insertion
//! order, so the three buffers always line up.

use crate::error::{Otps2Error, Result};
use crate::{Coefficient, ConstituentId};
use ndarray::{Array, Array2, ArrayD, Dimension, Zip};

/// Ordered mapping from constituent identifier to its coefficients.
///
/// Iteration follows insertion order. Inserting an identifier that is already
/// present replaces its value without moving it.
///
/// # Example
/// ```
/// use otps2_lib::{Coefficient, ConstituentSet};
///
/// let mut set = ConstituentSet::new();
/// set.insert_named("M2", Coefficient::new(1.0, 0.0)).unwrap();
/// set.insert_named("S2", Coefficient::new(0.5, 0.1)).unwrap();
/// set.insert_named("M2", Coefficient::new(2.0, 0.0)).unwrap();
///
/// let names: Vec<_> = set.ids().map(|id| id.name()).collect();
/// assert_eq!(names, ["M2", "S2"]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ConstituentSet<T> {
    entries: Vec<(ConstituentId, T)>,
}

impl<T> Default for ConstituentSet<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> ConstituentSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert or replace; returns the previous value for `id`, if any.
    pub fn insert(&mut self, id: ConstituentId, value: T) -> Option<T> {
        match self.entries.iter_mut().find(|(existing, _)| *existing == id) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((id, value));
                None
            }
        }
    }

    /// Insert by name, validating it as a [`ConstituentId`] first.
    pub fn insert_named(&mut self, name: &str, value: T) -> Result<Option<T>> {
        Ok(self.insert(ConstituentId::new(name)?, value))
    }

    /// Build a set from `(name, value)` pairs in order.
    pub fn try_from_named<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for (name, value) in pairs {
            set.insert_named(name.as_ref(), value)?;
        }
        Ok(set)
    }

    pub fn get(&self, id: &ConstituentId) -> Option<&T> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, id: &ConstituentId) -> bool {
        self.get(id).is_some()
    }

    /// Number of constituents (`ncon`)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ConstituentId, &T)> {
        self.entries.iter().map(|(id, value)| (id, value))
    }

    pub fn ids(&self) -> impl Iterator<Item = &ConstituentId> {
        self.entries.iter().map(|(id, _)| id)
    }

    /// The `char[ncon][4]` identifier buffer.
    pub fn id_buffer(&self) -> Vec<ConstituentId> {
        self.ids().copied().collect()
    }
}

impl<T> FromIterator<(ConstituentId, T)> for ConstituentSet<T> {
    fn from_iter<I: IntoIterator<Item = (ConstituentId, T)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (id, value) in iter {
            set.insert(id, value);
        }
        set
    }
}

/// Buffers for the single-location entry point.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarBuffers {
    pub cid: Vec<ConstituentId>,
    pub z1_re: Vec<f64>,
    pub z1_im: Vec<f64>,
}

impl ConstituentSet<Coefficient> {
    /// Split the set into `cid`, `z1Re` and `z1Im`.
    pub fn to_buffers(&self) -> ScalarBuffers {
        let ncon = self.len();
        let mut buffers = ScalarBuffers {
            cid: Vec::with_capacity(ncon),
            z1_re: Vec::with_capacity(ncon),
            z1_im: Vec::with_capacity(ncon),
        };
        for (id, z) in self.iter() {
            buffers.cid.push(*id);
            buffers.z1_re.push(z.re);
            buffers.z1_im.push(z.im);
        }
        buffers
    }
}

/// Real and imaginary coefficient grids of one constituent over a set of
/// locations. Both grids must have the shape of the latitude array they are
/// predicted against.
#[derive(Clone, Debug, PartialEq)]
pub struct GridCoefficient {
    pub re: ArrayD<f64>,
    pub im: ArrayD<f64>,
}

impl GridCoefficient {
    pub fn new<D: Dimension>(re: Array<f64, D>, im: Array<f64, D>) -> Self {
        Self {
            re: re.into_dyn(),
            im: im.into_dyn(),
        }
    }

    /// Build from amplitude and phase (degrees) grids of the same shape.
    pub fn from_amplitude_phase<D: Dimension>(
        amplitude: &Array<f64, D>,
        phase_deg: &Array<f64, D>,
    ) -> Result<Self> {
        if amplitude.shape() != phase_deg.shape() {
            return Err(Otps2Error::ShapeMismatch {
                constituent: "<amplitude/phase>".to_string(),
                part: "phase",
                expected: amplitude.shape().to_vec(),
                found: phase_deg.shape().to_vec(),
            });
        }
        let z = Zip::from(amplitude)
            .and(phase_deg)
            .map_collect(|&a, &p| Coefficient::from_amplitude_phase(a, p));
        Ok(Self {
            re: z.map(|c| c.re).into_dyn(),
            im: z.map(|c| c.im).into_dyn(),
        })
    }

    pub fn shape(&self) -> &[usize] {
        self.re.shape()
    }
}

/// Buffers for the gridded entry point, each `(ncon, n)` in standard layout.
#[derive(Clone, Debug, PartialEq)]
pub struct GridBuffers {
    pub cid: Vec<ConstituentId>,
    pub z1_re: Array2<f64>,
    pub z1_im: Array2<f64>,
}

impl ConstituentSet<GridCoefficient> {
    /// Check every grid against the latitude shape.
    pub fn check_shapes(&self, shape: &[usize]) -> Result<()> {
        for (id, z) in self.iter() {
            for (part, grid) in [("real", &z.re), ("imaginary", &z.im)] {
                if grid.shape() != shape {
                    return Err(Otps2Error::ShapeMismatch {
                        constituent: id.to_string(),
                        part,
                        expected: shape.to_vec(),
                        found: grid.shape().to_vec(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Flatten the set into `(ncon, n)` buffers for locations of `shape`.
    ///
    /// Grids are read in logical row-major order, whatever their memory
    /// layout, so row `i` column `j` is constituent `i` at flat location `j`.
    pub fn to_grid_buffers(&self, shape: &[usize]) -> Result<GridBuffers> {
        self.check_shapes(shape)?;

        let n: usize = shape.iter().product();
        let ncon = self.len();
        let mut z1_re = Array2::<f64>::zeros((ncon, n));
        let mut z1_im = Array2::<f64>::zeros((ncon, n));

        for (i, (_, z)) in self.iter().enumerate() {
            for (dst, src) in z1_re.row_mut(i).iter_mut().zip(z.re.iter()) {
                *dst = *src;
            }
            for (dst, src) in z1_im.row_mut(i).iter_mut().zip(z.im.iter()) {
                *dst = *src;
            }
        }

        Ok(GridBuffers {
            cid: self.id_buffer(),
            z1_re,
            z1_im,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};

    fn id(name: &str) -> ConstituentId {
        ConstituentId::new(name).unwrap()
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let set = ConstituentSet::try_from_named([
            ("O1", Coefficient::new(0.1, 0.0)),
            ("M2", Coefficient::new(1.0, 0.0)),
            ("K1", Coefficient::new(0.2, 0.0)),
        ])
        .unwrap();
        let names: Vec<_> = set.ids().map(|id| id.name()).collect();
        assert_eq!(names, ["O1", "M2", "K1"]);
    }

    #[test]
    fn test_reinsert_replaces_in_place() {
        let mut set = ConstituentSet::new();
        set.insert(id("M2"), 1.0);
        set.insert(id("S2"), 2.0);
        let previous = set.insert(id("M2"), 3.0);

        assert_eq!(previous, Some(1.0));
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().next(), Some((&id("M2"), &3.0)));
    }

    #[test]
    fn test_invalid_name_is_rejected_on_insert() {
        let mut set = ConstituentSet::new();
        let err = set.insert_named("SIGMA1", Coefficient::default()).unwrap_err();
        assert!(matches!(err, Otps2Error::InvalidConstituentId { .. }));
        assert!(set.is_empty());
    }

    #[test]
    fn test_scalar_buffers_line_up() {
        let set = ConstituentSet::try_from_named([
            ("M2", Coefficient::new(1.0, -1.0)),
            ("S2", Coefficient::new(2.0, -2.0)),
            ("N2", Coefficient::new(3.0, -3.0)),
        ])
        .unwrap();
        let buffers = set.to_buffers();

        assert_eq!(buffers.cid, vec![id("M2"), id("S2"), id("N2")]);
        assert_eq!(buffers.z1_re, vec![1.0, 2.0, 3.0]);
        assert_eq!(buffers.z1_im, vec![-1.0, -2.0, -3.0]);
    }

    #[test]
    fn test_grid_buffers_are_row_per_constituent() {
        let mut set = ConstituentSet::new();
        set.insert(
            id("M2"),
            GridCoefficient::new(array![[1.0, 2.0], [3.0, 4.0]], array![[-1.0, -2.0], [-3.0, -4.0]]),
        );
        set.insert(
            id("K1"),
            GridCoefficient::new(array![[5.0, 6.0], [7.0, 8.0]], array![[0.0, 0.0], [0.0, 0.5]]),
        );

        let buffers = set.to_grid_buffers(&[2, 2]).unwrap();
        assert_eq!(buffers.z1_re, array![[1.0, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, 8.0]]);
        assert_eq!(buffers.z1_im, array![[-1.0, -2.0, -3.0, -4.0], [0.0, 0.0, 0.0, 0.5]]);
        assert!(buffers.z1_re.is_standard_layout());
    }

    #[test]
    fn test_grid_buffers_read_transposed_grids_logically() {
        let re = array![[1.0, 3.0], [2.0, 4.0]].reversed_axes();
        assert!(!re.is_standard_layout());

        let mut set = ConstituentSet::new();
        set.insert(id("M2"), GridCoefficient::new(re, Array2::zeros((2, 2))));

        let buffers = set.to_grid_buffers(&[2, 2]).unwrap();
        assert_eq!(buffers.z1_re.row(0).to_vec(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_grid_shape_mismatch_names_constituent() {
        let mut set = ConstituentSet::new();
        set.insert(
            id("M2"),
            GridCoefficient::new(Array1::zeros(3), Array1::zeros(4)),
        );

        match set.to_grid_buffers(&[3]).unwrap_err() {
            Otps2Error::ShapeMismatch {
                constituent,
                part,
                expected,
                found,
            } => {
                assert_eq!(constituent, "M2");
                assert_eq!(part, "imaginary");
                assert_eq!(expected, vec![3]);
                assert_eq!(found, vec![4]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_grid_from_amplitude_phase() {
        let z = GridCoefficient::from_amplitude_phase(&array![1.0, 2.0], &array![0.0, 180.0])
            .unwrap();
        assert!((z.re[[0]] - 1.0).abs() < 1e-12);
        assert!((z.re[[1]] + 2.0).abs() < 1e-12);
        assert!(z.im[[0]].abs() < 1e-12);

        let err = GridCoefficient::from_amplitude_phase(&array![1.0, 2.0], &array![0.0])
            .unwrap_err();
        assert!(matches!(err, Otps2Error::ShapeMismatch { .. }));
    }
}
