use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Interpolated values paired with the boundary mask.
///
/// Cells where `inside` is `false` are excluded: readers must not render or
/// aggregate them, whatever number `data` happens to hold there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskedRaster {
    data: Array2<f64>,
    inside: Array2<bool>,
}

impl MaskedRaster {
    /// Pair `data` with `inside`. Shapes must match.
    pub(crate) fn new(data: Array2<f64>, inside: Array2<bool>) -> Self {
        debug_assert_eq!(data.dim(), inside.dim());
        Self { data, inside }
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Raw values, excluded cells included.
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn inside(&self) -> &Array2<bool> {
        &self.inside
    }

    /// Value at `(row, col)`, or `None` if excluded or out of range.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        match self.inside.get((row, col)) {
            Some(true) => self.data.get((row, col)).copied(),
            _ => None,
        }
    }

    pub fn is_excluded(&self, row: usize, col: usize) -> bool {
        !self.inside.get((row, col)).copied().unwrap_or(false)
    }

    /// Number of in-boundary cells.
    pub fn inside_count(&self) -> usize {
        self.inside.iter().filter(|&&m| m).count()
    }

    /// In-boundary values in row-major order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.data
            .iter()
            .zip(self.inside.iter())
            .filter_map(|(&v, &m)| m.then_some(v))
    }

    /// `(min, max)` over in-boundary cells, or `None` if there are none.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.values().fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// Copy with excluded cells set to NaN.
    pub fn to_filled(&self) -> Array2<f64> {
        let mut out = self.data.clone();
        out.zip_mut_with(&self.inside, |v, &m| {
            if !m {
                *v = f64::NAN;
            }
        });
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample() -> MaskedRaster {
        MaskedRaster::new(
            array![[1.0, 2.0, 9.0], [4.0, f64::NAN, 6.0]],
            array![[true, true, false], [true, false, true]],
        )
    }

    #[test]
    fn excluded_cells_are_hidden() {
        let r = sample();
        assert_eq!(r.get(0, 1), Some(2.0));
        assert_eq!(r.get(0, 2), None);
        assert_eq!(r.get(5, 5), None);
        assert!(r.is_excluded(1, 1));
        assert!(r.is_excluded(7, 0));
        assert!(!r.is_excluded(1, 2));
    }

    #[test]
    fn range_ignores_excluded_values() {
        let r = sample();
        assert_eq!(r.inside_count(), 4);
        assert_eq!(r.values().collect::<Vec<_>>(), vec![1.0, 2.0, 4.0, 6.0]);
        assert_eq!(r.value_range(), Some((1.0, 6.0)));
    }

    #[test]
    fn filled_copy_blanks_excluded_cells() {
        let f = sample().to_filled();
        assert!(f[[0, 2]].is_nan());
        assert_eq!(f[[1, 2]], 6.0);
    }
}
