//! Separable Gaussian blur over a 2-D raster.
//!
//! Kernel weights are `exp(-x² / 2σ²)` for `|x| ≤ ⌊truncate·σ + 0.5⌋`,
//! normalised to sum to one. Samples past the edge are mirrored with the
//! edge cell repeated (`d c b a | a b c d | d c b a`).

use ndarray::{Array2, ArrayViewMut1, Axis};

/// Normalised 1-D Gaussian weights, centre at index `radius`.
pub fn gaussian_kernel(sigma: f64, truncate: f64) -> Vec<f64> {
    let radius = (truncate * sigma + 0.5) as usize;
    let inv = -0.5 / (sigma * sigma);
    let mut weights: Vec<f64> = (0..=2 * radius)
        .map(|i| {
            let x = i as f64 - radius as f64;
            (inv * x * x).exp()
        })
        .collect();
    let sum: f64 = weights.iter().sum();
    weights.iter_mut().for_each(|w| *w /= sum);
    weights
}

/// Mirror index `i` into `0..n` with edge repetition.
#[inline]
fn reflect(i: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = i.rem_euclid(period) as usize;
    if m >= n {
        2 * n - 1 - m
    } else {
        m
    }
}

fn convolve_lane(mut lane: ArrayViewMut1<f64>, kernel: &[f64], scratch: &mut Vec<f64>) {
    let n = lane.len();
    if n == 0 {
        return;
    }
    let radius = (kernel.len() / 2) as isize;
    scratch.clear();
    scratch.extend(lane.iter().copied());
    for i in 0..n {
        lane[i] = kernel
            .iter()
            .enumerate()
            .map(|(k, w)| w * scratch[reflect(i as isize + k as isize - radius, n)])
            .sum();
    }
}

/// Blur `input` along both axes. NaN propagates; callers fill it first.
pub fn gaussian_filter(input: &Array2<f64>, sigma: f64, truncate: f64) -> Array2<f64> {
    let kernel = gaussian_kernel(sigma, truncate);
    let mut out = input.clone();
    let mut scratch = Vec::new();
    for axis in [Axis(0), Axis(1)] {
        for lane in out.lanes_mut(axis) {
            convolve_lane(lane, &kernel, &mut scratch);
        }
    }
    out
}

/// Mean of the finite cells, or `None` when there are none.
pub fn finite_mean(input: &Array2<f64>) -> Option<f64> {
    let (sum, count) = input
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, n), &v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}
