//! PNG rendering: interpolated surfaces, station markers and boundary
//! outlines. Every image is north-up; raster row 0 lands on the bottom row.

use image::{Rgba, RgbaImage};
use ndarray::Array2;

use isotherm_core::mask::GridTransform;
use isotherm_core::{Bounds, MaskedRaster};

/// Blue → pale yellow → red stops, cold to warm.
const RAMP: [[f64; 3]; 3] = [[49.0, 54.0, 149.0], [255.0, 255.0, 191.0], [165.0, 0.0, 38.0]];

const LAND: Rgba<u8> = Rgba([211, 211, 211, 255]);
const OUTLINE: Rgba<u8> = Rgba([0, 0, 0, 255]);
const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);
const MARKER_ALPHA: f64 = 0.7;

pub fn ramp(t: f64) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0) * (RAMP.len() - 1) as f64;
    let i = (t.floor() as usize).min(RAMP.len() - 2);
    let f = t - i as f64;
    let (a, b) = (RAMP[i], RAMP[i + 1]);
    [0, 1, 2].map(|k| (a[k] + (b[k] - a[k]) * f).round() as u8)
}

#[inline]
fn image_y(row: usize, rows: usize) -> u32 {
    (rows - 1 - row) as u32
}

/// Colour-ramped surface; excluded cells are fully transparent.
pub fn surface(raster: &MaskedRaster) -> RgbaImage {
    let (rows, cols) = raster.shape();
    let (lo, hi) = raster.value_range().unwrap_or((0.0, 1.0));
    let span = if hi > lo { hi - lo } else { 1.0 };

    let mut img = RgbaImage::new(cols as u32, rows as u32);
    for r in 0..rows {
        for c in 0..cols {
            let px = match raster.get(r, c) {
                Some(v) => {
                    let [rv, gv, bv] = ramp((v - lo) / span);
                    Rgba([rv, gv, bv, 255])
                }
                None => CLEAR,
            };
            img.put_pixel(c as u32, image_y(r, rows), px);
        }
    }
    img
}

/// Region in light grey with one translucent disc per station, coloured by
/// its value over the range of `values`.
pub fn scatter(inside: &Array2<bool>, bounds: Bounds, points: &[[f64; 2]], values: &[f64]) -> RgbaImage {
    let (rows, cols) = inside.dim();
    let mut img = RgbaImage::new(cols as u32, rows as u32);
    if rows == 0 || cols == 0 {
        return img;
    }
    for ((r, c), &m) in inside.indexed_iter() {
        if m {
            img.put_pixel(c as u32, image_y(r, rows), LAND);
        }
    }

    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let span = if hi > lo { hi - lo } else { 1.0 };
    let radius = (rows.max(cols) as f64 / 100.0).max(2.0);
    let transform = GridTransform::new(bounds, (rows, cols));

    for (p, &v) in points.iter().zip(values) {
        let [x, y] = transform.to_cell(p[0], p[1]);
        let colour = ramp((v - lo) / span);
        // `as usize` saturates, so discs hanging off an edge clip cleanly.
        let (r0, r1) = ((y - radius).floor().max(0.0) as usize, ((y + radius).ceil() as usize).min(rows));
        let (c0, c1) = ((x - radius).floor().max(0.0) as usize, ((x + radius).ceil() as usize).min(cols));
        for r in r0..r1 {
            for c in c0..c1 {
                let (dx, dy) = (c as f64 + 0.5 - x, r as f64 + 0.5 - y);
                if dx * dx + dy * dy <= radius * radius {
                    blend(img.get_pixel_mut(c as u32, image_y(r, rows)), colour);
                }
            }
        }
    }
    img
}

fn blend(px: &mut Rgba<u8>, [r, g, b]: [u8; 3]) {
    let under = px.0;
    if under[3] == 0 {
        *px = Rgba([r, g, b, (MARKER_ALPHA * 255.0).round() as u8]);
        return;
    }
    let mix = |top: u8, bottom: u8| (MARKER_ALPHA * top as f64 + (1.0 - MARKER_ALPHA) * bottom as f64).round() as u8;
    *px = Rgba([mix(r, under[0]), mix(g, under[1]), mix(b, under[2]), under[3]]);
}

/// Paint `outline` cells black. Shapes must match the image.
pub fn burn_outline(img: &mut RgbaImage, outline: &Array2<bool>) {
    let rows = outline.nrows();
    for ((r, c), &edge) in outline.indexed_iter() {
        if edge {
            img.put_pixel(c as u32, image_y(r, rows), OUTLINE);
        }
    }
}
