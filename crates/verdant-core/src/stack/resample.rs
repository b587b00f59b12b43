use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::scene::GridSpec;

/// How rasters whose grid differs from the stack grid are brought onto it.
///
/// Source and target grids are assumed to cover the same footprint; pixel
/// centres are matched proportionally across the two grids.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resampling {
    /// Grids must already match; any difference is an alignment error.
    Strict,
    /// Take the source pixel whose centre is closest.
    #[default]
    Nearest,
    /// Interpolate the four surrounding source pixels. Quality bands are
    /// always resampled with `Nearest`. A target pixel that draws on a fill
    /// or non-finite neighbour becomes NaN.
    Bilinear,
}

impl std::fmt::Display for Resampling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strict => write!(f, "Strict"),
            Self::Nearest => write!(f, "Nearest"),
            Self::Bilinear => write!(f, "Bilinear"),
        }
    }
}

/// Source coordinate of the target pixel centre `dst`, in source pixel units.
fn source_coord(dst: usize, src_len: usize, dst_len: usize) -> f64 {
    (dst as f64 + 0.5) * (src_len as f64 / dst_len as f64) - 0.5
}

/// Nearest-neighbour resampling onto `grid`. `src` must be non-empty.
pub fn resample_nearest(src: &Array2<f32>, grid: GridSpec) -> Array2<f32> {
    let (src_rows, src_cols) = src.dim();
    Array2::from_shape_fn(grid.dim(), |(r, c)| {
        let sy = (source_coord(r, src_rows, grid.rows) + 0.5).floor();
        let sx = (source_coord(c, src_cols, grid.cols) + 0.5).floor();
        let sy = (sy.max(0.0) as usize).min(src_rows - 1);
        let sx = (sx.max(0.0) as usize).min(src_cols - 1);
        src[[sy, sx]]
    })
}

/// Bilinear resampling onto `grid` with edge clamping. `src` must be non-empty.
///
/// Neighbours that are non-finite or equal to `fill` never enter the blend:
/// if any neighbour with non-zero weight is missing, the target pixel is NaN.
pub fn resample_bilinear(src: &Array2<f32>, grid: GridSpec, fill: Option<f32>) -> Array2<f32> {
    let (src_rows, src_cols) = src.dim();
    let max_y = (src_rows - 1) as f64;
    let max_x = (src_cols - 1) as f64;
    let missing = |v: f32| !v.is_finite() || fill == Some(v);

    Array2::from_shape_fn(grid.dim(), |(r, c)| {
        let y = source_coord(r, src_rows, grid.rows).clamp(0.0, max_y);
        let x = source_coord(c, src_cols, grid.cols).clamp(0.0, max_x);
        let y0 = y.floor() as usize;
        let x0 = x.floor() as usize;
        let y1 = (y0 + 1).min(src_rows - 1);
        let x1 = (x0 + 1).min(src_cols - 1);
        let fy = y - y0 as f64;
        let fx = x - x0 as f64;

        let taps = [
            (src[[y0, x0]], (1.0 - fy) * (1.0 - fx)),
            (src[[y0, x1]], (1.0 - fy) * fx),
            (src[[y1, x0]], fy * (1.0 - fx)),
            (src[[y1, x1]], fy * fx),
        ];
        let mut acc = 0.0f64;
        for (v, w) in taps {
            if w == 0.0 {
                continue;
            }
            if missing(v) {
                return f32::NAN;
            }
            acc += v as f64 * w;
        }
        acc as f32
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn nearest_upsample_duplicates_pixels() {
        let src = array![[1.0f32, 2.0], [3.0, 4.0]];
        let out = resample_nearest(&src, GridSpec::new(4, 4));
        assert_eq!(out[[0, 0]], 1.0);
        assert_eq!(out[[1, 1]], 1.0);
        assert_eq!(out[[0, 3]], 2.0);
        assert_eq!(out[[3, 0]], 3.0);
        assert_eq!(out[[3, 3]], 4.0);
    }

    #[test]
    fn bilinear_constant_stays_constant() {
        let src = Array2::from_elem((3, 5), 7.5f32);
        let out = resample_bilinear(&src, GridSpec::new(7, 2), Some(0.0));
        assert!(out.iter().all(|&v| (v - 7.5).abs() < 1e-6));
    }

    #[test]
    fn bilinear_identity_grid_is_exact() {
        let src = array![[0.0f32, 1.0], [2.0, 3.0]];
        let out = resample_bilinear(&src, GridSpec::new(2, 2), None);
        assert_eq!(out, src);
    }

    #[test]
    fn bilinear_never_blends_fill() {
        let src = array![[0.0f32, 100.0, 100.0], [0.0, 100.0, f32::NAN]];
        let out = resample_bilinear(&src, GridSpec::new(2, 6), Some(0.0));
        // Columns 0-2 draw on the fill column.
        assert!(out.row(0).iter().take(3).all(|v| v.is_nan()));
        assert_eq!(out[[0, 3]], 100.0);
        assert_eq!(out[[0, 4]], 100.0);
        // Right edge of row 1 touches the non-finite pixel.
        assert!(out[[1, 5]].is_nan());

        let no_fill = resample_bilinear(&src, GridSpec::new(2, 6), None);
        assert!(no_fill[[0, 2]] > 0.0 && no_fill[[0, 2]] < 100.0);
    }
}
