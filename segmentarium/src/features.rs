use common::plane::Plane;
use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::color::ChannelTriple;
use crate::error::{Error, Result};

pub const HISTOGRAM_BINS: usize = 9;
pub const HISTOGRAM_BIN_WIDTH: f64 = 40.0;

/// Per-patch feature record. The position of a record in the extracted
/// sequence is the node id the graph stage uses; reordering the
/// sequence breaks that mapping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatchFeature {
    pub y: f64,
    pub cb: f64,
    pub cr: f64,
    /// Patch centroid in the original pixel frame, `x` = row, `y` = col.
    pub pos: DVec2,
    pub entropy: f64,
}

/// Which values the orientation histogram bins.
///
/// The original formulation computes a gradient-angle map per patch but
/// then bins the raw luma block instead. `Luma` reproduces that
/// behavior and is the default; `GradientAngle` bins the angle map the
/// gradient pass actually produces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistogramSource {
    #[default]
    Luma,
    GradientAngle,
}

/// Tiles the channel planes into non-overlapping `patch_size x patch_size`
/// blocks and computes one `PatchFeature` per block, in row-major tile
/// order (tile row outermost).
pub fn extract(
    channels: &ChannelTriple,
    patch_size: usize,
    source: HistogramSource,
) -> Result<Vec<PatchFeature>> {
    if patch_size == 0 {
        return Err(Error::InvalidShape("patch size must be positive".into()));
    }
    for extent in [channels.rows(), channels.cols()] {
        if extent % patch_size != 0 {
            return Err(Error::NonDivisiblePatchSize { extent, patch_size });
        }
    }

    let tile_rows = channels.rows() / patch_size;
    let tile_cols = channels.cols() / patch_size;
    let mut features = Vec::with_capacity(tile_rows * tile_cols);

    for i in 0..tile_rows {
        for j in 0..tile_cols {
            let row0 = i * patch_size;
            let col0 = j * patch_size;

            let y = channels.y.block_mean(row0, col0, patch_size);
            let cb = channels.cb.block_mean(row0, col0, patch_size);
            let cr = channels.cr.block_mean(row0, col0, patch_size);

            // Midpoint of the tile's bounding box in absolute pixels.
            let pos = DVec2::new(
                (row0 + row0 + patch_size) as f64 / 2.0,
                (col0 + col0 + patch_size) as f64 / 2.0,
            );

            let luma_block = block(&channels.y, row0, col0, patch_size);
            let entropy = orientation_entropy(&luma_block, source);

            features.push(PatchFeature {
                y,
                cb,
                cr,
                pos,
                entropy,
            });
        }
    }

    Ok(features)
}

/// Log-weighted orientation-histogram entropy of one luma block.
///
/// Gradients come from 3x3 row/column difference kernels convolved in
/// "valid" mode, so the angle map is slightly smaller than the block.
/// Bins partition [0, 360) into nine 40-degree buckets counted over
/// `(low, high]`.
pub fn orientation_entropy(luma_block: &Plane<f64>, source: HistogramSource) -> f64 {
    // Column-direction and row-direction difference kernels.
    let kern_col = [[-1.0, 0.0, 1.0], [-1.0, 0.0, 1.0], [-1.0, 0.0, 1.0]];
    let kern_row = [[-1.0, -1.0, -1.0], [0.0, 0.0, 0.0], [1.0, 1.0, 1.0]];

    let gx = convolve3_valid(luma_block, &kern_col);
    let gy = convolve3_valid(luma_block, &kern_row);

    let angles: Vec<f64> = gx
        .iter()
        .zip(gy.iter())
        .map(|(&x, &y)| 180.0 + 180.0 * y.atan2(x) / std::f64::consts::PI)
        .collect();

    let samples: &[f64] = match source {
        HistogramSource::Luma => luma_block.values(),
        HistogramSource::GradientAngle => &angles,
    };

    let mut hist = [0.0f64; HISTOGRAM_BINS];
    let mut high = 0.0;
    for bin in hist.iter_mut() {
        let low = high;
        high += HISTOGRAM_BIN_WIDTH;
        *bin = samples.iter().filter(|&&v| v > low && v <= high).count() as f64;
    }

    // Empty bins count as one so the log term vanishes instead of
    // blowing up; a fully degenerate histogram yields zero entropy.
    for bin in hist.iter_mut() {
        if *bin == 0.0 {
            *bin = 1.0;
        }
    }

    hist.iter().map(|&h| h * h.ln()).sum()
}

/// Copies the `size x size` block at `(row0, col0)` out of a plane.
fn block(plane: &Plane<f64>, row0: usize, col0: usize, size: usize) -> Plane<f64> {
    let mut values = Vec::with_capacity(size * size);
    for r in row0..row0 + size {
        values.extend_from_slice(&plane.row(r)[col0..col0 + size]);
    }
    Plane::new(size, size, values)
}

/// 2-D convolution of a plane with a 3x3 kernel, valid mode: the output
/// shrinks by two in each extent and is empty for planes smaller than
/// the kernel. Proper convolution, so the kernel is flipped.
fn convolve3_valid(plane: &Plane<f64>, kernel: &[[f64; 3]; 3]) -> Plane<f64> {
    if plane.rows() < 3 || plane.cols() < 3 {
        return Plane::new(0, 0, Vec::new());
    }

    let out_rows = plane.rows() - 2;
    let out_cols = plane.cols() - 2;
    let mut values = Vec::with_capacity(out_rows * out_cols);

    for r in 0..out_rows {
        for c in 0..out_cols {
            let mut acc = 0.0;
            for (u, kernel_row) in kernel.iter().enumerate() {
                for (v, &k) in kernel_row.iter().enumerate() {
                    acc += k * plane[(r + 2 - u, c + 2 - v)];
                }
            }
            values.push(acc);
        }
    }

    Plane::new(out_rows, out_cols, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::float_ext::FloatExt;
    use common::plane::Plane;

    fn constant_channels(rows: usize, cols: usize, y: f64, cb: f64, cr: f64) -> ChannelTriple {
        ChannelTriple {
            y: Plane::new_filled(rows, cols, y),
            cb: Plane::new_filled(rows, cols, cb),
            cr: Plane::new_filled(rows, cols, cr),
        }
    }

    #[test]
    fn patch_count_invariant() -> anyhow::Result<()> {
        let channels = constant_channels(16, 24, 93.0, 28.0, 128.0);
        let features = extract(&channels, 8, HistogramSource::Luma)?;
        assert_eq!(features.len(), (16 / 8) * (24 / 8));
        Ok(())
    }

    #[test]
    fn tiles_are_row_major_and_means_match() -> anyhow::Result<()> {
        // 4x4 plane, 2x2 tiles; each tile filled with a distinct value.
        #[rustfmt::skip]
        let y = Plane::new(4, 4, vec![
            10.0, 10.0, 20.0, 20.0,
            10.0, 10.0, 20.0, 20.0,
            30.0, 30.0, 40.0, 40.0,
            30.0, 30.0, 40.0, 40.0,
        ]);
        let channels = ChannelTriple {
            y,
            cb: Plane::new_filled(4, 4, 0.0),
            cr: Plane::new_filled(4, 4, 0.0),
        };

        let features = extract(&channels, 2, HistogramSource::Luma)?;
        let means: Vec<f64> = features.iter().map(|f| f.y).collect();
        assert_eq!(means, vec![10.0, 20.0, 30.0, 40.0]);
        Ok(())
    }

    #[test]
    fn centroids_are_in_the_pixel_frame() -> anyhow::Result<()> {
        let channels = constant_channels(16, 8, 0.0, 0.0, 0.0);
        let features = extract(&channels, 8, HistogramSource::Luma)?;

        assert_eq!(features.len(), 2);
        assert_eq!(features[0].pos, glam::DVec2::new(4.0, 4.0));
        assert_eq!(features[1].pos, glam::DVec2::new(12.0, 4.0));
        Ok(())
    }

    #[test]
    fn non_divisible_extent_is_rejected() {
        let channels = constant_channels(10, 16, 0.0, 0.0, 0.0);
        assert!(matches!(
            extract(&channels, 8, HistogramSource::Luma),
            Err(Error::NonDivisiblePatchSize {
                extent: 10,
                patch_size: 8
            })
        ));
    }

    #[test]
    fn zero_patch_size_is_rejected() {
        let channels = constant_channels(8, 8, 0.0, 0.0, 0.0);
        assert!(matches!(
            extract(&channels, 0, HistogramSource::Luma),
            Err(Error::InvalidShape(_))
        ));
    }

    #[test]
    fn luma_source_bins_the_raw_block() {
        // All 64 values land in the (80, 120] bucket, the other eight
        // buckets clamp to one.
        let block = Plane::new_filled(8, 8, 100.0);
        let entropy = orientation_entropy(&block, HistogramSource::Luma);
        assert!(entropy.approximately_eq(64.0 * 64.0f64.ln()));
    }

    #[test]
    fn gradient_angle_source_bins_the_angle_map() {
        // A constant block has zero gradient everywhere; atan2(0, 0) is 0,
        // so all 36 valid-mode angles are exactly 180 degrees.
        let block = Plane::new_filled(8, 8, 100.0);
        let entropy = orientation_entropy(&block, HistogramSource::GradientAngle);
        assert!(entropy.approximately_eq(36.0 * 36.0f64.ln()));
    }

    #[test]
    fn entropy_is_non_negative() -> anyhow::Result<()> {
        use rand::Rng;

        let mut rng = rand::rng();
        let values: Vec<f64> = (0..24 * 24).map(|_| rng.random_range(0.0..237.0)).collect();
        let channels = ChannelTriple {
            y: Plane::new(24, 24, values),
            cb: Plane::new_filled(24, 24, 0.0),
            cr: Plane::new_filled(24, 24, 0.0),
        };

        for source in [HistogramSource::Luma, HistogramSource::GradientAngle] {
            let features = extract(&channels, 8, source)?;
            assert!(features.iter().all(|f| f.entropy >= 0.0));
        }
        Ok(())
    }

    #[test]
    fn degenerate_histogram_has_zero_entropy() {
        // Zero luma never satisfies v > 0, so every bucket clamps to one.
        let block = Plane::new_filled(8, 8, 0.0);
        let entropy = orientation_entropy(&block, HistogramSource::Luma);
        assert_eq!(entropy, 0.0);
    }

    #[test]
    fn tiny_patch_has_no_gradient_samples() {
        // 2x2 block is smaller than the kernel; the angle map is empty
        // and angle-sourced entropy degenerates to zero.
        let block = Plane::new_filled(2, 2, 50.0);
        let entropy = orientation_entropy(&block, HistogramSource::GradientAngle);
        assert_eq!(entropy, 0.0);
    }

    #[test]
    fn convolve_valid_shrinks_by_two() {
        let plane = Plane::new_filled(8, 6, 1.0);
        let kern = [[0.0; 3]; 3];
        let out = convolve3_valid(&plane, &kern);
        assert_eq!(out.rows(), 6);
        assert_eq!(out.cols(), 4);
    }

    #[test]
    fn convolve_detects_a_column_step() {
        // Left half 0, right half 10; the column kernel responds along
        // the step, the row kernel does not.
        let mut plane = Plane::new_filled(5, 6, 0.0);
        for r in 0..5 {
            for c in 3..6 {
                plane[(r, c)] = 10.0;
            }
        }

        let kern_col = [[-1.0, 0.0, 1.0], [-1.0, 0.0, 1.0], [-1.0, 0.0, 1.0]];
        let kern_row = [[-1.0, -1.0, -1.0], [0.0, 0.0, 0.0], [1.0, 1.0, 1.0]];

        let gx = convolve3_valid(&plane, &kern_col);
        let gy = convolve3_valid(&plane, &kern_row);

        assert!(gx.iter().any(|&v| v != 0.0));
        assert!(gy.iter().all(|&v| v == 0.0));
    }
}
