use common::plane::Plane;

use crate::error::{Error, Result};
use crate::raster::RgbRaster;

/// The Y, Cb, Cr planes of an image, all trimmed to the same shape.
///
/// Both spatial extents are exact multiples of the patch size used to
/// produce the triple; the feature extractor relies on this.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelTriple {
    pub y: Plane<f64>,
    pub cb: Plane<f64>,
    pub cr: Plane<f64>,
}

impl ChannelTriple {
    #[inline]
    pub fn rows(&self) -> usize {
        self.y.rows()
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.y.cols()
    }
}

/// Splits an RGB raster into Y, Cb, Cr planes, trimming each spatial
/// extent down to the nearest lower multiple of `patch_size` first.
///
/// ITU-R-style luma/chroma mix, coefficients per the YCbCr definition:
/// Y = 0.229 R + 0.587 G + 0.114 B, with Cb/Cr offset around 128.
pub fn transform(image: &RgbRaster, patch_size: usize) -> Result<ChannelTriple> {
    if patch_size == 0 {
        return Err(Error::InvalidShape("patch size must be positive".into()));
    }

    let rows = image.rows() - image.rows() % patch_size;
    let cols = image.cols() - image.cols() % patch_size;

    let mut y = Vec::with_capacity(rows * cols);
    let mut cb = Vec::with_capacity(rows * cols);
    let mut cr = Vec::with_capacity(rows * cols);

    // The crop happens before the mix so all three planes share the
    // trimmed shape.
    for row in 0..rows {
        for &[r, g, b] in &image.row(row)[..cols] {
            let (r, g, b) = (r as f64, g as f64, b as f64);
            y.push(0.229 * r + 0.587 * g + 0.114 * b);
            cb.push(128.0 - 0.168763 * r - 0.331264 * g - 0.5 * b);
            cr.push(128.0 + 0.5 * r - 0.418688 * g - 0.081312 * b);
        }
    }

    Ok(ChannelTriple {
        y: Plane::new(rows, cols, y),
        cb: Plane::new(rows, cols, cb),
        cr: Plane::new(rows, cols, cr),
    })
}
