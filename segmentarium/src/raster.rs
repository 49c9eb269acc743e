use std::path::Path;

use common::plane::Plane;
use image::RgbImage;

use crate::error::Result;

/// Decoded 8-bit RGB raster, `(row, col)` addressed. This is the only
/// pixel format the pipeline consumes; file-format concerns stay in the
/// `image` crate.
pub type RgbRaster = Plane<[u8; 3]>;

pub fn load_rgb<P: AsRef<Path>>(path: P) -> Result<RgbRaster> {
    let img = image::open(path)?.into_rgb8();
    Ok(from_rgb_image(&img))
}

pub fn save_rgb<P: AsRef<Path>>(raster: &RgbRaster, path: P) -> Result<()> {
    let img = to_rgb_image(raster);
    img.save(path)?;
    Ok(())
}

pub fn from_rgb_image(img: &RgbImage) -> RgbRaster {
    let rows = img.height() as usize;
    let cols = img.width() as usize;
    let values = img.pixels().map(|p| p.0).collect();
    Plane::new(rows, cols, values)
}

pub fn to_rgb_image(raster: &RgbRaster) -> RgbImage {
    let mut img = RgbImage::new(raster.cols() as u32, raster.rows() as u32);
    for (pixel, &rgb) in img.pixels_mut().zip(raster.iter()) {
        pixel.0 = rgb;
    }
    img
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_image_round_trip() {
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(0, 0, image::Rgb([1, 2, 3]));
        img.put_pixel(2, 1, image::Rgb([40, 50, 60]));

        let raster = from_rgb_image(&img);
        assert_eq!(raster.rows(), 2);
        assert_eq!(raster.cols(), 3);
        // image addresses (x, y), the raster addresses (row, col)
        assert_eq!(*raster.get(0, 0), [1, 2, 3]);
        assert_eq!(*raster.get(1, 2), [40, 50, 60]);

        let back = to_rgb_image(&raster);
        assert_eq!(back, img);
    }

    #[test]
    fn save_and_load_png() -> anyhow::Result<()> {
        let raster = RgbRaster::new_filled(4, 5, [10u8, 20, 30]);
        let path = std::env::temp_dir().join("segmentarium_raster_round_trip.png");

        save_rgb(&raster, &path)?;
        let loaded = load_rgb(&path)?;
        std::fs::remove_file(&path)?;

        assert_eq!(loaded, raster);
        Ok(())
    }
}
