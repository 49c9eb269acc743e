use std::path::{Path, PathBuf};

use glam::DVec2;

use crate::error::Result;
use crate::graph::SimilarityGraph;
use crate::raster::{self, RgbRaster};

const LINE_COLOR: [u8; 3] = [0, 0, 0];
const ENDPOINT_COLOR: [u8; 3] = [255, 0, 0];
const START_COLOR: [u8; 3] = [0, 0, 255];
const END_COLOR: [u8; 3] = [255, 255, 0];
const BOX_COLOR: [u8; 3] = [0, 0, 0];

/// Draws a straight line between two points by walking unit steps along
/// the direction vector, plus small endpoint markers. Coordinates are
/// `(row, col)`; points outside the raster are skipped.
pub fn draw_line(image: &mut RgbRaster, from: DVec2, to: DVec2) {
    let delta = to - from;
    let dist = delta.length();
    let theta = delta.y.atan2(delta.x);

    for step in 0..=dist as usize {
        let row = from.x + step as f64 * theta.cos();
        let col = from.y + step as f64 * theta.sin();
        set_pixel(image, row.round() as i64, col.round() as i64, LINE_COLOR);
    }

    fill_square(image, from, 1, ENDPOINT_COLOR);
    fill_square(image, to, 1, ENDPOINT_COLOR);
}

/// Renders each community as an annotated copy of the input raster and
/// writes it into `out_dir` as `community_<id>.png`.
///
/// All communities' centroid polylines are drawn onto one shared base
/// image first (start marker blue, end marker yellow, centroids joined
/// in ascending node-id order); each output file then adds that
/// community's bounding box. Empty communities produce no file.
pub fn render_communities<P: AsRef<Path>>(
    image: &RgbRaster,
    graph: &SimilarityGraph,
    communities: &[Vec<usize>],
    out_dir: P,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(&out_dir)?;

    let mut base = image.clone();
    for group in communities {
        draw_polyline(&mut base, graph, group);
    }

    let mut written = Vec::new();
    for (id, group) in communities.iter().enumerate() {
        if group.is_empty() {
            continue;
        }

        let mut annotated = base.clone();
        draw_bounding_box(&mut annotated, graph, group);

        let path = out_dir.as_ref().join(format!("community_{}.png", id));
        raster::save_rgb(&annotated, &path)?;
        written.push(path);
    }

    tracing::info!(files = written.len(), "community overlays written");
    Ok(written)
}

fn draw_polyline(image: &mut RgbRaster, graph: &SimilarityGraph, group: &[usize]) {
    let mut previous: Option<DVec2> = None;
    for &node in group {
        let pos = graph.node(node).pos;
        match previous {
            None => fill_square(image, pos, 2, START_COLOR),
            Some(prev) => draw_line(image, prev, pos),
        }
        previous = Some(pos);
    }
    if let Some(last) = previous {
        fill_square(image, last, 2, END_COLOR);
    }
}

fn draw_bounding_box(image: &mut RgbRaster, graph: &SimilarityGraph, group: &[usize]) {
    let positions = group.iter().map(|&node| graph.node(node).pos);
    let mut min = DVec2::splat(f64::INFINITY);
    let mut max = DVec2::splat(f64::NEG_INFINITY);
    for pos in positions {
        min = min.min(pos);
        max = max.max(pos);
    }

    let (row0, col0) = (min.x as i64, min.y as i64);
    let (row1, col1) = (max.x as i64, max.y as i64);

    for row in row0..=row1 {
        set_pixel(image, row, col0, BOX_COLOR);
        set_pixel(image, row, col1, BOX_COLOR);
    }
    for col in col0..=col1 {
        set_pixel(image, row0, col, BOX_COLOR);
        set_pixel(image, row1, col, BOX_COLOR);
    }
}

fn fill_square(image: &mut RgbRaster, center: DVec2, half: i64, color: [u8; 3]) {
    let (row, col) = (center.x.round() as i64, center.y.round() as i64);
    for r in row - half..=row + half {
        for c in col - half..=col + half {
            set_pixel(image, r, c, color);
        }
    }
}

#[inline]
fn set_pixel(image: &mut RgbRaster, row: i64, col: i64, color: [u8; 3]) {
    if row >= 0 && col >= 0 && (row as usize) < image.rows() && (col as usize) < image.cols() {
        image[(row as usize, col as usize)] = color;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::ConnectedComponents;
    use crate::pipeline::{Pipeline, PipelineConfig};

    #[test]
    fn line_darkens_pixels_and_marks_endpoints() {
        let mut image = RgbRaster::new_filled(32, 32, [128, 128, 128]);

        draw_line(
            &mut image,
            DVec2::new(4.0, 4.0),
            DVec2::new(20.0, 28.0),
        );

        assert_eq!(*image.get(4, 4), ENDPOINT_COLOR);
        assert_eq!(*image.get(20, 28), ENDPOINT_COLOR);
        let line_pixels = image.iter().filter(|&&p| p == LINE_COLOR).count();
        assert!(line_pixels > 0);
    }

    #[test]
    fn out_of_bounds_points_are_ignored() {
        let mut image = RgbRaster::new_filled(8, 8, [7, 7, 7]);
        draw_line(&mut image, DVec2::new(-10.0, -10.0), DVec2::new(-2.0, -2.0));
        fill_square(&mut image, DVec2::new(100.0, 100.0), 2, START_COLOR);
        // Nothing inside the raster was touched by the off-raster line body,
        // and the markers clamped away entirely.
        assert!(image.iter().all(|&p| p == [7, 7, 7] || p == LINE_COLOR));
    }

    #[test]
    fn renders_one_file_per_nonempty_community() -> anyhow::Result<()> {
        let mut image = RgbRaster::new_filled(16, 32, [60, 60, 60]);
        // Right half bright so the components split in two.
        for row in 0..16 {
            for col in 16..32 {
                image[(row, col)] = [250, 250, 250];
            }
        }

        let pipeline = Pipeline::new(PipelineConfig::default())?;
        let segmentation = pipeline.segment(&image, &ConnectedComponents::default())?;
        assert_eq!(segmentation.communities.len(), 2);

        let out_dir = std::env::temp_dir().join("segmentarium_overlay_test");
        let written = render_communities(
            &image,
            &segmentation.graph,
            &segmentation.communities,
            &out_dir,
        )?;

        assert_eq!(written.len(), 2);
        for path in &written {
            assert!(path.exists());
        }
        std::fs::remove_dir_all(&out_dir)?;
        Ok(())
    }
}
