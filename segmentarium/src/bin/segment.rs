use anyhow::Context;
use tracing::info;

use segmentarium::overlay;
use segmentarium::partition::ConnectedComponents;
use segmentarium::pipeline::{Pipeline, PipelineConfig};
use segmentarium::raster;

fn main() -> anyhow::Result<()> {
    common::log_setup::setup_logging("info");

    let args: Vec<String> = std::env::args().collect();
    let (image_path, out_dir, config_path) = match args.as_slice() {
        [_, image, out] => (image.as_str(), out.as_str(), None),
        [_, image, out, config] => (image.as_str(), out.as_str(), Some(config.as_str())),
        _ => anyhow::bail!("usage: segment <image> <out_dir> [config.yaml]"),
    };

    let config = match config_path {
        Some(path) => PipelineConfig::from_yaml_file(path)
            .with_context(|| format!("loading config {}", path))?,
        None => PipelineConfig::default(),
    };

    let image = raster::load_rgb(image_path).with_context(|| format!("loading {}", image_path))?;
    info!(
        rows = image.rows(),
        cols = image.cols(),
        patch_size = config.patch_size,
        "image loaded"
    );

    let pipeline = Pipeline::new(config)?;
    let segmentation = pipeline.segment(&image, &ConnectedComponents::default())?;

    let written = overlay::render_communities(
        &image,
        &segmentation.graph,
        &segmentation.communities,
        out_dir,
    )?;

    info!(
        communities = segmentation.communities.len(),
        files = written.len(),
        out_dir,
        "segmentation finished"
    );
    Ok(())
}
