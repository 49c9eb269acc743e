use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::color;
use crate::error::{Error, Result};
use crate::features::{self, HistogramSource, PatchFeature};
use crate::graph::{self, GraphConfig, SimilarityGraph};
use crate::partition::{self, Partitioner};
use crate::raster::RgbRaster;

pub const DEFAULT_PATCH_SIZE: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_patch_size")]
    pub patch_size: usize,
    #[serde(default)]
    pub histogram_source: HistogramSource,
    #[serde(default)]
    pub graph: GraphConfig,
}

fn default_patch_size() -> usize {
    DEFAULT_PATCH_SIZE
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            patch_size: DEFAULT_PATCH_SIZE,
            histogram_source: HistogramSource::default(),
            graph: GraphConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_yaml(yaml: &str) -> anyhow::Result<PipelineConfig> {
        let config: PipelineConfig = serde_yml::from_str(yaml)?;
        anyhow::ensure!(config.patch_size > 0, "patch size must be positive");
        Ok(config)
    }

    pub fn from_yaml_file(path: &str) -> anyhow::Result<PipelineConfig> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }
}

/// Feature sequence plus the similarity graph built over it. The graph
/// nodes are the feature records, in extraction order.
#[derive(Clone, Debug)]
pub struct PipelineOutput {
    pub graph: SimilarityGraph,
}

impl PipelineOutput {
    pub fn features(&self) -> &[PatchFeature] {
        self.graph.nodes()
    }
}

#[derive(Clone, Debug)]
pub struct Segmentation {
    pub graph: SimilarityGraph,
    /// Node ids per community, ascending within each group.
    pub communities: Vec<Vec<usize>>,
}

/// The composed feature-extraction and graph-construction pipeline.
/// Pure batch computation over an immutable input raster; community
/// detection is injected through the `Partitioner` trait.
#[derive(Clone, Debug, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Pipeline> {
        if config.patch_size == 0 {
            return Err(Error::InvalidShape("patch size must be positive".into()));
        }
        Ok(Pipeline { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// image -> channel triple -> feature sequence -> similarity graph.
    pub fn run(&self, image: &RgbRaster) -> Result<PipelineOutput> {
        let channels = color::transform(image, self.config.patch_size)?;
        debug!(
            rows = channels.rows(),
            cols = channels.cols(),
            "channels trimmed and mixed"
        );

        let features =
            features::extract(&channels, self.config.patch_size, self.config.histogram_source)?;
        info!(patches = features.len(), "patch features extracted");

        let graph = graph::build(features, image.cols(), image.rows(), &self.config.graph);
        Ok(PipelineOutput { graph })
    }

    /// Full run plus partitioning and community grouping.
    pub fn segment(
        &self,
        image: &RgbRaster,
        partitioner: &dyn Partitioner,
    ) -> Result<Segmentation> {
        let output = self.run(image)?;

        let assignment = partitioner.partition(&output.graph);
        let communities = partition::group_by_community(output.graph.node_count(), &assignment)?;
        info!(communities = communities.len(), "graph partitioned");

        Ok(Segmentation {
            graph: output.graph,
            communities,
        })
    }
}
