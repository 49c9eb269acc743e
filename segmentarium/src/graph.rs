use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::features::PatchFeature;

/// Edges at or below this weight are dropped from the graph.
pub const WEIGHT_THRESHOLD: f64 = 1e-9;

/// Undirected weighted edge, stored once per unordered pair with `a < b`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
    pub weight: f64,
}

/// Complete-candidate similarity graph over patches. Node ids are the
/// dense 0-based indices of the feature sequence that built the graph;
/// each node keeps its feature record as annotation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SimilarityGraph {
    nodes: Vec<PatchFeature>,
    edges: Vec<Edge>,
}

/// How the O(n^2) pairwise edge pass is executed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeStrategy {
    #[default]
    Sequential,
    /// Rayon over node rows; workers produce partial edge lists that a
    /// single owner merges, the graph itself is never shared mutably.
    Parallel,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_weight_threshold")]
    pub weight_threshold: f64,
    /// Multiplies each weight by `dist_max / (1 + dist)`. Off by
    /// default; the similarity kernel alone decides edge weights then.
    #[serde(default)]
    pub spatial_attenuation: bool,
    #[serde(default)]
    pub strategy: EdgeStrategy,
}

fn default_weight_threshold() -> f64 {
    WEIGHT_THRESHOLD
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            weight_threshold: WEIGHT_THRESHOLD,
            spatial_attenuation: false,
            strategy: EdgeStrategy::Sequential,
        }
    }
}

impl SimilarityGraph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> &[PatchFeature] {
        &self.nodes
    }

    pub fn node(&self, id: usize) -> &PatchFeature {
        &self.nodes[id]
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Neighbor lists per node, derived from the edge set.
    pub fn adjacency(&self) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); self.nodes.len()];
        for edge in &self.edges {
            adjacency[edge.a].push(edge.b);
            adjacency[edge.b].push(edge.a);
        }
        adjacency
    }

    pub fn to_yaml(&self) -> String {
        serde_yml::to_string(self).expect("Failed to serialize graph to YAML")
    }

    pub fn from_yaml(yaml: &str) -> anyhow::Result<SimilarityGraph> {
        let graph: SimilarityGraph = serde_yml::from_str(yaml)?;
        graph.validate()?;
        Ok(graph)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for edge in &self.edges {
            anyhow::ensure!(
                edge.a < edge.b,
                "edge ({}, {}) is not stored with a < b",
                edge.a,
                edge.b
            );
            anyhow::ensure!(
                edge.b < self.nodes.len(),
                "edge ({}, {}) references a missing node",
                edge.a,
                edge.b
            );
            anyhow::ensure!(
                edge.weight > 0.0,
                "edge ({}, {}) has non-positive weight {}",
                edge.a,
                edge.b,
                edge.weight
            );
        }
        Ok(())
    }
}

/// Gaussian-like similarity kernel over the 4-vector of feature deltas,
/// bounded in (0, 1], equal to 1 exactly for identical features.
fn pair_weight(a: &PatchFeature, b: &PatchFeature, dist_max: f64, spatial: bool) -> f64 {
    let v = [b.y - a.y, b.cb - a.cb, b.cr - a.cr, b.entropy - a.entropy];
    let norm_sq: f64 = v.iter().map(|d| d * d).sum();
    let mut weight = (-norm_sq).exp();

    if spatial {
        let dist = (b.pos - a.pos).length();
        weight *= dist_max / (1.0 + dist);
    }

    weight
}

/// Builds the edge-weighted graph over the feature sequence. The
/// candidate edge set is complete; edges whose weight does not exceed
/// the threshold are dropped, so the result is sparse for dissimilar
/// content.
pub fn build(
    features: Vec<PatchFeature>,
    image_width: usize,
    image_height: usize,
    config: &GraphConfig,
) -> SimilarityGraph {
    let dist_max = (image_width as f64).hypot(image_height as f64);

    let edges = match config.strategy {
        EdgeStrategy::Sequential => build_edges_sequential(&features, dist_max, config),
        EdgeStrategy::Parallel => build_edges_parallel(&features, dist_max, config),
    };

    let graph = SimilarityGraph {
        nodes: features,
        edges,
    };
    tracing::debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "similarity graph built"
    );
    graph
}

fn row_edges(
    features: &[PatchFeature],
    i: usize,
    dist_max: f64,
    config: &GraphConfig,
) -> Vec<Edge> {
    let mut edges = Vec::new();
    for j in i + 1..features.len() {
        let weight = pair_weight(
            &features[i],
            &features[j],
            dist_max,
            config.spatial_attenuation,
        );
        if weight > config.weight_threshold {
            edges.push(Edge { a: i, b: j, weight });
        }
    }
    edges
}

fn build_edges_sequential(
    features: &[PatchFeature],
    dist_max: f64,
    config: &GraphConfig,
) -> Vec<Edge> {
    let mut edges = Vec::new();
    for i in 0..features.len() {
        edges.extend(row_edges(features, i, dist_max, config));
    }
    edges
}

fn build_edges_parallel(
    features: &[PatchFeature],
    dist_max: f64,
    config: &GraphConfig,
) -> Vec<Edge> {
    let partials: Vec<Vec<Edge>> = (0..features.len())
        .into_par_iter()
        .map(|i| row_edges(features, i, dist_max, config))
        .collect();

    // Merge on the calling thread to keep edge order identical to the
    // sequential pass.
    let mut edges = Vec::with_capacity(partials.iter().map(Vec::len).sum());
    for partial in partials {
        edges.extend(partial);
    }
    edges
}
