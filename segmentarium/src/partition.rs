use hashbrown::HashMap;

use crate::error::{Error, Result};
use crate::graph::SimilarityGraph;

pub type CommunityId = usize;

/// Capability interface for the external community-detection step.
/// Implementations take the finished similarity graph and return a
/// total node-id to community-id mapping with dense ids starting at 0.
pub trait Partitioner {
    fn partition(&self, graph: &SimilarityGraph) -> HashMap<usize, CommunityId>;
}

/// Groups node ids by community. The partition must cover every node id
/// in `0..node_count`; community count is `max(community id) + 1`, and
/// communities whose id is never used come back as empty groups. Node
/// ids stay in ascending order within each group, which downstream
/// line drawing relies on.
pub fn group_by_community(
    node_count: usize,
    partition: &HashMap<usize, CommunityId>,
) -> Result<Vec<Vec<usize>>> {
    let mut community_count = 0;
    for node in 0..node_count {
        let community = partition
            .get(&node)
            .ok_or(Error::MissingAssignment { node })?;
        community_count = community_count.max(community + 1);
    }

    let mut groups = vec![Vec::new(); community_count];
    for node in 0..node_count {
        groups[partition[&node]].push(node);
    }
    Ok(groups)
}

/// Deterministic stand-in partitioner: connected components over edges
/// whose weight reaches `min_weight`. Not modularity maximization; real
/// community detection plugs in through the `Partitioner` trait.
#[derive(Clone, Copy, Debug)]
pub struct ConnectedComponents {
    pub min_weight: f64,
}

impl Default for ConnectedComponents {
    fn default() -> Self {
        Self { min_weight: 0.5 }
    }
}

impl Partitioner for ConnectedComponents {
    fn partition(&self, graph: &SimilarityGraph) -> HashMap<usize, CommunityId> {
        let mut adjacency = vec![Vec::new(); graph.node_count()];
        for edge in graph.edges() {
            if edge.weight >= self.min_weight {
                adjacency[edge.a].push(edge.b);
                adjacency[edge.b].push(edge.a);
            }
        }

        let mut assignment = HashMap::with_capacity(graph.node_count());
        let mut next_community = 0;

        // Flood fill from the lowest unassigned node id, so community
        // ids are dense and deterministic.
        for start in 0..graph.node_count() {
            if assignment.contains_key(&start) {
                continue;
            }
            let mut stack = vec![start];
            assignment.insert(start, next_community);
            while let Some(node) = stack.pop() {
                for &neighbor in &adjacency[node] {
                    if !assignment.contains_key(&neighbor) {
                        assignment.insert(neighbor, next_community);
                        stack.push(neighbor);
                    }
                }
            }
            next_community += 1;
        }

        assignment
    }
}
