//! Reply chain traversal and its memoized queries.

use std::collections::hash_set;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tracing::{debug, trace};

use super::cache::{Clock, TtlCache};
use super::codec::EdgeKey;
use super::error::EngineError;
use super::graph::ReplyGraph;

/// Packed directed edges belonging to one or more reply chains.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HighlightSet {
    edges: HashSet<EdgeKey>,
}

impl HighlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn contains(&self, key: EdgeKey) -> bool {
        self.edges.contains(&key)
    }

    pub fn contains_edge(&self, source: usize, target: usize) -> bool {
        u32::try_from(source).is_ok()
            && u32::try_from(target).is_ok()
            && self.edges.contains(&EdgeKey::from_indices(source, target))
    }

    pub fn insert(&mut self, key: EdgeKey) -> bool {
        self.edges.insert(key)
    }

    pub fn extend_from(&mut self, other: &HighlightSet) {
        self.edges.extend(other.edges.iter().copied());
    }

    pub fn iter(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        self.edges.iter().copied()
    }

    /// Endpoints of every edge, sorted, for stable display and comparisons.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges = self.edges.iter().map(|key| key.endpoints()).collect::<Vec<_>>();
        edges.sort_unstable();
        edges
    }

    /// Every node touched by an edge in the set.
    pub fn nodes(&self) -> HashSet<usize> {
        self.edges
            .iter()
            .flat_map(|key| {
                let (source, target) = key.endpoints();
                [source, target]
            })
            .collect()
    }
}

impl FromIterator<EdgeKey> for HighlightSet {
    fn from_iter<I: IntoIterator<Item = EdgeKey>>(iter: I) -> Self {
        Self {
            edges: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a HighlightSet {
    type Item = &'a EdgeKey;
    type IntoIter = hash_set::Iter<'a, EdgeKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.edges.iter()
    }
}

/// Reusable buffers for one traversal at a time.
#[derive(Debug, Default)]
pub struct TraversalScratch {
    visited: Vec<bool>,
    queue: VecDeque<usize>,
}

impl TraversalScratch {
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self, node_count: usize) {
        self.visited.clear();
        self.visited.resize(node_count, false);
        self.queue.clear();
    }
}

/// Breadth-first walk over the undirected view starting at `start`.
///
/// The hub is entered but never expanded unless it is `start` itself, so a
/// popular OP does not fuse unrelated branches. Only edges that exist in the
/// forward direction are emitted, in whichever orientation they were posted.
/// An out-of-range `start` yields an empty set.
pub fn gather_chain_edges(
    start: usize,
    graph: &ReplyGraph,
    scratch: &mut TraversalScratch,
) -> HighlightSet {
    let mut result = HighlightSet::new();
    let node_count = graph.node_count();
    if start >= node_count {
        return result;
    }

    scratch.reset(node_count);
    scratch.visited[start] = true;
    scratch.queue.push_back(start);

    while let Some(current) = scratch.queue.pop_front() {
        if graph.hub() == Some(current) && current != start {
            continue;
        }

        for neighbor in graph.neighbors(current) {
            if graph.has_edge(current, neighbor) {
                result.insert(EdgeKey::from_indices(current, neighbor));
            }
            if graph.has_edge(neighbor, current) {
                result.insert(EdgeKey::from_indices(neighbor, current));
            }
            if !scratch.visited[neighbor] {
                scratch.visited[neighbor] = true;
                scratch.queue.push_back(neighbor);
            }
        }
    }

    result
}

fn check_node(start: usize, graph: &ReplyGraph) -> Result<(), EngineError> {
    if start >= graph.node_count() {
        return Err(EngineError::UnknownNode {
            index: start,
            node_count: graph.node_count(),
        });
    }
    Ok(())
}

/// Cached single-node query. A hit hands back the stored set untouched.
pub fn highlight_for<C: Clock>(
    start: usize,
    graph: &ReplyGraph,
    cache: &mut TtlCache<usize, Arc<HighlightSet>, C>,
    scratch: &mut TraversalScratch,
) -> Result<Arc<HighlightSet>, EngineError> {
    check_node(start, graph)?;

    if let Some(cached) = cache.get(&start) {
        return Ok(Arc::clone(cached));
    }

    let edges = Arc::new(gather_chain_edges(start, graph, scratch));
    trace!(start, edges = edges.len(), "computed reply chain");
    cache.set(start, Arc::clone(&edges));
    Ok(edges)
}

/// Union of the chains of every node in `starts`. Empty input gives an
/// empty set; input order never changes the result.
pub fn compute_highlighted_edges<C: Clock>(
    starts: &[usize],
    graph: &ReplyGraph,
    cache: &mut TtlCache<usize, Arc<HighlightSet>, C>,
    scratch: &mut TraversalScratch,
) -> Result<HighlightSet, EngineError> {
    let mut union = HighlightSet::new();
    for &start in starts {
        let edges = highlight_for(start, graph, cache, scratch)?;
        union.extend_from(&edges);
    }
    Ok(union)
}

/// Drops every cached chain and recomputes one per node.
pub fn warm_cache<C: Clock>(
    graph: &ReplyGraph,
    cache: &mut TtlCache<usize, Arc<HighlightSet>, C>,
    scratch: &mut TraversalScratch,
) {
    cache.clear();
    for start in 0..graph.node_count() {
        let edges = gather_chain_edges(start, graph, scratch);
        cache.set(start, Arc::new(edges));
    }
    debug!(nodes = graph.node_count(), cached = cache.len(), "warmed highlight cache");
}
