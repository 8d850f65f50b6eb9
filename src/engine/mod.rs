//! Reply-graph highlight engine.
//!
//! [`HighlightEngine`] owns one generation of the reply graph together with
//! its chain cache and traversal buffers. Rebuilding swaps all three at once,
//! so a cached chain never outlives the graph it was computed from.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::thread::Post;

pub mod cache;
pub mod codec;
pub mod error;
pub mod graph;
pub mod highlight;
pub mod sign;

pub use self::cache::{CacheConfig, CacheStats, Clock, ManualClock, SystemClock, TtlCache};
pub use self::codec::{EdgeKey, MAX_NODES, decode_edge, encode_edge};
pub use self::error::EngineError;
pub use self::graph::ReplyGraph;
pub use self::highlight::{
    HighlightSet, TraversalScratch, compute_highlighted_edges, gather_chain_edges, highlight_for,
    warm_cache,
};
pub use self::sign::{SignTable, cubic_controls, pair_sign};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    pub cache: CacheConfig,
    /// Compute every node's chain right after a rebuild.
    pub eager_warm: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            eager_warm: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GraphSummary {
    pub generation: u64,
    pub node_count: usize,
    pub edge_count: usize,
    pub hub: Option<usize>,
    pub warmed: bool,
}

pub struct HighlightEngine<C: Clock = SystemClock> {
    config: EngineConfig,
    graph: Option<ReplyGraph>,
    cache: TtlCache<usize, Arc<HighlightSet>, C>,
    scratch: TraversalScratch,
    generation: u64,
}

impl HighlightEngine<SystemClock> {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> HighlightEngine<C> {
    pub fn with_clock(config: EngineConfig, clock: C) -> Self {
        Self {
            config,
            graph: None,
            cache: TtlCache::with_clock(config.cache, clock),
            scratch: TraversalScratch::new(),
            generation: 0,
        }
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Replaces the current graph. On failure the previous graph and its
    /// cache stay in place.
    #[instrument(level = "debug", skip_all, fields(posts = posts.len()))]
    pub fn rebuild(&mut self, posts: &[Post]) -> Result<GraphSummary, EngineError> {
        let graph = ReplyGraph::build(posts)?;

        self.generation += 1;
        self.cache.clear();
        if self.config.eager_warm {
            warm_cache(&graph, &mut self.cache, &mut self.scratch);
        }

        let summary = GraphSummary {
            generation: self.generation,
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            hub: graph.hub(),
            warmed: self.config.eager_warm,
        };
        self.graph = Some(graph);

        info!(
            generation = summary.generation,
            nodes = summary.node_count,
            edges = summary.edge_count,
            warmed = summary.warmed,
            "reply graph ready"
        );
        Ok(summary)
    }

    pub fn highlight(&mut self, starts: &[usize]) -> Result<HighlightSet, EngineError> {
        let graph = self.graph.as_ref().ok_or(EngineError::NotReady)?;
        compute_highlighted_edges(starts, graph, &mut self.cache, &mut self.scratch)
    }

    pub fn highlight_one(&mut self, start: usize) -> Result<Arc<HighlightSet>, EngineError> {
        let graph = self.graph.as_ref().ok_or(EngineError::NotReady)?;
        highlight_for(start, graph, &mut self.cache, &mut self.scratch)
    }

    pub fn graph(&self) -> Option<&ReplyGraph> {
        self.graph.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cached_chains(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

impl Default for HighlightEngine<SystemClock> {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
