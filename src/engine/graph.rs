//! Reply graph construction.
//!
//! Node indices are positions in the post slice handed to
//! [`ReplyGraph::build`]. An edge `a → b` means post `a` quotes post `b`.
//! Three views are kept side by side: `forward` (who a post replies to),
//! `reverse` (who replied to a post) and `undirected` (the symmetric union
//! that highlight traversal walks). Direction survives in `forward`/`reverse`
//! and in the packed edge set used for O(1) membership checks.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{debug, instrument, trace, warn};

use crate::thread::Post;

use super::codec::{EdgeKey, MAX_NODES};
use super::error::EngineError;

#[derive(Clone, Debug, Default)]
pub struct ReplyGraph {
    forward: Vec<Vec<usize>>,
    reverse: Vec<Vec<usize>>,
    undirected: Vec<BTreeSet<usize>>,
    edges: HashSet<EdgeKey>,
    numbers: Vec<u64>,
    index_by_number: HashMap<u64, usize>,
    reply_count: HashMap<u64, usize>,
    hub: Option<usize>,
}

impl ReplyGraph {
    /// Fails only when the post count exceeds what a packed edge key can address.
    pub fn check_capacity(node_count: usize) -> Result<(), EngineError> {
        if node_count as u64 > MAX_NODES {
            return Err(EngineError::CapacityExceeded {
                nodes: node_count,
                limit: MAX_NODES,
            });
        }
        Ok(())
    }

    /// Builds the graph in O(posts + references).
    ///
    /// References to numbers that are not in `posts` (older posts outside the
    /// captured range, cross-thread links) and self references are dropped.
    /// Repeated references from one post to the same target count once.
    #[instrument(level = "debug", skip(posts), fields(posts = posts.len()))]
    pub fn build(posts: &[Post]) -> Result<Self, EngineError> {
        Self::check_capacity(posts.len())?;

        let node_count = posts.len();
        let mut graph = Self {
            forward: vec![Vec::new(); node_count],
            reverse: vec![Vec::new(); node_count],
            undirected: vec![BTreeSet::new(); node_count],
            edges: HashSet::new(),
            numbers: Vec::with_capacity(node_count),
            index_by_number: HashMap::with_capacity(node_count),
            reply_count: HashMap::with_capacity(node_count),
            hub: None,
        };

        for (index, post) in posts.iter().enumerate() {
            graph.numbers.push(post.number);
            graph.index_by_number.entry(post.number).or_insert(index);
            graph.reply_count.insert(post.number, 0);
        }

        let mut dropped = 0usize;
        for (source, post) in posts.iter().enumerate() {
            if post.is_op {
                if let Some(previous) = graph.hub {
                    warn!(
                        previous,
                        replacement = source,
                        "more than one post is flagged as OP; keeping the last"
                    );
                }
                graph.hub = Some(source);
            }

            for &reference in &post.reply_tos {
                let Some(&target) = graph.index_by_number.get(&reference) else {
                    trace!(post = post.number, reference, "dropping unresolved reply reference");
                    dropped += 1;
                    continue;
                };
                if target == source {
                    dropped += 1;
                    continue;
                }

                let key = EdgeKey::from_indices(source, target);
                if !graph.edges.insert(key) {
                    continue;
                }

                graph.forward[source].push(target);
                graph.reverse[target].push(source);
                *graph.reply_count.entry(reference).or_insert(0) += 1;
                graph.undirected[source].insert(target);
                graph.undirected[target].insert(source);
            }
        }

        debug!(
            nodes = node_count,
            edges = graph.edges.len(),
            dropped,
            hub = ?graph.hub,
            "built reply graph"
        );

        Ok(graph)
    }

    pub fn node_count(&self) -> usize {
        self.forward.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    pub fn hub(&self) -> Option<usize> {
        self.hub
    }

    pub fn forward(&self, index: usize) -> &[usize] {
        self.forward.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn reverse(&self, index: usize) -> &[usize] {
        self.reverse.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn neighbors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.undirected.get(index).into_iter().flatten().copied()
    }

    pub fn has_edge(&self, source: usize, target: usize) -> bool {
        source < self.node_count()
            && target < self.node_count()
            && self.edges.contains(&EdgeKey::from_indices(source, target))
    }

    /// Every directed edge, grouped by source in input order.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.forward
            .iter()
            .enumerate()
            .flat_map(|(source, targets)| targets.iter().map(move |&target| (source, target)))
    }

    pub fn index_of(&self, number: u64) -> Option<usize> {
        self.index_by_number.get(&number).copied()
    }

    pub fn number_of(&self, index: usize) -> Option<u64> {
        self.numbers.get(index).copied()
    }

    /// Number of distinct posts in the graph that reply to `number`.
    pub fn reply_count(&self, number: u64) -> usize {
        self.reply_count.get(&number).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn post(number: u64, reply_tos: &[u64]) -> Post {
        let time = Utc
            .timestamp_opt(1_700_000_000 + number as i64, 0)
            .single()
            .expect("valid timestamp");
        let mut post = Post::new(number, time);
        post.reply_tos = reply_tos.to_vec();
        post
    }

    #[test]
    fn empty_input_builds_empty_graph() {
        let graph = ReplyGraph::build(&[]).expect("build graph");
        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.hub(), None);
    }

    #[test]
    fn direction_is_kept_in_forward_and_reverse() {
        let posts = vec![post(100, &[]), post(101, &[100])];
        let graph = ReplyGraph::build(&posts).expect("build graph");

        assert_eq!(graph.forward(1), &[0]);
        assert_eq!(graph.reverse(0), &[1]);
        assert!(graph.forward(0).is_empty());
        assert!(graph.reverse(1).is_empty());
        assert!(graph.has_edge(1, 0));
        assert!(!graph.has_edge(0, 1));
        assert_eq!(graph.neighbors(0).collect::<Vec<_>>(), vec![1]);
        assert_eq!(graph.neighbors(1).collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn dangling_and_self_references_are_dropped() {
        let posts = vec![post(100, &[99, 100]), post(101, &[100, 5_000])];
        let graph = ReplyGraph::build(&posts).expect("build graph");

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edges().collect::<Vec<_>>(), vec![(1, 0)]);
        assert_eq!(graph.reply_count(100), 1);
        assert_eq!(graph.reply_count(99), 0);
    }

    #[test]
    fn repeated_quotes_count_once() {
        let posts = vec![post(1, &[]), post(2, &[1, 1, 1])];
        let graph = ReplyGraph::build(&posts).expect("build graph");
        assert_eq!(graph.forward(1), &[0]);
        assert_eq!(graph.reply_count(1), 1);
    }

    #[test]
    fn reply_count_counts_distinct_repliers() {
        let posts = vec![post(1, &[]), post(2, &[1]), post(3, &[1, 2]), post(4, &[1])];
        let graph = ReplyGraph::build(&posts).expect("build graph");
        assert_eq!(graph.reply_count(1), 3);
        assert_eq!(graph.reply_count(2), 1);
        assert_eq!(graph.reply_count(4), 0);
    }

    #[test]
    fn hub_is_the_op_post() {
        let mut posts = vec![post(1, &[]), post(2, &[1]), post(3, &[2])];
        assert_eq!(ReplyGraph::build(&posts).expect("build graph").hub(), None);

        posts[1].is_op = true;
        assert_eq!(ReplyGraph::build(&posts).expect("build graph").hub(), Some(1));
    }

    #[test]
    fn last_flagged_op_becomes_the_hub() {
        let mut posts = vec![post(1, &[]), post(2, &[1]), post(3, &[2])];
        posts[0].is_op = true;
        posts[2].is_op = true;
        assert_eq!(ReplyGraph::build(&posts).expect("build graph").hub(), Some(2));
    }

    #[test]
    fn mutual_replies_appear_in_both_reverse_lists() {
        let posts = vec![post(1, &[2]), post(2, &[1])];
        let graph = ReplyGraph::build(&posts).expect("build graph");
        assert_eq!(graph.reverse(0), &[1]);
        assert_eq!(graph.reverse(1), &[0]);
        assert_eq!(graph.neighbors(0).count(), 1);
    }

    #[test]
    fn lookups_map_numbers_and_indices() {
        let posts = vec![post(40, &[]), post(41, &[40])];
        let graph = ReplyGraph::build(&posts).expect("build graph");
        assert_eq!(graph.index_of(41), Some(1));
        assert_eq!(graph.number_of(0), Some(40));
        assert_eq!(graph.index_of(7), None);
        assert_eq!(graph.number_of(9), None);
    }

    #[test]
    fn capacity_limit_is_reported() {
        assert!(ReplyGraph::check_capacity(65_536).is_ok());
        assert!(ReplyGraph::check_capacity(70_000).is_ok());
        let too_many = usize::try_from(MAX_NODES + 1).unwrap_or(usize::MAX);
        if too_many as u64 > MAX_NODES {
            assert_eq!(
                ReplyGraph::check_capacity(too_many),
                Err(EngineError::CapacityExceeded {
                    nodes: too_many,
                    limit: MAX_NODES,
                })
            );
        }
    }
}
