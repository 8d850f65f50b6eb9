use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use reply_grapher::engine::{
    CacheConfig, EngineConfig, EngineError, HighlightEngine, ManualClock, encode_edge,
};

mod common;
use common::{forked_thread, op, post};

fn lazy_engine() -> HighlightEngine {
    HighlightEngine::new(EngineConfig {
        cache: CacheConfig::default(),
        eager_warm: false,
    })
}

#[test]
fn queries_before_the_first_build_are_not_ready() {
    let mut engine = HighlightEngine::default();
    assert_eq!(engine.highlight(&[0]), Err(EngineError::NotReady));
    assert_eq!(engine.highlight_one(0).err(), Some(EngineError::NotReady));
    assert!(engine.graph().is_none());
    assert_eq!(engine.generation(), 0);
}

#[test]
fn hub_is_a_boundary_for_other_starts() {
    let mut engine = HighlightEngine::default();
    engine.rebuild(&forked_thread()).expect("rebuild");

    let from_leaf = engine.highlight(&[3]).expect("highlight");
    assert!(from_leaf.contains(encode_edge(3, 1)));
    assert!(from_leaf.contains(encode_edge(1, 0)));
    assert!(!from_leaf.contains(encode_edge(4, 2)));
    assert!(!from_leaf.contains(encode_edge(2, 0)));
    assert_eq!(from_leaf.len(), 2);
}

#[test]
fn hub_expands_freely_when_it_is_the_start() {
    let mut engine = HighlightEngine::default();
    engine.rebuild(&forked_thread()).expect("rebuild");

    let from_hub = engine.highlight(&[0]).expect("highlight");
    assert_eq!(from_hub.edges(), vec![(1, 0), (2, 0), (3, 1), (4, 2)]);
}

#[test]
fn union_covers_both_branches() {
    let mut engine = HighlightEngine::default();
    engine.rebuild(&forked_thread()).expect("rebuild");

    let both = engine.highlight(&[3, 4]).expect("highlight");
    assert_eq!(both.edges(), vec![(1, 0), (2, 0), (3, 1), (4, 2)]);

    let reversed = engine.highlight(&[4, 3]).expect("highlight");
    assert_eq!(both, reversed);

    let repeated = engine.highlight(&[3, 3, 4]).expect("highlight");
    assert_eq!(both, repeated);
}

#[test]
fn empty_start_list_gives_an_empty_set() {
    let mut engine = HighlightEngine::default();
    engine.rebuild(&forked_thread()).expect("rebuild");
    assert!(engine.highlight(&[]).expect("highlight").is_empty());
}

#[test]
fn unknown_index_is_reported() {
    let mut engine = HighlightEngine::default();
    engine.rebuild(&forked_thread()).expect("rebuild");
    assert_eq!(
        engine.highlight(&[1, 5]),
        Err(EngineError::UnknownNode {
            index: 5,
            node_count: 5,
        })
    );
}

#[test]
fn second_query_is_served_from_cache() {
    let mut engine = lazy_engine();
    engine.rebuild(&forked_thread()).expect("rebuild");
    assert_eq!(engine.cached_chains(), 0);

    let first = engine.highlight_one(3).expect("highlight");
    let misses = engine.cache_stats().misses;
    let second = engine.highlight_one(3).expect("highlight");

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first, second);
    assert_eq!(engine.cache_stats().misses, misses);
    assert_eq!(engine.cache_stats().hits, 1);
}

#[test]
fn eager_rebuild_warms_every_node() {
    let mut engine = HighlightEngine::default();
    let summary = engine.rebuild(&forked_thread()).expect("rebuild");

    assert!(summary.warmed);
    assert_eq!(summary.node_count, 5);
    assert_eq!(summary.edge_count, 4);
    assert_eq!(summary.hub, Some(0));
    assert_eq!(engine.cached_chains(), 5);

    engine.highlight(&[0, 1, 2, 3, 4]).expect("highlight");
    assert_eq!(engine.cache_stats().misses, 0);
}

#[test]
fn rebuild_replaces_cached_chains() {
    let mut engine = lazy_engine();
    engine.rebuild(&[post(1, &[]), post(2, &[])]).expect("rebuild");
    assert!(engine.highlight_one(1).expect("highlight").is_empty());

    let summary = engine
        .rebuild(&[post(1, &[]), post(2, &[1])])
        .expect("rebuild");
    assert_eq!(summary.generation, 2);
    assert_eq!(engine.cached_chains(), 0);

    let chain = engine.highlight_one(1).expect("highlight");
    assert_eq!(chain.edges(), vec![(1, 0)]);
    assert_eq!(engine.cached_chains(), 1);

    engine.clear_cache();
    assert_eq!(engine.cached_chains(), 0);
    let misses = engine.cache_stats().misses;
    engine.highlight_one(1).expect("highlight");
    assert_eq!(engine.cache_stats().misses, misses + 1);
}

#[test]
fn unresolved_reference_is_ignored() {
    let mut engine = HighlightEngine::default();
    let summary = engine
        .rebuild(&[op(10), post(11, &[10, 9_999])])
        .expect("rebuild");
    assert_eq!(summary.edge_count, 1);
    assert_eq!(
        engine.highlight(&[1]).expect("highlight").edges(),
        vec![(1, 0)]
    );
}

#[test]
fn expired_chains_are_recomputed() {
    let clock = Rc::new(ManualClock::new());
    let mut engine = HighlightEngine::with_clock(
        EngineConfig {
            cache: CacheConfig {
                max: 16,
                ttl: Duration::from_secs(60),
            },
            eager_warm: true,
        },
        Rc::clone(&clock),
    );
    engine.rebuild(&forked_thread()).expect("rebuild");

    clock.advance(Duration::from_secs(60));
    let chain = engine.highlight_one(3).expect("highlight");
    assert_eq!(chain.len(), 2);

    let stats = engine.cache_stats();
    assert_eq!(stats.expirations, 1);
    assert_eq!(stats.misses, 1);
}

#[test]
fn small_cache_still_answers_every_query() {
    let mut engine = HighlightEngine::new(EngineConfig {
        cache: CacheConfig {
            max: 2,
            ttl: Duration::ZERO,
        },
        eager_warm: true,
    });
    engine.rebuild(&forked_thread()).expect("rebuild");
    assert_eq!(engine.cached_chains(), 2);

    let all = engine.highlight(&[0, 1, 2, 3, 4]).expect("highlight");
    assert_eq!(all.len(), 4);
    assert!(engine.cache_stats().evictions > 0);
}
