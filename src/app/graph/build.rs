use eframe::egui::{Vec2, vec2};
use reply_grapher::thread::Post;

use super::super::render_utils::{post_radius, uid_color};
use super::super::{RenderGraph, RenderNode, ViewModel, ViewScratch};

const PLOT_WIDTH: f32 = 1400.0;
const PLOT_HEIGHT: f32 = 900.0;

/// Maps a post to plot space: time along x, thread position along y with
/// later posts higher up.
fn post_world_pos(index: usize, post_count: usize, time_fraction: f32) -> Vec2 {
    let position = (index + 1) as f32 / post_count.max(1) as f32;
    vec2(
        (time_fraction - 0.5) * PLOT_WIDTH,
        (0.5 - position) * PLOT_HEIGHT,
    )
}

impl ViewModel {
    pub(in crate::app) fn is_post_hidden(&self, post: &Post) -> bool {
        if let Some(only) = &self.single_flag {
            return post.flag.as_deref() != Some(only.as_str());
        }
        post.flag
            .as_ref()
            .is_some_and(|flag| self.hidden_flags.contains(flag))
    }

    pub(in crate::app) fn rebuild_render_graph(&mut self) {
        self.render_graph_revision = self.render_graph_revision.wrapping_add(1);
        self.search_match_cache = None;
        self.graph_dirty = false;

        let posts = &self.thread.posts;
        if posts.is_empty() {
            self.graph_cache = None;
            self.visible_node_count = 0;
            self.visible_edge_count = 0;
            return;
        }

        let first_time = posts.iter().map(|post| post.time).min();
        let last_time = posts.iter().map(|post| post.time).max();
        let span_ms = match (first_time, last_time) {
            (Some(first), Some(last)) => (last - first).num_milliseconds().max(1) as f32,
            _ => 1.0,
        };

        let nodes = posts
            .iter()
            .enumerate()
            .map(|(index, post)| {
                let time_fraction = first_time
                    .map(|first| (post.time - first).num_milliseconds() as f32 / span_ms)
                    .unwrap_or(0.5);
                let reply_count = self
                    .engine
                    .graph()
                    .map(|graph| graph.reply_count(post.number))
                    .unwrap_or(0);

                RenderNode {
                    world_pos: post_world_pos(index, posts.len(), time_fraction),
                    base_radius: post_radius(reply_count),
                    uid_color: post.uid.as_deref().map(uid_color),
                    hidden: self.is_post_hidden(post),
                    is_op: post.is_op,
                }
            })
            .collect::<Vec<_>>();

        self.visible_node_count = nodes.iter().filter(|node| !node.hidden).count();
        self.graph_cache = Some(RenderGraph {
            nodes,
            view_scratch: ViewScratch {
                screen_positions: Vec::new(),
                screen_radii: Vec::new(),
                visible_indices: Vec::new(),
            },
        });
    }
}
