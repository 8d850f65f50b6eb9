use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::epaint::CubicBezierShape;
use eframe::egui::{self, Align2, Color32, FontId, Painter, Pos2, Rect, Sense, Stroke, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use reply_grapher::engine::cubic_controls;
use reply_grapher::thread::Post;
use reply_grapher::util::format_post_time;

use super::super::render_utils::{
    blend_color, curve_visible, dim_color, draw_background, draw_progress_ring, world_to_screen,
};
use super::super::{RenderGraph, SearchMatchCache, ViewModel};
use super::HoverPhase;

const OP_COLOR: Color32 = Color32::from_rgb(246, 206, 104);
const POST_COLOR: Color32 = Color32::from_rgb(108, 170, 232);
const CHAIN_COLOR: Color32 = Color32::from_rgb(241, 146, 94);
const MATCH_COLOR: Color32 = Color32::from_rgb(103, 226, 196);

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

fn post_matches(matcher: &SkimMatcherV2, post: &Post, query: &str) -> bool {
    post.number.to_string().contains(query)
        || [post.uid.as_deref(), post.flag.as_deref()]
            .into_iter()
            .flatten()
            .any(|text| fuzzy_match_score(matcher, text, query).is_some())
        || fuzzy_match_score(matcher, &post.message, query).is_some()
}

impl ViewModel {
    fn update_screen_space(rect: Rect, pan: egui::Vec2, zoom: f32, cache: &mut RenderGraph) {
        let scratch = &mut cache.view_scratch;
        scratch.screen_positions.clear();
        scratch.screen_radii.clear();
        for node in &cache.nodes {
            scratch
                .screen_positions
                .push(world_to_screen(rect, pan, zoom, node.world_pos));
            scratch
                .screen_radii
                .push((node.base_radius * zoom.powf(0.35)).clamp(2.5, 24.0));
        }
    }

    fn cached_pseudo_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let search_query = self.search.trim();
        if search_query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.search_match_cache
            && cached.graph_revision == self.render_graph_revision
            && cached.query == search_query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let matches = self
            .thread
            .posts
            .iter()
            .enumerate()
            .filter(|(_, post)| post_matches(&matcher, post, search_query))
            .map(|(index, _)| index)
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.search_match_cache = Some(SearchMatchCache {
            query: search_query.to_owned(),
            graph_revision: self.render_graph_revision,
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        if self.graph_dirty {
            self.rebuild_render_graph();
        }

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        draw_background(&painter, rect, self.pan, self.zoom);

        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pan(&response);

        let pseudo_matches = self.cached_pseudo_matches();

        let Some(mut cache) = self.graph_cache.take() else {
            self.visible_node_count = 0;
            self.visible_edge_count = 0;
            ui.label("No posts to display.");
            return;
        };

        Self::update_screen_space(rect, self.pan, self.zoom, &mut cache);
        Self::collect_visible_indices(rect, &mut cache);
        self.visible_node_count = cache.view_scratch.visible_indices.len();

        let hovered = Self::hovered_index(ui, &cache);
        if hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        let now = ui.input(|input| input.time);
        let delay = f64::from(self.options.hover_delay_ms.max(0.0)) / 1000.0;
        let phase = self.hover.update(hovered, now, delay);
        if matches!(phase, HoverPhase::Waiting { .. }) {
            ui.ctx().request_repaint();
        }

        if response.clicked_by(egui::PointerButton::Primary) {
            self.set_selected(hovered);
        }

        self.refresh_highlight();
        self.paint_edges(&painter, rect, &cache);
        self.paint_nodes(&painter, &cache, hovered, phase, pseudo_matches.as_deref());

        if let Some(index) = hovered
            && let Some(post) = self.thread.posts.get(index)
        {
            let replies = self
                .engine
                .graph()
                .map(|graph| graph.reply_count(post.number))
                .unwrap_or(0);
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!(
                    "No.{}  |  {}  |  replies {}",
                    post.number,
                    format_post_time(post.time),
                    replies
                ),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        self.graph_cache = Some(cache);
    }

    fn paint_edges(&mut self, painter: &Painter, rect: Rect, cache: &RenderGraph) {
        let Some(graph) = self.engine.graph() else {
            self.visible_edge_count = 0;
            return;
        };

        let highlight = self.active_highlight.as_ref();
        let zoom_sqrt = self.zoom.sqrt();
        let positions = &cache.view_scratch.screen_positions;
        let mut visible_edge_count = 0usize;

        // Faint edges first so chains draw on top.
        for highlighted_pass in [false, true] {
            for (source, target) in graph.edges() {
                let (Some(source_node), Some(target_node)) =
                    (cache.nodes.get(source), cache.nodes.get(target))
                else {
                    continue;
                };
                if source_node.hidden || target_node.hidden {
                    continue;
                }

                let in_chain = highlight.is_some_and(|active| active.edges.contains_edge(source, target));
                if in_chain != highlighted_pass {
                    continue;
                }

                let (Some(source_number), Some(target_number)) =
                    (graph.number_of(source), graph.number_of(target))
                else {
                    continue;
                };
                let from = positions[source];
                let to = positions[target];
                let sign = self.signs.sign_for(source_number, target_number);
                let (c1, c2) = cubic_controls(sign, [from.x, from.y], [to.x, to.y]);
                let points = [from, Pos2::new(c1[0], c1[1]), Pos2::new(c2[0], c2[1]), to];
                if !curve_visible(rect, &points) {
                    continue;
                }

                let stroke = if in_chain {
                    Stroke::new((2.4 * zoom_sqrt).clamp(1.4, 4.5), CHAIN_COLOR)
                } else if highlight.is_some() {
                    Stroke::new(
                        (0.8 * zoom_sqrt).clamp(0.4, 1.6),
                        Color32::from_rgba_unmultiplied(110, 120, 135, 35),
                    )
                } else {
                    Stroke::new(
                        (1.1 * zoom_sqrt).clamp(0.6, 2.2),
                        Color32::from_rgba_unmultiplied(120, 132, 150, 110),
                    )
                };

                painter.add(CubicBezierShape::from_points_stroke(
                    points,
                    false,
                    Color32::TRANSPARENT,
                    stroke,
                ));
                visible_edge_count += 1;
            }
        }

        self.visible_edge_count = visible_edge_count;
    }

    fn paint_nodes(
        &self,
        painter: &Painter,
        cache: &RenderGraph,
        hovered: Option<usize>,
        phase: HoverPhase,
        pseudo_matches: Option<&HashSet<usize>>,
    ) {
        let highlight_active = self.active_highlight.is_some();
        let pseudo_active = pseudo_matches.is_some_and(|matches| !matches.is_empty());

        for &index in &cache.view_scratch.visible_indices {
            let node = &cache.nodes[index];
            let position = cache.view_scratch.screen_positions[index];
            let radius = cache.view_scratch.screen_radii[index];

            let base_color = if node.is_op { OP_COLOR } else { POST_COLOR };
            let is_match = pseudo_matches.is_some_and(|matches| matches.contains(&index));
            let color = if hovered == Some(index) {
                Color32::from_rgb(255, 164, 101)
            } else if self.is_highlighted_post(index) {
                blend_color(base_color, CHAIN_COLOR, 0.6)
            } else if is_match {
                blend_color(base_color, MATCH_COLOR, 0.7)
            } else if highlight_active {
                dim_color(base_color, 0.45)
            } else if pseudo_active {
                dim_color(base_color, 0.4)
            } else {
                base_color
            };

            painter.circle_filled(position, radius, color);

            let border = match node.uid_color {
                Some(uid_color) if self.options.color_by_uid => Stroke::new(2.2, uid_color),
                _ => Stroke::new(1.0, Color32::from_rgba_unmultiplied(12, 12, 12, 190)),
            };
            painter.circle_stroke(position, radius, border);

            if self.selected == Some(index) {
                painter.circle_stroke(
                    position,
                    radius + 4.0,
                    Stroke::new(1.6, Color32::from_rgba_unmultiplied(245, 206, 93, 200)),
                );
            }
        }

        if let HoverPhase::Waiting { index, progress } = phase
            && let (Some(position), Some(radius)) = (
                cache.view_scratch.screen_positions.get(index),
                cache.view_scratch.screen_radii.get(index),
            )
        {
            draw_progress_ring(
                painter,
                *position,
                radius + 5.0,
                progress,
                Stroke::new(2.0, Color32::from_gray(230)),
            );
        }
    }
}
