use std::collections::BTreeSet;

use eframe::egui::{self, Align, Color32, Context, Layout, RichText, Vec2};
use reply_grapher::engine::HighlightEngine;
use reply_grapher::thread::{Thread, ThreadReport};
use tracing::{info, warn};

use super::super::graph::HoverDebounce;
use super::super::{ViewModel, ViewOptions, ViewerConfig};

impl ViewModel {
    pub(in crate::app) fn new(thread: Thread, config: &ViewerConfig) -> Self {
        let report = ThreadReport::analyze(&thread);
        let mut model = Self {
            thread,
            report,
            engine: HighlightEngine::new(config.engine),
            summary: None,
            engine_error: None,
            signs: Default::default(),
            search: String::new(),
            selected: None,
            hover: HoverDebounce::default(),
            hovered_flag: None,
            hidden_flags: BTreeSet::new(),
            single_flag: None,
            options: ViewOptions {
                color_by_uid: true,
                detect_spam: true,
                check_single_post_op: true,
                flag_highlight: true,
                hover_delay_ms: config.hover_delay.as_secs_f32() * 1000.0,
            },
            pan: Vec2::ZERO,
            zoom: 1.0,
            graph_dirty: true,
            render_graph_revision: 0,
            graph_cache: None,
            search_match_cache: None,
            active_highlight: None,
            last_refresh_note: None,
            visible_node_count: 0,
            visible_edge_count: 0,
        };
        model.rebuild_engine();
        model
    }

    fn rebuild_engine(&mut self) {
        match self.engine.rebuild(&self.thread.posts) {
            Ok(summary) => {
                self.summary = Some(summary);
                self.engine_error = None;
            }
            Err(error) => {
                warn!(%error, "could not build reply graph");
                self.engine_error = Some(error.to_string());
            }
        }
        self.active_highlight = None;
        self.graph_dirty = true;
    }

    /// Folds a freshly read copy of the thread into the current one. Only
    /// posts past the newest known number are taken.
    pub(in crate::app) fn merge_refresh(&mut self, incoming: Thread) {
        let added = self.thread.merge_new_posts(incoming);
        if added == 0 {
            self.last_refresh_note = Some("no new posts".to_owned());
            return;
        }

        info!(added, total = self.thread.post_count(), "merged new posts");
        self.report = ThreadReport::analyze(&self.thread);
        self.rebuild_engine();
        self.last_refresh_note = Some(format!("{added} new posts"));
    }

    pub(in crate::app) fn set_selected(&mut self, selected: Option<usize>) {
        if self.selected == selected {
            return;
        }
        self.selected = selected;
        self.active_highlight = None;
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        if self.graph_dirty {
            self.rebuild_render_graph();
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("reply-grapher");
                    ui.separator();
                    match self.thread.id {
                        Some(id) => ui.label(format!("thread: {id}")),
                        None => ui.label("thread: unknown"),
                    };
                    ui.label(format!("posts: {}", self.thread.post_count()));
                    if let Some(summary) = &self.summary {
                        ui.label(format!("replies: {}", summary.edge_count));
                    }
                    ui.label(format!("IDs: {}", self.report.unique_uids));

                    if self.options.detect_spam && self.report.spam_trend {
                        ui.label(
                            RichText::new("SPAM")
                                .strong()
                                .color(Color32::from_rgb(235, 87, 87)),
                        )
                        .on_hover_text("Post count grows almost perfectly linearly over time.");
                    }
                    if self.options.check_single_post_op && self.report.single_post_op {
                        ui.label(
                            RichText::new("1PBTID")
                                .strong()
                                .color(Color32::from_rgb(235, 170, 70)),
                        )
                        .on_hover_text("The OP's ID has posted only once in this thread.");
                    }

                    let reload_button = ui.add_enabled(!is_loading, egui::Button::new("Reload"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(format!(
                            "visible: {} posts / {} curves",
                            self.visible_node_count, self.visible_edge_count
                        ));
                        if let Some(note) = &self.last_refresh_note {
                            ui.label(note.as_str());
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(error) = &self.engine_error {
                ui.colored_label(Color32::from_rgb(235, 87, 87), error.as_str());
            }
            self.draw_graph(ui);
        });
    }
}
