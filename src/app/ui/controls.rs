use eframe::egui::{self, RichText, Ui};
use reply_grapher::thread::analysis::flag_summary;

use super::super::ViewModel;

const MAX_HOVER_DELAY_MS: f32 = 1000.0;

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Thread Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search (number, ID, flag or text)")
            .on_hover_text("Fuzzy-highlight matching posts without hiding the rest.");
        ui.text_edit_singleline(&mut self.search);

        ui.separator();
        ui.label(RichText::new("Options").strong());

        let mut render_changed = false;
        render_changed |= ui
            .checkbox(&mut self.options.color_by_uid, "Colour borders by poster ID")
            .changed();
        ui.checkbox(&mut self.options.detect_spam, "Flag linear spam trend");
        ui.checkbox(&mut self.options.check_single_post_op, "Flag single-post OP (1PBTID)");
        if ui
            .checkbox(&mut self.options.flag_highlight, "Highlight chains on flag hover")
            .changed()
        {
            self.active_highlight = None;
        }

        ui.add(
            egui::Slider::new(&mut self.options.hover_delay_ms, 0.0..=MAX_HOVER_DELAY_MS)
                .text("hover delay (ms)")
                .integer(),
        );

        ui.horizontal(|ui| {
            if ui.button("Reset view").clicked() {
                self.pan = egui::Vec2::ZERO;
                self.zoom = 1.0;
            }
            if ui.button("Clear selection").clicked() {
                self.set_selected(None);
                self.hover.reset();
            }
        });

        ui.separator();
        self.draw_cache_stats(ui);

        ui.separator();
        render_changed |= self.draw_flag_list(ui);

        if render_changed {
            self.graph_dirty = true;
            self.active_highlight = None;
        }
    }

    fn draw_cache_stats(&self, ui: &mut Ui) {
        ui.label(RichText::new("Highlight cache").strong());
        let stats = self.engine.cache_stats();
        ui.label(format!(
            "chains cached: {}  |  generation: {}",
            self.engine.cached_chains(),
            self.engine.generation()
        ));
        ui.small(format!(
            "hits {}  misses {}  evicted {}  expired {}",
            stats.hits, stats.misses, stats.evictions, stats.expirations
        ));
    }

    /// Returns true when flag visibility changed.
    fn draw_flag_list(&mut self, ui: &mut Ui) -> bool {
        ui.label(RichText::new("Flags").strong());

        let flags = flag_summary(&self.thread.posts);
        if flags.is_empty() {
            ui.label("No flags in this thread.");
            self.hovered_flag = None;
            return false;
        }

        let mut changed = false;
        let mut hovered_flag = None;

        egui::ScrollArea::vertical()
            .id_salt("flag_list_scroll")
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for entry in &flags {
                    ui.horizontal(|ui| {
                        let mut visible = !self.hidden_flags.contains(&entry.flag);
                        if ui.checkbox(&mut visible, "").changed() {
                            if visible {
                                self.hidden_flags.remove(&entry.flag);
                            } else {
                                self.hidden_flags.insert(entry.flag.clone());
                            }
                            changed = true;
                        }

                        let label = ui.label(format!("{} ({})", entry.flag, entry.posts));
                        if label.hovered() {
                            hovered_flag = Some(entry.flag.clone());
                        }

                        let only = self.single_flag.as_deref() == Some(entry.flag.as_str());
                        if ui.selectable_label(only, "only").clicked() {
                            self.single_flag = if only { None } else { Some(entry.flag.clone()) };
                            changed = true;
                        }
                    });
                }
            });

        if self.hovered_flag != hovered_flag {
            self.hovered_flag = hovered_flag;
            self.active_highlight = None;
        }
        changed
    }
}
