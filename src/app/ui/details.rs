use eframe::egui::{self, RichText, Ui};
use reply_grapher::util::{format_post_time, truncate_chars};

use super::super::ViewModel;

const MESSAGE_PREVIEW_CHARS: usize = 1500;

impl ViewModel {
    fn details_index(&self) -> Option<usize> {
        self.hover.active().or(self.selected)
    }

    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Post Details");
        ui.add_space(6.0);

        let Some(index) = self.details_index() else {
            ui.label("Hover or click a post in the graph.");
            return;
        };
        let Some(post) = self.thread.posts.get(index) else {
            ui.label("That post is no longer part of the thread.");
            return;
        };
        let Some(graph) = self.engine.graph() else {
            ui.label("Reply graph is not available.");
            return;
        };

        let mut title = format!("No.{}", post.number);
        if post.is_op {
            title.push_str("  (OP)");
        }
        ui.label(RichText::new(title).strong());
        ui.label(format_post_time(post.time));
        ui.add_space(6.0);

        if let Some(uid) = &post.uid {
            let posts_by_id = self.thread.indices_with_uid(uid).len();
            ui.label(format!("ID: {uid}  ({posts_by_id} posts by this ID)"));
        }
        if let Some(flag) = &post.flag {
            ui.label(format!("Flag: {flag}"));
        }
        ui.label(format!("Replies received: {}", graph.reply_count(post.number)));
        if let Some(active) = &self.active_highlight {
            ui.label(format!(
                "Chain: {} posts, {} replies",
                active.nodes.len(),
                active.edges.len()
            ));
        }

        let mut jump_to = None;

        ui.separator();
        ui.label(RichText::new("Replies to").strong());
        if graph.forward(index).is_empty() {
            ui.label("none");
        } else {
            ui.horizontal_wrapped(|ui| {
                for &target in graph.forward(index) {
                    if let Some(number) = graph.number_of(target)
                        && ui.link(format!(">>{number}")).clicked()
                    {
                        jump_to = Some(target);
                    }
                }
            });
        }

        ui.label(RichText::new("Replied to by").strong());
        if graph.reverse(index).is_empty() {
            ui.label("none");
        } else {
            ui.horizontal_wrapped(|ui| {
                for &source in graph.reverse(index) {
                    if let Some(number) = graph.number_of(source)
                        && ui.link(format!(">>{number}")).clicked()
                    {
                        jump_to = Some(source);
                    }
                }
            });
        }

        ui.separator();
        ui.label(RichText::new("Message").strong());
        if post.message.trim().is_empty() {
            ui.label("(no text)");
        } else {
            let preview = truncate_chars(&post.message, MESSAGE_PREVIEW_CHARS);
            egui::ScrollArea::vertical()
                .id_salt("message_scroll")
                .max_height(360.0)
                .show(ui, |ui| {
                    ui.label(preview);
                });
        }

        if let Some(target) = jump_to {
            self.set_selected(Some(target));
        }
    }
}
