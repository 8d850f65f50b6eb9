use eframe::egui::{self, Pos2, Rect, Ui};

use super::super::render_utils::{circle_visible, screen_to_world};
use super::super::{RenderGraph, ViewModel};

/// Where the pointer's hover stands relative to the highlight delay.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) enum HoverPhase {
    Idle,
    Waiting { index: usize, progress: f32 },
    Active(usize),
}

/// Delays hover highlights until the pointer has rested on one post for the
/// configured time. Moving to another post restarts the wait.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(in crate::app) struct HoverDebounce {
    candidate: Option<usize>,
    since: f64,
    active: Option<usize>,
}

impl HoverDebounce {
    pub(in crate::app) fn update(&mut self, hovered: Option<usize>, now: f64, delay: f64) -> HoverPhase {
        let Some(index) = hovered else {
            *self = Self::default();
            return HoverPhase::Idle;
        };

        if self.candidate != Some(index) {
            self.candidate = Some(index);
            self.since = now;
            self.active = None;
        }

        if self.active == Some(index) {
            return HoverPhase::Active(index);
        }

        let waited = now - self.since;
        if waited >= delay {
            self.active = Some(index);
            return HoverPhase::Active(index);
        }

        HoverPhase::Waiting {
            index,
            progress: (waited / delay).clamp(0.0, 1.0) as f32,
        }
    }

    pub(in crate::app) fn active(&self) -> Option<usize> {
        self.active
    }

    pub(in crate::app) fn reset(&mut self) {
        *self = Self::default();
    }
}

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.2, 12.0);
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }

    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
            || response.dragged_by(egui::PointerButton::Primary)
        {
            self.pan += response.drag_delta();
        }
    }

    pub(in crate::app) fn collect_visible_indices(rect: Rect, cache: &mut RenderGraph) {
        let scratch = &mut cache.view_scratch;
        scratch.visible_indices.clear();
        for (index, node) in cache.nodes.iter().enumerate() {
            if !node.hidden
                && circle_visible(rect, scratch.screen_positions[index], scratch.screen_radii[index])
            {
                scratch.visible_indices.push(index);
            }
        }
    }

    /// Closest visible post under the pointer, with a few pixels of slack so
    /// small points stay easy to hit.
    pub(in crate::app) fn hovered_index(ui: &Ui, cache: &RenderGraph) -> Option<usize> {
        const HIT_SLACK: f32 = 3.0;

        let pointer: Pos2 = ui.input(|input| input.pointer.hover_pos())?;
        let scratch = &cache.view_scratch;
        scratch
            .visible_indices
            .iter()
            .filter_map(|&index| {
                let distance = scratch.screen_positions[index].distance(pointer);
                (distance <= scratch.screen_radii[index] + HIT_SLACK).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }
}
