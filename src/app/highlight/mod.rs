use std::collections::HashSet;

use reply_grapher::engine::{EngineError, HighlightSet};
use tracing::warn;

use super::{ActiveHighlight, HighlightSource, ViewModel};

fn highlight_nodes(edges: &HighlightSet, starts: &[usize]) -> HashSet<usize> {
    let mut nodes = edges.nodes();
    nodes.extend(starts.iter().copied());
    nodes
}

impl ViewModel {
    /// Hover beats a hovered flag, which beats the clicked post.
    fn highlight_source(&self) -> Option<HighlightSource> {
        if let Some(index) = self.hover.active() {
            return Some(HighlightSource::Post(index));
        }
        if self.options.flag_highlight
            && let Some(flag) = &self.hovered_flag
        {
            return Some(HighlightSource::Flag(flag.clone()));
        }
        self.selected.map(HighlightSource::Post)
    }

    fn compute_highlight(
        &mut self,
        source: &HighlightSource,
    ) -> Result<(HighlightSet, Vec<usize>), EngineError> {
        match source {
            HighlightSource::Post(index) => {
                let edges = self.engine.highlight_one(*index)?;
                Ok((HighlightSet::clone(&edges), vec![*index]))
            }
            HighlightSource::Flag(flag) => {
                let starts = self
                    .thread
                    .indices_with_flag(flag)
                    .into_iter()
                    .filter(|&index| {
                        self.thread
                            .posts
                            .get(index)
                            .is_some_and(|post| !self.is_post_hidden(post))
                    })
                    .collect::<Vec<_>>();
                let edges = self.engine.highlight(&starts)?;
                Ok((edges, starts))
            }
        }
    }

    pub(in crate::app) fn refresh_highlight(&mut self) {
        let Some(source) = self.highlight_source() else {
            self.active_highlight = None;
            return;
        };

        let generation = self.engine.generation();
        if self
            .active_highlight
            .as_ref()
            .is_some_and(|active| active.source == source && active.generation == generation)
        {
            return;
        }

        match self.compute_highlight(&source) {
            Ok((edges, starts)) => {
                let nodes = highlight_nodes(&edges, &starts);
                self.active_highlight = Some(ActiveHighlight {
                    source,
                    generation,
                    edges,
                    nodes,
                });
            }
            Err(error) => {
                warn!(%error, ?source, "highlight query failed");
                self.engine_error = Some(error.to_string());
                self.active_highlight = None;
            }
        }
    }

    pub(in crate::app) fn is_highlighted_post(&self, index: usize) -> bool {
        self.active_highlight
            .as_ref()
            .is_some_and(|active| active.nodes.contains(&index))
    }
}
