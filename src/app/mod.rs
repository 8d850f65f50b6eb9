use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use eframe::egui::{self, Color32, Context, Pos2, Vec2};
use reply_grapher::engine::{
    EngineConfig, GraphSummary, HighlightEngine, HighlightSet, SignTable,
};
use reply_grapher::thread::{Thread, ThreadReport, load_thread};
use tracing::{error, info, warn};

mod graph;
mod highlight;
mod render_utils;
mod ui;

use self::graph::HoverDebounce;

#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub thread_path: Option<PathBuf>,
    pub engine: EngineConfig,
    pub hover_delay: Duration,
    /// `None` disables periodic refresh.
    pub refresh_interval: Option<Duration>,
}

type LoadResult = Result<Thread, String>;

pub struct ReplyGrapherApp {
    config: ViewerConfig,
    path_input: String,
    state: AppState,
    reload_rx: Option<PendingLoad>,
    last_refresh: Instant,
}

enum AppState {
    NoFile,
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct PendingLoad {
    rx: Receiver<LoadResult>,
    kind: LoadKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LoadKind {
    Reload,
    Refresh,
}

struct ViewModel {
    thread: Thread,
    report: ThreadReport,
    engine: HighlightEngine,
    summary: Option<GraphSummary>,
    engine_error: Option<String>,
    signs: SignTable,
    search: String,
    selected: Option<usize>,
    hover: HoverDebounce,
    hovered_flag: Option<String>,
    hidden_flags: BTreeSet<String>,
    single_flag: Option<String>,
    options: ViewOptions,
    pan: Vec2,
    zoom: f32,
    graph_dirty: bool,
    render_graph_revision: u64,
    graph_cache: Option<RenderGraph>,
    search_match_cache: Option<SearchMatchCache>,
    active_highlight: Option<ActiveHighlight>,
    last_refresh_note: Option<String>,
    visible_node_count: usize,
    visible_edge_count: usize,
}

#[derive(Clone, Copy, Debug)]
struct ViewOptions {
    color_by_uid: bool,
    detect_spam: bool,
    check_single_post_op: bool,
    flag_highlight: bool,
    hover_delay_ms: f32,
}

struct SearchMatchCache {
    query: String,
    graph_revision: u64,
    matches: Arc<HashSet<usize>>,
}

struct RenderGraph {
    nodes: Vec<RenderNode>,
    view_scratch: ViewScratch,
}

struct ViewScratch {
    screen_positions: Vec<Pos2>,
    screen_radii: Vec<f32>,
    visible_indices: Vec<usize>,
}

struct RenderNode {
    world_pos: Vec2,
    base_radius: f32,
    uid_color: Option<Color32>,
    hidden: bool,
    is_op: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum HighlightSource {
    Post(usize),
    Flag(String),
}

struct ActiveHighlight {
    source: HighlightSource,
    generation: u64,
    edges: HighlightSet,
    nodes: HashSet<usize>,
}

impl ReplyGrapherApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: ViewerConfig) -> Self {
        let path_input = config
            .thread_path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_default();
        let state = match &config.thread_path {
            Some(path) => Self::start_load(path.clone()),
            None => AppState::NoFile,
        };

        Self {
            config,
            path_input,
            state,
            reload_rx: None,
            last_refresh: Instant::now(),
        }
    }

    fn spawn_load(path: PathBuf) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_thread(&path).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(path: PathBuf) -> AppState {
        info!(path = %path.display(), "loading thread");
        AppState::Loading {
            rx: Self::spawn_load(path),
        }
    }

    fn show_path_prompt(
        ui: &mut egui::Ui,
        path_input: &mut String,
        thread_path: &mut Option<PathBuf>,
    ) -> Option<AppState> {
        let mut transition = None;
        ui.horizontal(|ui| {
            ui.label("Thread file:");
            ui.text_edit_singleline(path_input);
            let path = path_input.trim();
            if ui
                .add_enabled(!path.is_empty(), egui::Button::new("Open"))
                .clicked()
            {
                let path = PathBuf::from(path);
                *thread_path = Some(path.clone());
                transition = Some(Self::start_load(path));
            }
        });
        transition
    }
}

impl eframe::App for ReplyGrapherApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::NoFile => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("No thread loaded");
                        ui.add_space(8.0);
                    });
                    transition = Self::show_path_prompt(
                        ui,
                        &mut self.path_input,
                        &mut self.config.thread_path,
                    );
                });
            }
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => {
                        transition = Some(match result {
                            Ok(thread) => AppState::Ready(Box::new(ViewModel::new(
                                thread,
                                &self.config,
                            ))),
                            Err(message) => AppState::Error(message),
                        });
                        self.last_refresh = Instant::now();
                    }
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => {
                        transition =
                            Some(AppState::Error("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading thread...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint_after(Duration::from_millis(50));
            }
            AppState::Error(message) => {
                let message = message.clone();
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load thread");
                    ui.add_space(6.0);
                    ui.label(message.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked()
                        && let Some(path) = self.config.thread_path.clone()
                    {
                        transition = Some(Self::start_load(path));
                    }
                    ui.separator();
                    if let Some(next) = Self::show_path_prompt(
                        ui,
                        &mut self.path_input,
                        &mut self.config.thread_path,
                    ) {
                        transition = Some(next);
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self
                    .reload_rx
                    .as_ref()
                    .is_some_and(|pending| pending.kind == LoadKind::Reload);
                model.show(ctx, &mut reload_requested, is_reloading);

                if let Some(path) = self.config.thread_path.clone()
                    && self.reload_rx.is_none()
                {
                    if reload_requested {
                        self.reload_rx = Some(PendingLoad {
                            rx: Self::spawn_load(path),
                            kind: LoadKind::Reload,
                        });
                    } else if refresh_due(self.config.refresh_interval, self.last_refresh) {
                        self.last_refresh = Instant::now();
                        self.reload_rx = Some(PendingLoad {
                            rx: Self::spawn_load(path),
                            kind: LoadKind::Refresh,
                        });
                    }
                }

                if let Some(pending) = self.reload_rx.take() {
                    match pending.rx.try_recv() {
                        Ok(Ok(thread)) => match pending.kind {
                            LoadKind::Reload => {
                                self.last_refresh = Instant::now();
                                transition = Some(AppState::Ready(Box::new(ViewModel::new(
                                    thread,
                                    &self.config,
                                ))));
                            }
                            LoadKind::Refresh => model.merge_refresh(thread),
                        },
                        Ok(Err(message)) => match pending.kind {
                            LoadKind::Reload => transition = Some(AppState::Error(message)),
                            LoadKind::Refresh => {
                                warn!(error = %message, "periodic refresh failed");
                                model.last_refresh_note = Some(format!("refresh failed: {message}"));
                            }
                        },
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(pending);
                        }
                        Err(TryRecvError::Disconnected) => {
                            error!("background load worker disconnected");
                            if pending.kind == LoadKind::Reload {
                                transition = Some(AppState::Error(
                                    "Background load worker disconnected".to_owned(),
                                ));
                            }
                        }
                    }
                }

                if self.reload_rx.is_some() {
                    ctx.request_repaint_after(Duration::from_millis(100));
                } else if let Some(interval) = self.config.refresh_interval {
                    let remaining = interval.saturating_sub(self.last_refresh.elapsed());
                    ctx.request_repaint_after(remaining.max(Duration::from_millis(100)));
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}

fn refresh_due(interval: Option<Duration>, last_refresh: Instant) -> bool {
    interval.is_some_and(|interval| last_refresh.elapsed() >= interval)
}
