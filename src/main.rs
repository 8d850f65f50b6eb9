mod app;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use reply_grapher::engine::{CacheConfig, EngineConfig};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::app::{ReplyGrapherApp, ViewerConfig};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Thread JSON file to open.
    thread_file: Option<PathBuf>,

    /// Maximum number of reply chains kept in the highlight cache.
    #[arg(long, default_value_t = 2000)]
    cache_max: usize,

    /// Seconds a cached chain stays valid; 0 keeps chains until evicted.
    #[arg(long, default_value_t = 1800)]
    cache_ttl_secs: u64,

    /// How long the pointer must rest on a post before its chain lights up.
    #[arg(long, default_value_t = 200)]
    hover_delay_ms: u64,

    /// Seconds between re-reads of the thread file; 0 disables refreshing.
    #[arg(long, default_value_t = 15)]
    refresh_secs: u64,

    /// Compute chains on demand instead of for every post after each rebuild.
    #[arg(long)]
    no_warm: bool,
}

impl Args {
    fn viewer_config(&self) -> ViewerConfig {
        ViewerConfig {
            thread_path: self.thread_file.clone(),
            engine: EngineConfig {
                cache: CacheConfig {
                    max: self.cache_max,
                    ttl: Duration::from_secs(self.cache_ttl_secs),
                },
                eager_warm: !self.no_warm,
            },
            hover_delay: Duration::from_millis(self.hover_delay_ms),
            refresh_interval: (self.refresh_secs > 0)
                .then(|| Duration::from_secs(self.refresh_secs)),
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("REPLY_GRAPHER_LOG")
        .unwrap_or_else(|_| EnvFilter::new("reply_grapher=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

fn main() -> eframe::Result<()> {
    init_tracing();

    let args = Args::parse();
    let config = args.viewer_config();
    info!(?config, "starting viewer");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "reply-grapher",
        options,
        Box::new(move |cc| Ok(Box::new(ReplyGrapherApp::new(cc, config)))),
    )
}
