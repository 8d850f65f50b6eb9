use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::info;

use super::parse::parse_thread;
use super::post::Thread;

pub fn load_thread(path: &Path) -> Result<Thread> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read thread file {}", path.display()))?;

    let thread = parse_thread(&raw)
        .with_context(|| format!("failed to parse thread file {}", path.display()))?;

    if thread.posts.is_empty() {
        return Err(anyhow!(
            "no valid posts were found in thread file {}",
            path.display()
        ));
    }

    info!(
        path = %path.display(),
        posts = thread.post_count(),
        thread = ?thread.id,
        "loaded thread"
    );

    Ok(thread)
}
