//! Parallel cold-start directory walk using the `ignore` crate, carried
//! over from the upstream analyzer's scanner unchanged (§4.5 "Cold start").

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel as channel;
use recall_extract::Language;

/// Directory names skipped on every cold-start walk, regardless of
/// `.gitignore` contents: VCS metadata, build outputs, and dependency
/// caches for the languages this crate extracts.
pub const DEFAULT_IGNORES: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "target",
    ".next",
    ".nuxt",
    "__pycache__",
    ".pytest_cache",
    "coverage",
    ".nyc_output",
    "vendor",
    ".venv",
    "venv",
    ".tox",
    ".mypy_cache",
    "bin",
    "obj",
];

/// Walk `root` in parallel, returning every file whose extension maps to a
/// supported [`Language`], sorted for deterministic cold-start ordering.
pub fn walk_project(root: &Path) -> Vec<PathBuf> {
    walk_project_cancellable(root, &AtomicBool::new(false))
}

pub fn walk_project_cancellable(root: &Path, cancelled: &AtomicBool) -> Vec<PathBuf> {
    let (tx, rx) = channel::unbounded();

    let mut builder = ignore::WalkBuilder::new(root);
    builder.hidden(false).git_ignore(true).git_global(true).git_exclude(true).follow_links(false);

    let mut overrides = ignore::overrides::OverrideBuilder::new(root);
    for pattern in DEFAULT_IGNORES {
        let _ = overrides.add(&format!("!{pattern}/**"));
        let _ = overrides.add(&format!("!{pattern}"));
    }
    if let Ok(built) = overrides.build() {
        builder.overrides(built);
    }

    let walker = builder.build_parallel();
    let cancelled = Arc::new(AtomicBool::new(cancelled.load(Ordering::Relaxed)));

    walker.run(|| {
        let tx = tx.clone();
        let cancelled = Arc::clone(&cancelled);
        Box::new(move |entry| {
            if cancelled.load(Ordering::Relaxed) {
                return ignore::WalkState::Quit;
            }

            let Ok(entry) = entry else {
                return ignore::WalkState::Continue;
            };
            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                return ignore::WalkState::Continue;
            }

            let path = entry.path().to_path_buf();
            let Some(path_str) = path.to_str() else {
                return ignore::WalkState::Continue;
            };
            if Language::from_path(path_str).is_some() {
                let _ = tx.send(path);
            }

            ignore::WalkState::Continue
        })
    });

    drop(tx);
    let mut files: Vec<PathBuf> = rx.into_iter().collect();
    files.sort();
    files
}
