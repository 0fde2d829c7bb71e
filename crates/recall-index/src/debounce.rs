//! Per-path debounce table for the live watcher (§4.5 "Expansion — watcher
//! implementation"): `add`/`change` events for the same path collapse into
//! one `indexFile` call every 500 ms; `unlink` bypasses the table.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Changed(PathBuf),
    Removed(PathBuf),
}

/// Coalesces a burst of `Changed` events into one pending entry per path;
/// `ready()` drains paths whose window has elapsed.
pub struct Debouncer {
    pending: HashMap<PathBuf, Instant>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self { pending: HashMap::new() }
    }

    pub fn touch(&mut self, path: PathBuf) {
        self.pending.insert(path, Instant::now());
    }

    /// Removes and returns every path whose debounce window has elapsed as
    /// of `now`. Call on a tick (e.g. every 100 ms) from the watcher loop.
    pub fn ready(&mut self, now: Instant) -> Vec<PathBuf> {
        let ready: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|(_, touched)| now.duration_since(**touched) >= DEBOUNCE_WINDOW)
            .map(|(path, _)| path.clone())
            .collect();
        for path in &ready {
            self.pending.remove(path);
        }
        ready
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_single_path_touched_twice_is_only_pending_once() {
        let mut d = Debouncer::new();
        d.touch(PathBuf::from("a.rs"));
        d.touch(PathBuf::from("a.rs"));
        assert_eq!(d.pending_count(), 1);
    }

    #[test]
    fn ready_returns_nothing_before_the_window_elapses() {
        let mut d = Debouncer::new();
        d.touch(PathBuf::from("a.rs"));
        assert!(d.ready(Instant::now()).is_empty());
    }

    #[test]
    fn ready_drains_paths_past_the_window() {
        let mut d = Debouncer::new();
        d.touch(PathBuf::from("a.rs"));
        let later = Instant::now() + DEBOUNCE_WINDOW + Duration::from_millis(1);
        let ready = d.ready(later);
        assert_eq!(ready, vec![PathBuf::from("a.rs")]);
        assert_eq!(d.pending_count(), 0);
    }
}
