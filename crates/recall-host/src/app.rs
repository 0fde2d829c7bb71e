//! Wires every component together into one running process (§6 "Expansion
//! — host binary"). Single-threaded cooperative loop: the watcher tick and
//! the bridge drain interleave on one thread, which sidesteps sharing
//! `Store`'s reader connection across OS threads.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Receiver;
use recall_bridge::{BridgeRequest, HostDispatcher, WorkerBridge, WorkerEvent, WorkerHandle};
use recall_core::config::RecallConfig;
use recall_core::Result;
use recall_decider::{Observer, StepInjectionDecider};
use recall_embeddings::EmbeddingService;
use recall_graph::GraphDatabase;
use recall_index::{IncrementalIndexer, ProjectWatcher};
use recall_memory::MemoryService;
use recall_storage::Store;
use tracing::info;
use uuid::Uuid;

const WATCH_POLL: Duration = Duration::from_millis(50);

pub struct RecallApp {
    store: Store,
    embeddings: EmbeddingService,
    graph: GraphDatabase,
    indexer: IncrementalIndexer,
    memory_service: MemoryService,
    decider: StepInjectionDecider,
    observer: Observer,
    bridge: Arc<WorkerBridge>,
    dispatch_rx: Receiver<(Uuid, BridgeRequest)>,
    event_rx: Receiver<WorkerEvent>,
    scratchpad_capacity: usize,
    project_id: String,
    project_root: PathBuf,
}

impl RecallApp {
    /// Opens/migrates the store, loads the graph mirror, selects an
    /// embedding provider, and builds the bridge's pending table. Does not
    /// touch the project filesystem beyond the database path — the
    /// cold-start walk happens in [`Self::run`].
    pub fn bootstrap(config: RecallConfig, project_id: impl Into<String>, project_root: impl Into<PathBuf>) -> Result<(Self, WorkerHandle)> {
        let project_root = project_root.into();
        let db_path = match &config.database_path {
            Some(path) => PathBuf::from(path),
            None => project_root_db_default(&project_root),
        };
        let store = Store::open(&db_path)?;
        let embeddings = EmbeddingService::initialize(&config.embedding)?;
        let graph = GraphDatabase::new();
        graph.load_mirror(&store)?;

        let (bridge, dispatch_rx, event_rx) = WorkerBridge::new(&config.bridge);
        let bridge = Arc::new(bridge);
        let handle = WorkerHandle::new(Arc::clone(&bridge));

        let app = Self {
            store,
            embeddings,
            graph,
            indexer: IncrementalIndexer::new(),
            memory_service: MemoryService::new(),
            decider: StepInjectionDecider::new(config.decider.clone()),
            observer: Observer::new(config.observer.clone()),
            bridge,
            dispatch_rx,
            event_rx,
            scratchpad_capacity: config.observer.scratchpad_capacity,
            project_id: project_id.into(),
            project_root,
        };

        Ok((app, handle))
    }

    /// Walks `project_root`, indexing every supported file (§4.5 "Cold
    /// start"). Separated from [`Self::run`] so tests can assert on it
    /// without entering the infinite watch loop.
    pub fn cold_start(&self) -> Result<usize> {
        info!(project_id = %self.project_id, root = %self.project_root.display(), "cold start beginning");
        let indexed = self.indexer.cold_start(&self.store, &self.graph, &self.project_id, &self.project_root, |n| {
            info!(files = n, "cold start progress");
        })?;
        info!(files_indexed = indexed, "cold start complete");
        Ok(indexed)
    }

    /// Direct, same-thread equivalent of the Consumer API's `searchMemory`
    /// (§6) for callers that don't need the bridge's cross-thread hop.
    pub fn search_memory(&self, filters: &recall_core::types::SearchFilters) -> Vec<recall_core::types::Memory> {
        self.memory_service.search(&self.store, &self.embeddings, filters, None, None)
    }

    pub fn dispatcher(&self) -> HostDispatcher<'_> {
        HostDispatcher::new(&self.store, &self.embeddings, &self.memory_service, &self.decider, &self.observer, self.project_id.clone(), self.scratchpad_capacity)
    }

    /// One pass of the cooperative loop: a watcher tick, then draining
    /// whatever bridge requests/events have queued up since the last pass.
    pub fn tick(&self, watcher: &mut ProjectWatcher, dispatcher: &mut HostDispatcher<'_>) -> Result<()> {
        self.indexer.process_watch_tick(&self.store, &self.graph, &self.project_id, &self.project_root, watcher, WATCH_POLL)?;

        while let Ok((request_id, request)) = self.dispatch_rx.try_recv() {
            dispatcher.handle(&self.bridge, request_id, request);
        }
        while let Ok(event) = self.event_rx.try_recv() {
            dispatcher.observe(event);
        }
        Ok(())
    }

    /// Cold-starts the index, then runs forever.
    pub fn run(self) -> Result<()> {
        self.cold_start()?;
        let mut watcher = ProjectWatcher::new(&self.project_root)?;
        let mut dispatcher = self.dispatcher();
        loop {
            self.tick(&mut watcher, &mut dispatcher)?;
        }
    }
}

fn project_root_db_default(root: &Path) -> PathBuf {
    root.join(".recall").join("memory.db")
}
