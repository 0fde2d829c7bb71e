use std::sync::Arc;
use std::thread;

use recall_core::config::{BridgeConfig, DeciderConfig, ObserverConfig};
use recall_core::types::{Memory, MemoryType, SearchFilters};
use recall_bridge::{BridgeResponse, HostDispatcher, WorkerBridge, WorkerHandle};
use recall_decider::{Observer, StepInjectionDecider};
use recall_embeddings::{EmbeddingService, OnnxFallbackProvider};
use recall_memory::MemoryService;
use recall_storage::Store;

fn host_fixture() -> (Store, EmbeddingService, MemoryService, StepInjectionDecider, Observer) {
    (
        Store::open_in_memory().unwrap(),
        EmbeddingService::from_provider(Box::new(OnnxFallbackProvider)),
        MemoryService::new(),
        StepInjectionDecider::new(DeciderConfig::default()),
        Observer::new(ObserverConfig::default()),
    )
}

#[test]
fn search_request_round_trips_through_the_dispatcher() {
    let (store, embeddings, memory_service, decider, observer) = host_fixture();
    memory_service.store(&store, &embeddings, Memory::new("P", MemoryType::Pattern, "retry idempotent writes")).unwrap();

    let (bridge, dispatch_rx, _event_rx) = WorkerBridge::new(&BridgeConfig::default());
    let bridge = Arc::new(bridge);
    let handle = WorkerHandle::new(Arc::clone(&bridge));

    let mut dispatcher = HostDispatcher::new(&store, &embeddings, &memory_service, &decider, &observer, "P", 200);
    let dispatch_bridge = Arc::clone(&bridge);
    let host_thread = thread::spawn(move || {
        let (request_id, request) = dispatch_rx.recv().unwrap();
        dispatcher.handle(&dispatch_bridge, request_id, request);
    });

    let filters = SearchFilters { project_id: "P".to_string(), types: vec![MemoryType::Pattern], ..Default::default() };
    let results = handle.search(filters);
    host_thread.join().unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].content, "retry idempotent writes");
}

#[test]
fn record_request_round_trips_and_persists() {
    let (store, embeddings, memory_service, decider, observer) = host_fixture();
    let (bridge, dispatch_rx, _event_rx) = WorkerBridge::new(&BridgeConfig::default());
    let bridge = Arc::new(bridge);
    let handle = WorkerHandle::new(Arc::clone(&bridge));

    let mut dispatcher = HostDispatcher::new(&store, &embeddings, &memory_service, &decider, &observer, "P", 200);
    let dispatch_bridge = Arc::clone(&bridge);
    let host_thread = thread::spawn(move || {
        let (request_id, request) = dispatch_rx.recv().unwrap();
        dispatcher.handle(&dispatch_bridge, request_id, request);
    });

    let memory = Memory::new("P", MemoryType::Gotcha, "watch out for stale locks");
    let id = handle.record(memory).unwrap();
    host_thread.join().unwrap();

    let found = memory_service.search(&store, &embeddings, &SearchFilters { project_id: "P".to_string(), ..Default::default() }, None, None);
    assert!(found.iter().any(|m| m.id == id));
}

#[test]
fn call_degrades_to_benign_default_when_host_never_answers() {
    // request_timeout_secs=0 means the worker's recv_timeout expires
    // essentially immediately since nothing drains the dispatch channel.
    let config = BridgeConfig { request_timeout_secs: 0, ..BridgeConfig::default() };
    let (bridge, _dispatch_rx, _event_rx) = WorkerBridge::new(&config);
    let handle = WorkerHandle::new(Arc::new(bridge));

    let results = handle.search(SearchFilters::default());
    assert!(results.is_empty());
}

#[test]
fn resolve_is_a_no_op_after_the_pending_entry_is_already_gone() {
    let (bridge, _dispatch_rx, _event_rx) = WorkerBridge::new(&BridgeConfig::default());
    // no call() was ever made, so this id was never registered
    bridge.resolve(uuid::Uuid::new_v4(), BridgeResponse::SearchResult(Vec::new()));
    assert_eq!(bridge.pending_count(), 0);
}

#[test]
fn clear_pending_resolves_every_outstanding_request_with_the_fallback() {
    let (bridge, dispatch_rx, _event_rx) = WorkerBridge::new(&BridgeConfig::default());
    let bridge = Arc::new(bridge);
    let handle = WorkerHandle::new(Arc::clone(&bridge));

    let clear_bridge = Arc::clone(&bridge);
    let worker_thread = thread::spawn(move || handle.search(SearchFilters::default()));

    // let the call register itself before wiping pending state
    let _ = dispatch_rx.recv().unwrap();
    clear_bridge.clear_pending(BridgeResponse::SearchResult(Vec::new()));

    let results = worker_thread.join().unwrap();
    assert!(results.is_empty());
    assert_eq!(bridge.pending_count(), 0);
}

#[test]
fn step_injection_request_round_trips_through_the_dispatcher() {
    let (store, embeddings, memory_service, decider, observer) = host_fixture();
    let (bridge, dispatch_rx, _event_rx) = WorkerBridge::new(&BridgeConfig::default());
    let bridge = Arc::new(bridge);
    let handle = WorkerHandle::new(Arc::clone(&bridge));

    let mut dispatcher = HostDispatcher::new(&store, &embeddings, &memory_service, &decider, &observer, "P", 200);
    let dispatch_bridge = Arc::clone(&bridge);
    let host_thread = thread::spawn(move || {
        let (request_id, request) = dispatch_rx.recv().unwrap();
        dispatcher.handle(&dispatch_bridge, request_id, request);
    });

    let injection = handle.request_step_injection(1, recall_core::signals::RecentContext::default());
    host_thread.join().unwrap();
    assert!(injection.is_none());
}
