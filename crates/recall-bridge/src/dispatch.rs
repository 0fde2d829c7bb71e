//! `HostDispatcher` (§4.9): host-side service loop. Receives correlated
//! requests off the dispatch channel and resolves them against the real
//! services; drains events off the event channel to feed the observer.

use recall_decider::{Observer, Scratchpad, StepInjectionDecider};
use recall_embeddings::EmbeddingService;
use recall_memory::MemoryService;
use recall_storage::Store;
use tracing::warn;
use uuid::Uuid;

use crate::bridge::WorkerBridge;
use crate::messages::{BridgeRequest, BridgeResponse, WorkerEvent};

pub struct HostDispatcher<'a> {
    store: &'a Store,
    embeddings: &'a EmbeddingService,
    memory_service: &'a MemoryService,
    decider: &'a StepInjectionDecider,
    observer: &'a Observer,
    project_id: String,
    scratchpad: Scratchpad,
}

impl<'a> HostDispatcher<'a> {
    pub fn new(
        store: &'a Store,
        embeddings: &'a EmbeddingService,
        memory_service: &'a MemoryService,
        decider: &'a StepInjectionDecider,
        observer: &'a Observer,
        project_id: impl Into<String>,
        scratchpad_capacity: usize,
    ) -> Self {
        Self { store, embeddings, memory_service, decider, observer, project_id: project_id.into(), scratchpad: Scratchpad::new(scratchpad_capacity) }
    }

    /// Handle one correlated request and resolve it on `bridge`.
    pub fn handle(&mut self, bridge: &WorkerBridge, request_id: Uuid, request: BridgeRequest) {
        let response = match request {
            BridgeRequest::Search(filters) => {
                let memories = self.memory_service.search(self.store, self.embeddings, &filters, None, None);
                BridgeResponse::SearchResult(memories)
            }
            BridgeRequest::Record(memory) => match recall_memory::crud::store(self.store, self.embeddings, memory) {
                Ok(id) => BridgeResponse::Stored(id),
                Err(e) => BridgeResponse::Error(e.to_string()),
            },
            BridgeRequest::StepInjection { step_number, recent_context } => {
                let injection = self.decider.decide(self.store, self.embeddings, self.memory_service, &self.scratchpad, &self.project_id, step_number, &recent_context);
                BridgeResponse::StepInjection(injection)
            }
        };
        bridge.resolve(request_id, response);
    }

    /// Fold one fire-and-forget worker event into observer state / the
    /// scratchpad. Errors are logged and swallowed: observation must never
    /// take down the agent loop (§4.10 "Failure mode").
    pub fn observe(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::ToolCall(tool_call) => {
                if let Some(path) = tool_call.file_path() {
                    if let Err(e) = self.observer.record_file_touch(self.store, &self.project_id, path) {
                        warn!(error = %e, "record_file_touch failed");
                    }
                }
            }
            WorkerEvent::ToolResult { tool_name, output } => {
                if tool_name == "Error" || output.get("error").is_some() {
                    let signature = output.to_string();
                    if let Err(e) = self.observer.record_error_pattern(self.store, &self.project_id, &signature) {
                        warn!(error = %e, "record_error_pattern failed");
                    }
                }
            }
            WorkerEvent::Reasoning(_) => {}
            WorkerEvent::StepComplete { step_number } => {
                if step_number > 0 && step_number % self.observer.config().synthesis_interval_steps == 0 {
                    match self.observer.synthesize(self.store, self.embeddings, &self.project_id, step_number) {
                        Ok(promoted) if !promoted.is_empty() => {
                            tracing::info!(count = promoted.len(), "observer promoted memories");
                        }
                        Ok(_) => {}
                        Err(e) => warn!(error = %e, "observer synthesis failed"),
                    }
                }
            }
        }
    }

    /// Scratchpad population is a caller responsibility, not something the
    /// decider or observer infers on their own (§4.10 "the caller maintains
    /// recentContext"); whatever signal-detection layer a consumer wires in
    /// pushes through here.
    pub fn push_acute_candidate(&mut self, candidate: recall_core::signals::AcuteCandidate) {
        self.scratchpad.push(candidate);
    }
}
