//! `WorkerHandle` (§4.9): the worker-facing API surface over `WorkerBridge`.

use std::sync::Arc;

use recall_core::ids::MemoryId;
use recall_core::signals::{RecentContext, StepInjection, ToolCall};
use recall_core::types::{Memory, SearchFilters};

use crate::bridge::WorkerBridge;
use crate::messages::{BridgeRequest, BridgeResponse, WorkerEvent};

/// Cloneable handle a worker thread holds to talk to the host. Blocking
/// calls never panic on a malformed response: a response of the wrong
/// variant degrades to the same empty/`None` value a timeout would produce,
/// since that can only happen if the host and worker disagree about
/// request/response pairing, which is itself a bug best survived silently
/// (§4.9 "never block the agent loop").
#[derive(Clone)]
pub struct WorkerHandle {
    bridge: Arc<WorkerBridge>,
}

impl WorkerHandle {
    pub fn new(bridge: Arc<WorkerBridge>) -> Self {
        Self { bridge }
    }

    pub fn search(&self, filters: SearchFilters) -> Vec<Memory> {
        match self.bridge.call(BridgeRequest::Search(filters)) {
            BridgeResponse::SearchResult(memories) => memories,
            _ => Vec::new(),
        }
    }

    pub fn record(&self, memory: Memory) -> Result<MemoryId, String> {
        match self.bridge.call(BridgeRequest::Record(memory)) {
            BridgeResponse::Stored(id) => Ok(id),
            BridgeResponse::Error(message) => Err(message),
            _ => Err("unexpected bridge response".to_string()),
        }
    }

    pub fn request_step_injection(&self, step_number: u32, recent_context: RecentContext) -> Option<StepInjection> {
        match self.bridge.call(BridgeRequest::StepInjection { step_number, recent_context }) {
            BridgeResponse::StepInjection(injection) => injection,
            _ => None,
        }
    }

    pub fn on_tool_call(&self, tool_call: ToolCall) {
        self.bridge.send_event(WorkerEvent::ToolCall(tool_call));
    }

    pub fn on_tool_result(&self, tool_name: String, output: serde_json::Value) {
        self.bridge.send_event(WorkerEvent::ToolResult { tool_name, output });
    }

    pub fn on_reasoning(&self, text: String) {
        self.bridge.send_event(WorkerEvent::Reasoning(text));
    }

    pub fn on_step_complete(&self, step_number: u32) {
        self.bridge.send_event(WorkerEvent::StepComplete { step_number });
    }
}
