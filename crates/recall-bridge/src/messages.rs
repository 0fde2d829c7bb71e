//! Wire message shapes (§4.9, §6): JSON-serializable so the same types
//! could cross a real process boundary even though this port moves them
//! over in-process channels.

use recall_core::ids::MemoryId;
use recall_core::signals::{RecentContext, StepInjection, ToolCall};
use recall_core::types::{Memory, SearchFilters};
use serde::{Deserialize, Serialize};

/// Fire-and-forget, worker → host (§4.9 "Messages").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorkerEvent {
    ToolCall(ToolCall),
    ToolResult { tool_name: String, output: serde_json::Value },
    Reasoning(String),
    StepComplete { step_number: u32 },
}

/// Request/response, worker → host, each correlated by a fresh UUID at the
/// channel layer rather than carried inline on the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BridgeRequest {
    Search(SearchFilters),
    Record(Memory),
    StepInjection { step_number: u32, recent_context: RecentContext },
}

impl BridgeRequest {
    /// The value a caller receives on timeout (§4.9 "graceful degradation
    /// — never block the agent loop").
    pub fn benign_timeout_response(&self) -> BridgeResponse {
        match self {
            BridgeRequest::Search(_) => BridgeResponse::SearchResult(Vec::new()),
            BridgeRequest::Record(_) => BridgeResponse::Error("request timed out".to_string()),
            BridgeRequest::StepInjection { .. } => BridgeResponse::StepInjection(None),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BridgeResponse {
    SearchResult(Vec<Memory>),
    Stored(MemoryId),
    StepInjection(Option<StepInjection>),
    Error(String),
}
