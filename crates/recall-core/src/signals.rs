//! Types shared by the Observer/Scratchpad (C10), the StepInjectionDecider
//! (C8), and the WorkerBridge (C9): the tool-call stream, acute candidates,
//! and the injection result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::MemoryId;

/// A single tool invocation observed during an agent step (§4.8, §4.9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool_name: String,
    pub args: serde_json::Value,
}

impl ToolCall {
    /// The file path argument, if this tool call carries one (`Read`/`Edit`
    /// style tools use `file_path`).
    pub fn file_path(&self) -> Option<&str> {
        self.args.get("file_path").and_then(|v| v.as_str())
    }

    /// The search pattern argument, if this tool call carries one
    /// (`Grep`/`Glob` style tools use `pattern`).
    pub fn pattern(&self) -> Option<&str> {
        self.args.get("pattern").and_then(|v| v.as_str())
    }
}

/// Caller-maintained state threaded across decider calls within a session
/// (§4.8 "State").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecentContext {
    pub tool_calls: Vec<ToolCall>,
    pub injected_memory_ids: std::collections::HashSet<MemoryId>,
}

/// Kind of observer signal recorded in the [`crate::types`] `AcuteCandidate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    SelfCorrection,
    RepeatedError,
    LongDetour,
    UserOverride,
}

/// An in-memory Scratchpad signal (§3.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcuteCandidate {
    pub signal_type: SignalType,
    pub raw_data: String,
    pub priority: u8,
    pub captured_at: DateTime<Utc>,
    pub step_number: u32,
}

/// Type of a [`StepInjection`] (§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionType {
    GotchaInjection,
    ScratchpadReflection,
    SearchShortCircuit,
}

/// Result of [`crate::decider`]'s `decide` — at most one per step (§4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepInjection {
    pub content: String,
    pub injection_type: InjectionType,
    pub memory_ids: Vec<MemoryId>,
}
