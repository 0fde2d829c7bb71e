//! `StepInjectionDecider` (§4.8): three-trigger priority chain under a soft
//! 50 ms latency budget. Stateless — the caller owns `RecentContext` and
//! the `Scratchpad` across steps (§4.8 "State").

use std::time::{Duration, Instant};

use recall_core::config::DeciderConfig;
use recall_core::filter::{ExcludeIds, MemoryFilter};
use recall_core::signals::{InjectionType, RecentContext, StepInjection};
use recall_core::types::{MemoryType, SearchFilters};
use recall_embeddings::EmbeddingService;
use recall_memory::MemoryService;
use recall_storage::Store;
use tracing::warn;

use crate::error::Result;
use crate::scratchpad::Scratchpad;

const READ_EDIT_TOOLS: &[&str] = &["Read", "Edit"];
const SEARCH_SHORT_CIRCUIT_TOOLS: &[&str] = &["Grep", "Glob"];

pub struct StepInjectionDecider {
    config: DeciderConfig,
}

impl StepInjectionDecider {
    pub fn new(config: DeciderConfig) -> Self {
        Self { config }
    }

    /// Never throws (§4.8): sub-call failures degrade to a skipped trigger
    /// and a logged warning, not a propagated error.
    pub fn decide(
        &self,
        store: &Store,
        embeddings: &EmbeddingService,
        memory_service: &MemoryService,
        scratchpad: &Scratchpad,
        project_id: &str,
        step_number: u32,
        recent_context: &RecentContext,
    ) -> Option<StepInjection> {
        let start = Instant::now();
        let result = self.try_decide(store, embeddings, memory_service, scratchpad, project_id, step_number, recent_context, start);

        let elapsed = start.elapsed();
        if elapsed > Duration::from_millis(self.config.latency_budget_ms) {
            warn!(elapsed_ms = elapsed.as_millis() as u64, "decider exceeded latency budget");
        }

        match result {
            Ok(injection) => injection,
            Err(e) => {
                warn!(error = %e, "decider failed, suppressing injection");
                None
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn try_decide(
        &self,
        store: &Store,
        embeddings: &EmbeddingService,
        memory_service: &MemoryService,
        scratchpad: &Scratchpad,
        project_id: &str,
        step_number: u32,
        recent_context: &RecentContext,
        start: Instant,
    ) -> Result<Option<StepInjection>> {
        if let Some(injection) = self.gotcha_injection(store, embeddings, memory_service, project_id, recent_context) {
            return Ok(Some(injection));
        }
        if self.over_budget(start) {
            return Ok(None);
        }

        if let Some(injection) = self.scratchpad_reflection(scratchpad, step_number) {
            return Ok(Some(injection));
        }
        if self.over_budget(start) {
            return Ok(None);
        }

        Ok(self.search_short_circuit(store, memory_service, recent_context))
    }

    fn over_budget(&self, start: Instant) -> bool {
        let elapsed = start.elapsed();
        if elapsed > Duration::from_millis(self.config.latency_budget_ms) {
            warn!(elapsed_ms = elapsed.as_millis() as u64, "decider over budget, skipping remaining triggers");
            true
        } else {
            false
        }
    }

    /// Trigger 1 (§4.8): Read/Edit tool calls targeting a file path search
    /// gotcha/error_pattern/dead_end memories scoped to those paths.
    fn gotcha_injection(
        &self,
        store: &Store,
        embeddings: &EmbeddingService,
        memory_service: &MemoryService,
        project_id: &str,
        recent_context: &RecentContext,
    ) -> Option<StepInjection> {
        let paths: Vec<String> =
            recent_context.tool_calls.iter().filter(|c| READ_EDIT_TOOLS.contains(&c.tool_name.as_str())).filter_map(|c| c.file_path().map(str::to_string)).collect();
        if paths.is_empty() {
            return None;
        }

        let filter: Box<dyn MemoryFilter> = Box::new(ExcludeIds { excluded: recent_context.injected_memory_ids.clone() });
        let filters = SearchFilters {
            project_id: project_id.to_string(),
            types: vec![MemoryType::Gotcha, MemoryType::ErrorPattern, MemoryType::DeadEnd],
            related_files: paths,
            min_confidence: Some(self.config.gotcha_min_confidence),
            limit: Some(self.config.gotcha_limit),
            ..Default::default()
        };

        let found = memory_service.search(store, embeddings, &filters, None, Some(filter));
        if found.is_empty() {
            return None;
        }

        let mut body = String::from("MEMORY ALERT\n");
        for memory in &found {
            let basenames: Vec<&str> = memory.related_files.iter().map(|p| p.rsplit('/').next().unwrap_or(p.as_str())).collect();
            body.push_str(&format!("- [{}] ({}): {}\n", memory.memory_type.heading(), basenames.join(", "), memory.content));
        }

        Some(StepInjection { content: body.trim_end().to_string(), injection_type: InjectionType::GotchaInjection, memory_ids: found.iter().map(|m| m.id).collect() })
    }

    /// Trigger 2 (§4.8): new scratchpad entries since the prior step.
    fn scratchpad_reflection(&self, scratchpad: &Scratchpad, step_number: u32) -> Option<StepInjection> {
        let new_entries = scratchpad.get_new_since(step_number.saturating_sub(1));
        if new_entries.is_empty() {
            return None;
        }

        let mut body = String::from("MEMORY REFLECTION\n");
        for entry in &new_entries {
            let excerpt: String = entry.raw_data.chars().take(200).collect();
            body.push_str(&format!("- [step {}] {:?}: {excerpt}\n", entry.step_number, entry.signal_type));
        }

        Some(StepInjection { content: body.trim_end().to_string(), injection_type: InjectionType::ScratchpadReflection, memory_ids: Vec::new() })
    }

    /// Trigger 3 (§4.8): inspect up to the last 3 Grep/Glob calls in order,
    /// returning the first non-null, not-already-injected pattern match.
    fn search_short_circuit(&self, store: &Store, memory_service: &MemoryService, recent_context: &RecentContext) -> Option<StepInjection> {
        let patterns: Vec<&str> = recent_context
            .tool_calls
            .iter()
            .filter(|c| SEARCH_SHORT_CIRCUIT_TOOLS.contains(&c.tool_name.as_str()))
            .filter_map(|c| c.pattern())
            .collect();

        for pattern in patterns.iter().rev().take(self.config.search_short_circuit_lookback) {
            let Some(memory) = memory_service.search_by_pattern(store, pattern) else { continue };
            if recent_context.injected_memory_ids.contains(&memory.id) {
                continue;
            }
            return Some(StepInjection {
                content: format!("MEMORY CONTEXT: {}", memory.content),
                injection_type: InjectionType::SearchShortCircuit,
                memory_ids: vec![memory.id],
            });
        }
        None
    }
}
