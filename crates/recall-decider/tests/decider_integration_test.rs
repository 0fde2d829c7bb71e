use chrono::Utc;
use recall_core::config::{DeciderConfig, ObserverConfig};
use recall_core::signals::{AcuteCandidate, InjectionType, RecentContext, SignalType, ToolCall};
use recall_core::types::{Memory, MemoryType};
use recall_decider::{Observer, Scratchpad, StepInjectionDecider};
use recall_embeddings::{EmbeddingService, OnnxFallbackProvider};
use recall_memory::MemoryService;
use recall_storage::Store;
use serde_json::json;

fn fixture() -> (Store, EmbeddingService, MemoryService, StepInjectionDecider) {
    let store = Store::open_in_memory().unwrap();
    let embeddings = EmbeddingService::from_provider(Box::new(OnnxFallbackProvider));
    let memory_service = MemoryService::new();
    let decider = StepInjectionDecider::new(DeciderConfig::default());
    (store, embeddings, memory_service, decider)
}

fn tool_call(name: &str, key: &str, value: &str) -> ToolCall {
    ToolCall { tool_name: name.to_string(), args: json!({ key: value }) }
}

#[test]
fn gotcha_injection_wins_over_scratchpad_reflection() {
    let (store, embeddings, svc, decider) = fixture();

    let mut gotcha = Memory::new("P", MemoryType::Gotcha, "check auth token expiry before using it");
    gotcha.related_files = vec!["/src/auth.ts".to_string()];
    gotcha.confidence = 0.9;
    svc.store(&store, &embeddings, gotcha).unwrap();

    let mut scratchpad = Scratchpad::new(200);
    scratchpad.push(AcuteCandidate { signal_type: SignalType::SelfCorrection, raw_data: "tried X, reverted".to_string(), priority: 1, captured_at: Utc::now(), step_number: 4 });

    let recent_context = RecentContext { tool_calls: vec![tool_call("Read", "file_path", "/src/auth.ts")], injected_memory_ids: Default::default() };

    let injection = decider.decide(&store, &embeddings, &svc, &scratchpad, "P", 5, &recent_context).unwrap();
    assert_eq!(injection.injection_type, InjectionType::GotchaInjection);
    assert!(injection.content.contains("MEMORY ALERT"));
}

#[test]
fn scratchpad_reflection_fires_when_no_file_touch() {
    let (store, embeddings, svc, decider) = fixture();

    let mut scratchpad = Scratchpad::new(200);
    scratchpad.push(AcuteCandidate { signal_type: SignalType::RepeatedError, raw_data: "same compile error three times".to_string(), priority: 2, captured_at: Utc::now(), step_number: 4 });

    let recent_context = RecentContext::default();

    let injection = decider.decide(&store, &embeddings, &svc, &scratchpad, "P", 5, &recent_context).unwrap();
    assert_eq!(injection.injection_type, InjectionType::ScratchpadReflection);
    assert!(injection.content.contains("MEMORY REFLECTION"));
}

#[test]
fn search_short_circuit_fires_on_grep_pattern_match() {
    let (store, embeddings, svc, decider) = fixture();

    svc.store(&store, &embeddings, Memory::new("P", MemoryType::Pattern, "useCallback needs a stable dependency array")).unwrap();

    let scratchpad = Scratchpad::new(200);
    let recent_context = RecentContext { tool_calls: vec![tool_call("Grep", "pattern", "useCallback")], injected_memory_ids: Default::default() };

    let injection = decider.decide(&store, &embeddings, &svc, &scratchpad, "P", 5, &recent_context).unwrap();
    assert_eq!(injection.injection_type, InjectionType::SearchShortCircuit);
    assert!(injection.content.starts_with("MEMORY CONTEXT:"));
}

#[test]
fn no_triggers_fire_when_nothing_is_new() {
    let (store, embeddings, svc, decider) = fixture();

    let scratchpad = Scratchpad::new(200);
    let recent_context = RecentContext::default();

    let injection = decider.decide(&store, &embeddings, &svc, &scratchpad, "P", 5, &recent_context);
    assert!(injection.is_none());
}

#[test]
fn already_injected_pattern_match_is_skipped() {
    let (store, embeddings, svc, decider) = fixture();

    let id = svc.store(&store, &embeddings, Memory::new("P", MemoryType::Pattern, "useCallback needs a stable dependency array")).unwrap();

    let scratchpad = Scratchpad::new(200);
    let mut injected = std::collections::HashSet::new();
    injected.insert(id);
    let recent_context = RecentContext { tool_calls: vec![tool_call("Grep", "pattern", "useCallback")], injected_memory_ids: injected };

    let injection = decider.decide(&store, &embeddings, &svc, &scratchpad, "P", 5, &recent_context);
    assert!(injection.is_none());
}

#[test]
fn observer_promotes_a_co_access_pair_once_threshold_is_crossed() {
    let store = Store::open_in_memory().unwrap();
    let embeddings = EmbeddingService::from_provider(Box::new(OnnxFallbackProvider));
    let observer = Observer::new(ObserverConfig::default());

    for step in 1..=3 {
        observer.record_co_access(&store, "P", "/src/a.ts", "/src/b.ts", step).unwrap();
    }

    let promoted = observer.synthesize(&store, &embeddings, "P", 3).unwrap();
    assert_eq!(promoted.len(), 1);

    // a second pass should not promote the same pair again
    let promoted_again = observer.synthesize(&store, &embeddings, "P", 3).unwrap();
    assert!(promoted_again.is_empty());
}
