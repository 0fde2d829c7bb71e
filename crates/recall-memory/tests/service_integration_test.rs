use recall_core::types::{Memory, MemoryType, SearchFilters};
use recall_embeddings::{EmbeddingService, OnnxFallbackProvider};
use recall_memory::MemoryService;
use recall_storage::Store;

fn service() -> (Store, EmbeddingService, MemoryService) {
    let store = Store::open_in_memory().unwrap();
    let embeddings = EmbeddingService::from_provider(Box::new(OnnxFallbackProvider));
    (store, embeddings, MemoryService::new())
}

#[test]
fn store_then_structural_search_finds_it_by_project_and_type() {
    let (store, embeddings, svc) = service();

    let memory = Memory::new("P", MemoryType::Gotcha, "middleware must check JWT expiry");
    svc.store(&store, &embeddings, memory).unwrap();

    let filters = SearchFilters {
        project_id: "P".to_string(),
        types: vec![MemoryType::Gotcha],
        ..Default::default()
    };
    let found = svc.search(&store, &embeddings, &filters, None, None);

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].content, "middleware must check JWT expiry");
}

#[test]
fn store_then_query_search_delegates_to_the_retrieval_pipeline() {
    let (store, embeddings, svc) = service();

    svc.store(&store, &embeddings, Memory::new("P", MemoryType::Gotcha, "JWT token expiry must be checked in middleware")).unwrap();

    let filters = SearchFilters { query: Some("JWT token".to_string()), project_id: "P".to_string(), ..Default::default() };
    let found = svc.search(&store, &embeddings, &filters, Some("implement"), None);

    assert!(!found.is_empty());
    assert!(found[0].content.contains("JWT token"));
}

#[test]
fn exclude_deprecated_filters_out_deprecated_memories() {
    let (store, embeddings, svc) = service();

    let id = svc.store(&store, &embeddings, Memory::new("P", MemoryType::Gotcha, "a stale gotcha")).unwrap();
    svc.deprecate_memory(&store, &id.to_string());

    let filters = SearchFilters { project_id: "P".to_string(), exclude_deprecated: true, ..Default::default() };
    let found = svc.search(&store, &embeddings, &filters, None, None);

    assert!(found.is_empty());
}

#[test]
fn search_by_pattern_returns_top_non_deprecated_match() {
    let (store, embeddings, svc) = service();

    svc.store(&store, &embeddings, Memory::new("P", MemoryType::ErrorPattern, "connection reset by peer during handshake")).unwrap();

    let found = svc.search_by_pattern(&store, "handshake");
    assert!(found.is_some());
    assert!(found.unwrap().content.contains("handshake"));
}

#[test]
fn insert_user_taught_sets_preference_defaults() {
    let (store, embeddings, svc) = service();

    let id = svc.insert_user_taught(&store, &embeddings, "always use tabs", "P", vec!["style".to_string()]).unwrap();

    let filters = SearchFilters { project_id: "P".to_string(), types: vec![MemoryType::Preference], ..Default::default() };
    let found = svc.search(&store, &embeddings, &filters, None, None);

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, id);
    assert_eq!(found[0].confidence, 1.0);
    assert!(found[0].tags.contains(&"style".to_string()));
}

#[test]
fn search_workflow_recipe_only_returns_workflow_recipes() {
    let (store, embeddings, svc) = service();

    svc.store(&store, &embeddings, Memory::new("P", MemoryType::WorkflowRecipe, "deploy the service: build, push, roll out")).unwrap();
    svc.store(&store, &embeddings, Memory::new("P", MemoryType::Gotcha, "deploy step forgets to roll out the config map")).unwrap();

    let found = svc.search_workflow_recipe(&store, &embeddings, "deploy the service", "P", Some(5));

    assert!(!found.is_empty());
    assert!(found.iter().all(|m| m.memory_type == MemoryType::WorkflowRecipe));
}

#[test]
fn update_access_count_and_deprecate_memory_swallow_unknown_id() {
    let (store, _embeddings, svc) = service();

    svc.update_access_count(&store, "does-not-exist");
    svc.deprecate_memory(&store, "does-not-exist");
}

#[test]
fn verify_pin_delete_propagate_not_found_for_unknown_id() {
    let (store, _embeddings, svc) = service();

    assert!(svc.verify_memory(&store, "does-not-exist").is_err());
    assert!(svc.pin_memory(&store, "does-not-exist", true).is_err());
    assert!(svc.delete_memory(&store, "does-not-exist").is_err());
}

#[test]
fn delete_memory_removes_rows_from_all_three_tables() {
    let (store, embeddings, svc) = service();

    let id = svc.store(&store, &embeddings, Memory::new("P", MemoryType::Pattern, "a pattern to delete")).unwrap();
    svc.delete_memory(&store, &id.to_string()).unwrap();

    let memories: i64 = store.reader().query_row("SELECT COUNT(*) FROM memories WHERE id = ?1", rusqlite::params![id.to_string()], |r| r.get(0)).unwrap();
    let fts: i64 = store.reader().query_row("SELECT COUNT(*) FROM memories_fts WHERE id = ?1", rusqlite::params![id.to_string()], |r| r.get(0)).unwrap();
    let embedding: i64 =
        store.reader().query_row("SELECT COUNT(*) FROM memory_embeddings WHERE memory_id = ?1", rusqlite::params![id.to_string()], |r| r.get(0)).unwrap();

    assert_eq!(memories, 0);
    assert_eq!(fts, 0);
    assert_eq!(embedding, 0);
}

#[test]
fn verify_and_pin_succeed_for_an_existing_memory() {
    let (store, embeddings, svc) = service();

    let id = svc.store(&store, &embeddings, Memory::new("P", MemoryType::Decision, "use sqlite for local storage")).unwrap();

    svc.verify_memory(&store, &id.to_string()).unwrap();
    svc.pin_memory(&store, &id.to_string(), true).unwrap();

    let verified: i64 = store.reader().query_row("SELECT user_verified FROM memories WHERE id = ?1", rusqlite::params![id.to_string()], |r| r.get(0)).unwrap();
    let pinned: i64 = store.reader().query_row("SELECT pinned FROM memories WHERE id = ?1", rusqlite::params![id.to_string()], |r| r.get(0)).unwrap();

    assert_eq!(verified, 1);
    assert_eq!(pinned, 1);
}
