use recall_core::types::{Memory, MemoryType};
use recall_embeddings::{EmbeddingService, OnnxFallbackProvider};
use recall_retrieval::{RetrievalPipeline, SearchOptions};
use recall_storage::{SqlValue, Statement, Store};

fn seed_memory(store: &Store, embeddings: &EmbeddingService, project_id: &str, memory_type: MemoryType, content: &str, related_files: &[&str]) -> Memory {
    let mut memory = Memory::new(project_id, memory_type, content);
    memory.related_files = related_files.iter().map(|s| s.to_string()).collect();

    let embedding = embeddings.embed_memory(store, &memory, 1024).unwrap();
    memory.embedding_model_id = Some(embedding.model_id.clone());

    store
        .batch(vec![
            Statement::new(
                "INSERT INTO memories (id, memory_type, content, confidence, created_at, last_accessed_at, project_id, scope, related_files, embedding_model_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                vec![
                    SqlValue::from(memory.id.to_string()),
                    SqlValue::from(memory.memory_type.as_str().to_string()),
                    SqlValue::from(memory.content.clone()),
                    SqlValue::from(memory.confidence as f64),
                    SqlValue::from(memory.created_at.to_rfc3339()),
                    SqlValue::from(memory.last_accessed_at.to_rfc3339()),
                    SqlValue::from(project_id.to_string()),
                    SqlValue::from("global".to_string()),
                    SqlValue::from(serde_json::to_string(&memory.related_files).unwrap()),
                    SqlValue::from(embedding.model_id.clone()),
                ],
            ),
            Statement::new(
                "INSERT INTO memories_fts (id, content, tags, related_files) VALUES (?1, ?2, '', ?3)",
                vec![
                    SqlValue::from(memory.id.to_string()),
                    SqlValue::from(memory.content.clone()),
                    SqlValue::from(memory.related_files.join(" ")),
                ],
            ),
            Statement::new(
                "INSERT INTO memory_embeddings (memory_id, model_id, dims, vector) VALUES (?1, ?2, ?3, ?4)",
                vec![
                    SqlValue::from(memory.id.to_string()),
                    SqlValue::from(embedding.model_id),
                    SqlValue::from(embedding.dims as i64),
                    SqlValue::from(recall_embeddings::cache::encode_vector(&embedding.vector)),
                ],
            ),
        ])
        .unwrap();

    memory
}

#[test]
fn record_and_recall_surfaces_the_seeded_gotcha() {
    let store = Store::open_in_memory().unwrap();
    let embeddings = EmbeddingService::from_provider(Box::new(OnnxFallbackProvider));

    seed_memory(&store, &embeddings, "P", MemoryType::Gotcha, "JWT token expiry must be checked in middleware", &["auth/middleware.ts"]);

    let pipeline = RetrievalPipeline::new(&embeddings);
    let result = pipeline.search(
        &store,
        "JWT token",
        &SearchOptions {
            project_id: "P".to_string(),
            phase: Some("implement".to_string()),
            ..Default::default()
        },
    );

    assert!(!result.memories.is_empty());
    assert_eq!(result.memories[0].content, "JWT token expiry must be checked in middleware");
    assert!(result.formatted_context.contains("JWT token expiry"));
    assert!(result.formatted_context.contains("Gotcha"));
}

#[test]
fn project_scoping_never_leaks_across_projects() {
    let store = Store::open_in_memory().unwrap();
    let embeddings = EmbeddingService::from_provider(Box::new(OnnxFallbackProvider));

    seed_memory(&store, &embeddings, "proj-a", MemoryType::Gotcha, "gotcha about proj-a internals", &[]);
    seed_memory(&store, &embeddings, "proj-b", MemoryType::Gotcha, "gotcha about proj-b internals", &[]);

    let pipeline = RetrievalPipeline::new(&embeddings);
    let result = pipeline.search(
        &store,
        "gotcha",
        &SearchOptions {
            project_id: "proj-a".to_string(),
            ..Default::default()
        },
    );

    assert!(result.memories.iter().all(|m| m.project_id == "proj-a"));
}

#[test]
fn max_results_caps_the_returned_list() {
    let store = Store::open_in_memory().unwrap();
    let embeddings = EmbeddingService::from_provider(Box::new(OnnxFallbackProvider));

    for i in 0..5 {
        seed_memory(&store, &embeddings, "P", MemoryType::Pattern, &format!("pattern number {i} about widgets"), &[]);
    }

    let pipeline = RetrievalPipeline::new(&embeddings);
    let result = pipeline.search(
        &store,
        "widgets",
        &SearchOptions {
            project_id: "P".to_string(),
            max_results: Some(2),
            ..Default::default()
        },
    );

    assert!(result.memories.len() <= 2);
}
