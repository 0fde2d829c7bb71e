use recall_core::types::{Memory, MemoryType};
use recall_embeddings::provider::OnnxFallbackProvider;
use recall_embeddings::EmbeddingService;
use recall_storage::Store;

fn onnx_service() -> EmbeddingService {
    // Construction through `initialize()` would hit the network; tests
    // build the service directly over the deterministic fallback tier.
    EmbeddingService::from_provider(Box::new(OnnxFallbackProvider))
}

#[test]
fn embed_memory_uses_contextual_prefix() {
    let store = Store::open_in_memory().unwrap();
    let service = onnx_service();

    let mut memory = Memory::new("proj", MemoryType::Gotcha, "avoid double free");
    memory.related_files = vec!["src/alloc.rs".to_string()];

    let embedding = service.embed_memory(&store, &memory, 256).unwrap();
    assert_eq!(embedding.dims, 256);
    assert_eq!(embedding.vector.len(), 256);
    assert!(embedding.model_id.ends_with("-d256"));
}

#[test]
fn identical_text_is_byte_identical_across_cache_round_trips() {
    let store = Store::open_in_memory().unwrap();
    let service = onnx_service();

    let a = service.embed(&store, "same text", 256).unwrap();
    let b = service.embed(&store, "same text", 256).unwrap();
    assert_eq!(a, b);
}
