use recall_core::ids::NodeId;
use recall_core::types::{GraphEdgeType, GraphNodeType};
use recall_graph::GraphDatabase;
use recall_storage::Store;

#[test]
fn upsert_clears_staleness_and_closure_tracks_transitive_dependents() {
    let store = Store::open_in_memory().unwrap();
    let db = GraphDatabase::new();

    let a = db
        .upsert_node(&store, "proj", Some("src/a.rs".to_string()), "a", GraphNodeType::Function, None, None, None, "extractor")
        .unwrap();
    let b = db
        .upsert_node(&store, "proj", Some("src/b.rs".to_string()), "b", GraphNodeType::Function, None, None, None, "extractor")
        .unwrap();
    let c = db
        .upsert_node(&store, "proj", Some("src/c.rs".to_string()), "c", GraphNodeType::Function, None, None, None, "extractor")
        .unwrap();

    let a_id = NodeId(a.id.clone());
    let b_id = NodeId(b.id.clone());
    let c_id = NodeId(c.id.clone());

    db.upsert_edge(&store, &a_id, &b_id, GraphEdgeType::Calls, 1.0).unwrap();
    db.upsert_edge(&store, &b_id, &c_id, GraphEdgeType::Calls, 1.0).unwrap();

    db.update_closure_for_node(&store, &a.id).unwrap();

    let impact = db.analyze_impact(&store, "proj", "c", 5).unwrap();
    assert_eq!(impact.target.label, "c");
    assert_eq!(impact.direct_dependents.len(), 1);
    assert_eq!(impact.direct_dependents[0].label, "b");

    let transitive_labels: Vec<&str> = impact.transitive_dependents.iter().map(|t| t.node.label.as_str()).collect();
    assert!(transitive_labels.contains(&"a"));
}

#[test]
fn staleness_lifecycle_removes_untouched_nodes() {
    let store = Store::open_in_memory().unwrap();
    let db = GraphDatabase::new();

    db.upsert_node(&store, "proj", Some("src/a.rs".to_string()), "a", GraphNodeType::Function, None, None, None, "extractor")
        .unwrap();

    db.mark_file_stale(&store, "proj", "src/a.rs").unwrap();
    // File was deleted or the symbol removed: nothing re-upserted before delete.
    db.delete_stale_for_file(&store, "proj", "src/a.rs").unwrap();

    let result = db.analyze_impact(&store, "proj", "a", 5);
    assert!(result.is_err(), "node deleted while stale should no longer resolve");
}

#[test]
fn upsert_is_deterministic_and_idempotent() {
    let store = Store::open_in_memory().unwrap();
    let db = GraphDatabase::new();

    let first = db
        .upsert_node(&store, "proj", Some("src/a.rs".to_string()), "a", GraphNodeType::Function, None, None, None, "extractor")
        .unwrap();
    let second = db
        .upsert_node(&store, "proj", Some("src/a.rs".to_string()), "a", GraphNodeType::Function, None, None, None, "extractor")
        .unwrap();

    assert_eq!(first.id, second.id);
}
