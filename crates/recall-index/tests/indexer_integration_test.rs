use std::fs;

use recall_core::ids::NodeId;
use recall_core::types::GraphNodeType;
use recall_graph::GraphDatabase;
use recall_index::IncrementalIndexer;
use recall_storage::Store;

#[test]
fn relative_import_stub_converges_once_the_target_file_is_indexed() {
    let store = Store::open_in_memory().unwrap();
    let graph = GraphDatabase::new();
    graph.load_mirror(&store).unwrap();
    let indexer = IncrementalIndexer::new();

    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("main.ts"), "import { helper } from './utils';\n").unwrap();
    fs::write(dir.path().join("utils.ts"), "export const helper = () => {};\n").unwrap();

    indexer.index_file(&store, &graph, "proj", "main.ts", &dir.path().join("main.ts")).unwrap();

    // Before `utils.ts` is indexed, the import target is a stub file node.
    let stub_id = NodeId::make("proj", "utils.ts", "utils.ts", GraphNodeType::File.as_str());
    let stub = recall_graph::db::get_node(&store, &stub_id.to_string()).unwrap().unwrap();
    assert_eq!(stub.source, "stub");

    indexer.index_file(&store, &graph, "proj", "utils.ts", &dir.path().join("utils.ts")).unwrap();

    // Indexing the real file upserts the very same deterministic id, so the
    // edge from `main.ts` now points at a fully-populated node.
    let real = recall_graph::db::get_node(&store, &stub_id.to_string()).unwrap().unwrap();
    assert_eq!(real.source, "ast_extractor");

    let impact = graph.analyze_impact(&store, "proj", "utils.ts", 8).unwrap();
    assert!(impact.direct_dependents.iter().any(|n| n.label == "main.ts"));
}

#[test]
fn unlink_marks_nodes_stale_and_sweeps_them() {
    let store = Store::open_in_memory().unwrap();
    let graph = GraphDatabase::new();
    graph.load_mirror(&store).unwrap();
    let indexer = IncrementalIndexer::new();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lib.rs");
    fs::write(&path, "pub fn hello() {}\n").unwrap();
    indexer.index_file(&store, &graph, "proj", "lib.rs", &path).unwrap();

    indexer.remove_file(&store, &graph, "proj", "lib.rs").unwrap();

    let result = graph.analyze_impact(&store, "proj", "lib.rs", 8);
    assert!(result.is_err());
}

#[test]
fn cold_start_then_edit_recreates_a_function_node_under_the_same_id() {
    let store = Store::open_in_memory().unwrap();
    let graph = GraphDatabase::new();
    graph.load_mirror(&store).unwrap();
    let indexer = IncrementalIndexer::new();

    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("lib.rs"), "pub fn hello() {}\n").unwrap();

    indexer.cold_start(&store, &graph, "proj", dir.path(), |_| {}).unwrap();
    let hello_id = NodeId::make("proj", "lib.rs", "lib.rs:hello", GraphNodeType::Function.as_str());
    assert!(recall_graph::db::get_node(&store, &hello_id.to_string()).unwrap().is_some());

    fs::write(dir.path().join("lib.rs"), "pub fn hello() {}\npub fn world() {}\n").unwrap();
    indexer.index_file(&store, &graph, "proj", "lib.rs", &dir.path().join("lib.rs")).unwrap();

    let world_id = NodeId::make("proj", "lib.rs", "lib.rs:world", GraphNodeType::Function.as_str());
    assert!(recall_graph::db::get_node(&store, &world_id.to_string()).unwrap().is_some());
    assert!(recall_graph::db::get_node(&store, &hello_id.to_string()).unwrap().is_some());
}
