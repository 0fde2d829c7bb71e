//! DDL for each schema migration (§3, §4.1).

pub const V1_MEMORIES: &str = r#"
CREATE TABLE IF NOT EXISTS memories (
    id                     TEXT PRIMARY KEY,
    memory_type            TEXT NOT NULL,
    content                TEXT NOT NULL,
    citation               TEXT,
    confidence             REAL NOT NULL DEFAULT 1.0,
    access_count           INTEGER NOT NULL DEFAULT 0,
    created_at             TEXT NOT NULL,
    last_accessed_at       TEXT NOT NULL,
    decay_half_life_days   REAL,
    project_id             TEXT NOT NULL,
    scope                  TEXT NOT NULL DEFAULT 'global',
    session_id             TEXT,
    provenance_session_ids TEXT NOT NULL DEFAULT '[]',
    work_unit_ref          TEXT,
    methodology            TEXT,
    related_files          TEXT NOT NULL DEFAULT '[]',
    related_modules        TEXT NOT NULL DEFAULT '[]',
    target_node_id         TEXT,
    impacted_node_ids      TEXT NOT NULL DEFAULT '[]',
    relations              TEXT NOT NULL DEFAULT '[]',
    tags                   TEXT NOT NULL DEFAULT '[]',
    pinned                 INTEGER NOT NULL DEFAULT 0,
    needs_review           INTEGER NOT NULL DEFAULT 0,
    user_verified          INTEGER NOT NULL DEFAULT 0,
    deprecated             INTEGER NOT NULL DEFAULT 0,
    deprecated_at          TEXT,
    stale_at               TEXT,
    chunk_type             TEXT,
    chunk_start_line       INTEGER,
    chunk_end_line         INTEGER,
    context_prefix         TEXT,
    embedding_model_id     TEXT
);

CREATE INDEX IF NOT EXISTS idx_memories_project ON memories(project_id);
CREATE INDEX IF NOT EXISTS idx_memories_type ON memories(project_id, memory_type);
CREATE INDEX IF NOT EXISTS idx_memories_deprecated ON memories(project_id, deprecated);

CREATE VIRTUAL TABLE IF NOT EXISTS memories_fts USING fts5(
    id UNINDEXED,
    content,
    tags,
    related_files,
    tokenize = 'porter unicode61'
);
"#;

pub const V2_EMBEDDINGS: &str = r#"
CREATE TABLE IF NOT EXISTS memory_embeddings (
    memory_id  TEXT PRIMARY KEY REFERENCES memories(id) ON DELETE CASCADE,
    model_id   TEXT NOT NULL,
    dims       INTEGER NOT NULL,
    vector     BLOB NOT NULL
);

CREATE TABLE IF NOT EXISTS embedding_cache (
    cache_key  TEXT PRIMARY KEY,
    model_id   TEXT NOT NULL,
    dims       INTEGER NOT NULL,
    vector     BLOB NOT NULL,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_embedding_cache_expires ON embedding_cache(expires_at);
"#;

pub const V3_GRAPH: &str = r#"
CREATE TABLE IF NOT EXISTS graph_nodes (
    id                    TEXT PRIMARY KEY,
    project_id            TEXT NOT NULL,
    node_type             TEXT NOT NULL,
    label                 TEXT NOT NULL,
    file_path             TEXT,
    language              TEXT,
    start_line            INTEGER,
    end_line              INTEGER,
    layer                 INTEGER NOT NULL DEFAULT 1,
    source                TEXT NOT NULL,
    confidence            TEXT NOT NULL DEFAULT 'inferred',
    metadata              TEXT NOT NULL DEFAULT '{}',
    created_at            TEXT NOT NULL,
    updated_at            TEXT NOT NULL,
    stale_at              TEXT,
    associated_memory_ids TEXT NOT NULL DEFAULT '[]'
);

CREATE INDEX IF NOT EXISTS idx_graph_nodes_project_file ON graph_nodes(project_id, file_path);
CREATE INDEX IF NOT EXISTS idx_graph_nodes_label ON graph_nodes(project_id, label);
CREATE INDEX IF NOT EXISTS idx_graph_nodes_stale ON graph_nodes(stale_at);

CREATE TABLE IF NOT EXISTS graph_edges (
    id         TEXT PRIMARY KEY,
    from_id    TEXT NOT NULL REFERENCES graph_nodes(id) ON DELETE CASCADE,
    to_id      TEXT NOT NULL REFERENCES graph_nodes(id) ON DELETE CASCADE,
    edge_type  TEXT NOT NULL,
    weight     REAL NOT NULL DEFAULT 1.0,
    confidence TEXT NOT NULL DEFAULT 'inferred',
    metadata   TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    stale_at   TEXT
);

CREATE INDEX IF NOT EXISTS idx_graph_edges_from ON graph_edges(from_id);
CREATE INDEX IF NOT EXISTS idx_graph_edges_to ON graph_edges(to_id);
CREATE INDEX IF NOT EXISTS idx_graph_edges_stale ON graph_edges(stale_at);

CREATE TABLE IF NOT EXISTS graph_closure (
    ancestor     TEXT NOT NULL,
    descendant   TEXT NOT NULL,
    depth        INTEGER NOT NULL,
    path         TEXT NOT NULL DEFAULT '[]',
    edge_types   TEXT NOT NULL DEFAULT '[]',
    total_weight REAL NOT NULL DEFAULT 0,
    PRIMARY KEY (ancestor, descendant)
);

CREATE INDEX IF NOT EXISTS idx_graph_closure_descendant ON graph_closure(descendant);

CREATE TABLE IF NOT EXISTS graph_index_state (
    project_id         TEXT PRIMARY KEY,
    files_indexed       INTEGER NOT NULL DEFAULT 0,
    last_cold_start_at  TEXT,
    is_indexing         INTEGER NOT NULL DEFAULT 0
);
"#;

pub const V4_OBSERVER: &str = r#"
CREATE TABLE IF NOT EXISTS observer_file_nodes (
    project_id      TEXT NOT NULL,
    file_path       TEXT NOT NULL,
    touch_count     INTEGER NOT NULL DEFAULT 0,
    last_touched_at TEXT NOT NULL,
    PRIMARY KEY (project_id, file_path)
);

CREATE TABLE IF NOT EXISTS observer_co_access_edges (
    project_id     TEXT NOT NULL,
    file_a         TEXT NOT NULL,
    file_b         TEXT NOT NULL,
    co_count       INTEGER NOT NULL DEFAULT 0,
    last_seen_step INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (project_id, file_a, file_b)
);

CREATE TABLE IF NOT EXISTS observer_error_patterns (
    project_id    TEXT NOT NULL,
    signature     TEXT NOT NULL,
    repeat_count  INTEGER NOT NULL DEFAULT 0,
    last_seen_at  TEXT NOT NULL,
    PRIMARY KEY (project_id, signature)
);

CREATE TABLE IF NOT EXISTS observer_module_session_counts (
    project_id    TEXT NOT NULL,
    module        TEXT NOT NULL,
    session_count INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (project_id, module)
);

CREATE TABLE IF NOT EXISTS observer_synthesis_log (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id         TEXT NOT NULL,
    promoted_memory_id TEXT,
    reason             TEXT NOT NULL,
    created_at         TEXT NOT NULL
);
"#;
