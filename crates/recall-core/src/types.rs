//! Entity types shared across the workspace (§3.1).
//!
//! JSON-collection fields are typed `Vec<String>` / `serde_json::Value` in
//! memory and serialized to a single TEXT column on write — the "dynamic
//! JSON blobs in columns" pattern is confined to the storage layer's
//! (de)serialization surface, never threaded through these structs raw.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::MemoryId;

/// Classification of a [`Memory`] (§3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    Gotcha,
    ErrorPattern,
    DeadEnd,
    Preference,
    Decision,
    Pattern,
    WorkflowRecipe,
    TaskCalibration,
    CausalDependency,
    WorkUnitOutcome,
    E2eObservation,
    Requirement,
}

impl MemoryType {
    /// Section heading used by [`crate::types::Memory`] formatters
    /// (e.g. the retrieval pipeline's `formattedContext`).
    pub fn heading(&self) -> &'static str {
        match self {
            MemoryType::Gotcha => "Gotcha",
            MemoryType::ErrorPattern => "Error Pattern",
            MemoryType::DeadEnd => "Dead End",
            MemoryType::Preference => "Preference",
            MemoryType::Decision => "Decision",
            MemoryType::Pattern => "Pattern",
            MemoryType::WorkflowRecipe => "Workflow Recipe",
            MemoryType::TaskCalibration => "Task Calibration",
            MemoryType::CausalDependency => "Causal Dependency",
            MemoryType::WorkUnitOutcome => "Work Unit Outcome",
            MemoryType::E2eObservation => "E2E Observation",
            MemoryType::Requirement => "Requirement",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryType::Gotcha => "gotcha",
            MemoryType::ErrorPattern => "error_pattern",
            MemoryType::DeadEnd => "dead_end",
            MemoryType::Preference => "preference",
            MemoryType::Decision => "decision",
            MemoryType::Pattern => "pattern",
            MemoryType::WorkflowRecipe => "workflow_recipe",
            MemoryType::TaskCalibration => "task_calibration",
            MemoryType::CausalDependency => "causal_dependency",
            MemoryType::WorkUnitOutcome => "work_unit_outcome",
            MemoryType::E2eObservation => "e2e_observation",
            MemoryType::Requirement => "requirement",
        }
    }
}

impl std::str::FromStr for MemoryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "gotcha" => MemoryType::Gotcha,
            "error_pattern" => MemoryType::ErrorPattern,
            "dead_end" => MemoryType::DeadEnd,
            "preference" => MemoryType::Preference,
            "decision" => MemoryType::Decision,
            "pattern" => MemoryType::Pattern,
            "workflow_recipe" => MemoryType::WorkflowRecipe,
            "task_calibration" => MemoryType::TaskCalibration,
            "causal_dependency" => MemoryType::CausalDependency,
            "work_unit_outcome" => MemoryType::WorkUnitOutcome,
            "e2e_observation" => MemoryType::E2eObservation,
            "requirement" => MemoryType::Requirement,
            other => return Err(format!("unknown memory type: {other}")),
        })
    }
}

impl std::fmt::Display for MemoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scope of a [`Memory`] (§3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryScope {
    Global,
    Module,
}

/// Sort order for [`crate::types::SearchFilters`] (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Recency,
    Confidence,
    Access,
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::Access
    }
}

/// A structured relation from one memory to another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRelation {
    pub target_id: MemoryId,
    pub relation_type: String,
}

/// A durable unit of agent-extracted knowledge (§3.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: MemoryId,
    pub memory_type: MemoryType,
    pub content: String,
    pub citation: Option<String>,

    pub confidence: f32,
    pub access_count: u64,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    pub decay_half_life_days: Option<f32>,

    pub project_id: String,
    pub scope: MemoryScope,
    pub session_id: Option<String>,
    pub provenance_session_ids: Vec<String>,
    pub work_unit_ref: Option<String>,
    pub methodology: Option<String>,

    pub related_files: Vec<String>,
    pub related_modules: Vec<String>,
    pub target_node_id: Option<String>,
    pub impacted_node_ids: Vec<String>,
    pub relations: Vec<MemoryRelation>,
    pub tags: Vec<String>,

    pub pinned: bool,
    pub needs_review: bool,
    pub user_verified: bool,
    pub deprecated: bool,
    pub deprecated_at: Option<DateTime<Utc>>,
    pub stale_at: Option<DateTime<Utc>>,

    pub chunk_type: Option<String>,
    pub chunk_start_line: Option<u32>,
    pub chunk_end_line: Option<u32>,
    pub context_prefix: Option<String>,
    pub embedding_model_id: Option<String>,
}

impl Memory {
    /// A freshly-constructed memory with spec-documented defaults
    /// (confidence 1.0, scope global, not pinned/deprecated/reviewed).
    pub fn new(project_id: impl Into<String>, memory_type: MemoryType, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: MemoryId::new(),
            memory_type,
            content: content.into(),
            citation: None,
            confidence: 1.0,
            access_count: 0,
            created_at: now,
            last_accessed_at: now,
            decay_half_life_days: None,
            project_id: project_id.into(),
            scope: MemoryScope::Global,
            session_id: None,
            provenance_session_ids: Vec::new(),
            work_unit_ref: None,
            methodology: None,
            related_files: Vec::new(),
            related_modules: Vec::new(),
            target_node_id: None,
            impacted_node_ids: Vec::new(),
            relations: Vec::new(),
            tags: Vec::new(),
            pinned: false,
            needs_review: false,
            user_verified: false,
            deprecated: false,
            deprecated_at: None,
            stale_at: None,
            chunk_type: None,
            chunk_start_line: None,
            chunk_end_line: None,
            context_prefix: None,
            embedding_model_id: None,
        }
    }
}

/// 1-to-1 with [`Memory`] (§3.1). `vector` is always L2-normalized (I7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEmbedding {
    pub memory_id: MemoryId,
    pub model_id: String,
    pub dims: usize,
    pub vector: Vec<f32>,
}

/// Type of a [`GraphNode`] (§3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphNodeType {
    File,
    Function,
    Method,
    Class,
    Interface,
    Enum,
    Module,
    TypeAlias,
}

impl GraphNodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphNodeType::File => "file",
            GraphNodeType::Function => "function",
            GraphNodeType::Method => "method",
            GraphNodeType::Class => "class",
            GraphNodeType::Interface => "interface",
            GraphNodeType::Enum => "enum",
            GraphNodeType::Module => "module",
            GraphNodeType::TypeAlias => "type_alias",
        }
    }
}

impl std::str::FromStr for GraphNodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "file" => GraphNodeType::File,
            "function" => GraphNodeType::Function,
            "method" => GraphNodeType::Method,
            "class" => GraphNodeType::Class,
            "interface" => GraphNodeType::Interface,
            "enum" => GraphNodeType::Enum,
            "module" => GraphNodeType::Module,
            "type_alias" => GraphNodeType::TypeAlias,
            other => return Err(format!("unknown graph node type: {other}")),
        })
    }
}

/// Confidence of a [`GraphNode`] or [`GraphEdge`]: AST-derived facts are
/// `Inferred`; user- or tool-confirmed facts are `Verified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeConfidence {
    Inferred,
    Verified,
}

/// A typed code symbol (§3.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub project_id: String,
    pub node_type: GraphNodeType,
    pub label: String,
    pub file_path: Option<String>,
    pub language: Option<String>,
    pub start_line: Option<u32>,
    pub end_line: Option<u32>,
    pub layer: u8,
    pub source: String,
    pub confidence: NodeConfidence,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub stale_at: Option<DateTime<Utc>>,
    pub associated_memory_ids: Vec<MemoryId>,
}

/// Type of a [`GraphEdge`] (§3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphEdgeType {
    Imports,
    ImportsSymbol,
    Calls,
    DefinedIn,
    Exports,
    Extends,
    Implements,
}

impl GraphEdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphEdgeType::Imports => "imports",
            GraphEdgeType::ImportsSymbol => "imports_symbol",
            GraphEdgeType::Calls => "calls",
            GraphEdgeType::DefinedIn => "defined_in",
            GraphEdgeType::Exports => "exports",
            GraphEdgeType::Extends => "extends",
            GraphEdgeType::Implements => "implements",
        }
    }
}

impl std::str::FromStr for GraphEdgeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "imports" => GraphEdgeType::Imports,
            "imports_symbol" => GraphEdgeType::ImportsSymbol,
            "calls" => GraphEdgeType::Calls,
            "defined_in" => GraphEdgeType::DefinedIn,
            "exports" => GraphEdgeType::Exports,
            "extends" => GraphEdgeType::Extends,
            "implements" => GraphEdgeType::Implements,
            other => return Err(format!("unknown graph edge type: {other}")),
        })
    }
}

/// A typed directional relation between two [`GraphNode`]s (§3.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub from_id: String,
    pub to_id: String,
    pub edge_type: GraphEdgeType,
    pub weight: f32,
    pub confidence: NodeConfidence,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub stale_at: Option<DateTime<Utc>>,
}

/// A precomputed transitive-reachability row (§3.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphClosureRow {
    pub ancestor: String,
    pub descendant: String,
    pub depth: u32,
    pub path: Vec<String>,
    pub edge_types: Vec<GraphEdgeType>,
    pub total_weight: f32,
}

/// Structural search filters (§4.6). `query` set routes through the
/// retrieval pipeline; unset routes through direct SQL filtering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    pub query: Option<String>,
    pub project_id: String,
    pub scope: Option<MemoryScope>,
    pub types: Vec<MemoryType>,
    pub sources: Vec<String>,
    pub related_files: Vec<String>,
    pub min_confidence: Option<f32>,
    pub exclude_deprecated: bool,
    pub sort: Option<SortOrder>,
    pub limit: Option<usize>,
}

impl Default for MemoryScope {
    fn default() -> Self {
        MemoryScope::Global
    }
}

/// Kind of an [`AstChunk`] (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    Function,
    Class,
    Module,
    Prose,
}

impl ChunkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkType::Function => "function",
            ChunkType::Class => "class",
            ChunkType::Module => "module",
            ChunkType::Prose => "prose",
        }
    }
}

impl std::fmt::Display for ChunkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A contiguous slice of source produced by the chunker (§4.4), shared
/// between `recall-extract` (producer) and `recall-embeddings` (consumer
/// of its contextual-prefix format) so neither depends on the other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AstChunk {
    pub chunk_type: ChunkType,
    pub name: Option<String>,
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub content: String,
}
