//! Filter-as-trait (§9 "Filter-as-closure"): `search`'s `filter` parameter is
//! a predicate over memories, expressed as a trait object rather than a
//! bare closure so it can cross the worker/bridge boundary.

use crate::types::Memory;

/// A predicate over memories, used by `search` (§4.6) and the decider's
/// gotcha-injection trigger (§4.8) to exclude already-injected ids.
pub trait MemoryFilter: Send + Sync {
    fn keep(&self, memory: &Memory) -> bool;
}

/// Excludes memories whose id is in a given set — the decider's
/// `recentInjectedIds` use case.
pub struct ExcludeIds {
    pub excluded: std::collections::HashSet<crate::ids::MemoryId>,
}

impl MemoryFilter for ExcludeIds {
    fn keep(&self, memory: &Memory) -> bool {
        !self.excluded.contains(&memory.id)
    }
}

/// Combinator: every inner filter must keep the memory.
pub struct AllOf(pub Vec<Box<dyn MemoryFilter>>);

impl MemoryFilter for AllOf {
    fn keep(&self, memory: &Memory) -> bool {
        self.0.iter().all(|f| f.keep(memory))
    }
}
