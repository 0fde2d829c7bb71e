//! Query classification (§4.7): pick a query's dominant signal before
//! fan-out, so fusion weights can favor the path most likely to rank well.

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryClass {
    Identifier,
    Structural,
    Semantic,
}

/// Extensions carried by the AST extractor's supported languages. Kept as a
/// local list rather than a dependency on `recall-extract` — classification
/// only needs the suffix, not a parser.
const KNOWN_SOURCE_EXTENSIONS: &[&str] = &[
    ".ts", ".tsx", ".js", ".jsx", ".py", ".java", ".cs", ".go", ".rs", ".rb", ".php", ".kt",
];

/// Tool names whose presence in recent history signals the agent is doing
/// structural navigation (impact/dependency queries) rather than free-text
/// recall.
const STRUCTURAL_TOOLS: &[&str] = &["analyze_impact", "find_dependents", "graph_neighbors", "dependency_query"];

fn camel_case_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[a-z][a-z0-9]*[A-Z][a-zA-Z0-9]*").expect("camelCase pattern is a valid regex"))
}

fn has_identifier_signal(query: &str) -> bool {
    if query.contains('_') || query.contains('/') {
        return true;
    }
    if camel_case_pattern().is_match(query) {
        return true;
    }
    KNOWN_SOURCE_EXTENSIONS.iter().any(|ext| query.ends_with(ext))
}

fn recent_tool_calls_are_structural(recent_tool_calls: &[&str]) -> bool {
    recent_tool_calls.iter().any(|call| STRUCTURAL_TOOLS.contains(call))
}

pub fn classify(query: &str, recent_tool_calls: &[&str]) -> QueryClass {
    if has_identifier_signal(query) {
        return QueryClass::Identifier;
    }
    if recent_tool_calls_are_structural(recent_tool_calls) {
        return QueryClass::Structural;
    }
    QueryClass::Semantic
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_case_token_is_identifier() {
        assert_eq!(classify("getUserToken", &[]), QueryClass::Identifier);
    }

    #[test]
    fn snake_case_token_is_identifier() {
        assert_eq!(classify("jwt_token_expiry", &[]), QueryClass::Identifier);
    }

    #[test]
    fn path_like_query_is_identifier() {
        assert_eq!(classify("src/auth/middleware", &[]), QueryClass::Identifier);
    }

    #[test]
    fn source_extension_suffix_is_identifier() {
        assert_eq!(classify("middleware.ts", &[]), QueryClass::Identifier);
    }

    #[test]
    fn structural_tool_without_identifier_signal_is_structural() {
        assert_eq!(classify("what depends on this", &["analyze_impact"]), QueryClass::Structural);
    }

    #[test]
    fn plain_prose_is_semantic() {
        assert_eq!(classify("how does token refresh work", &[]), QueryClass::Semantic);
    }

    #[test]
    fn identifier_signal_wins_over_structural_tools() {
        assert_eq!(classify("getUserToken", &["analyze_impact"]), QueryClass::Identifier);
    }
}
