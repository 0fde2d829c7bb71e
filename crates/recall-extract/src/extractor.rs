//! ASTExtractor (§4.4): one file in, a file node plus its local
//! declarations/imports/calls/exports out.

use recall_core::types::{GraphEdgeType, GraphNodeType};
use rustc_hash::FxHashMap;
use tree_sitter::{Node, Query, QueryCursor, StreamingIterator};

use crate::error::{ExtractError, Result};
use crate::language::Language;
use crate::registry::GrammarRegistry;

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedNode {
    pub label: String,
    pub node_type: GraphNodeType,
    pub start_line: u32,
    pub end_line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedEdge {
    pub from_label: String,
    pub to_label: String,
    pub edge_type: GraphEdgeType,
}

pub struct FileExtraction {
    pub language: Language,
    pub nodes: Vec<ExtractedNode>,
    pub edges: Vec<ExtractedEdge>,
}

pub struct AstExtractor {
    registry: GrammarRegistry,
}

struct Declaration {
    label: String,
    name: String,
    start_row: usize,
    end_row: usize,
}

fn line_range(node: &Node) -> (u32, u32) {
    (node.start_position().row as u32 + 1, node.end_position().row as u32 + 1)
}

fn capture_text<'a>(node: Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

impl AstExtractor {
    pub fn new(registry: GrammarRegistry) -> Self {
        Self { registry }
    }

    pub fn supports(&self, language: Language) -> bool {
        self.registry.supports(language)
    }

    pub fn extract_file(&self, file_path: &str, source: &str) -> Result<FileExtraction> {
        let language = Language::from_path(file_path).ok_or_else(|| ExtractError::UnsupportedLanguage(file_path.to_string()))?;
        let queries = self.registry.queries_for(language)?;
        let parser = self.registry.parser_for(language)?;

        let tree = {
            let mut guard = parser.lock().expect("parser mutex poisoned");
            guard.parse(source, None)
        };
        let Some(tree) = tree else {
            return Err(ExtractError::GrammarSetup {
                language: language.name().to_string(),
                message: "parser returned no tree".to_string(),
            });
        };

        let root = tree.root_node();
        let bytes = source.as_bytes();
        let line_count = source.lines().count().max(1) as u32;

        let mut nodes = Vec::new();
        let mut edges = Vec::new();

        nodes.push(ExtractedNode {
            label: file_path.to_string(),
            node_type: GraphNodeType::File,
            start_line: 1,
            end_line: line_count,
        });

        let mut declarations: Vec<Declaration> = Vec::new();

        // Declarations: classes/interfaces/enums/type aliases, then functions/methods.
        for (query, is_function_query) in [(&queries.class, false), (&queries.function, true)] {
            let mut cursor = QueryCursor::new();
            let mut matches = cursor.matches(query, root, bytes);
            while let Some(m) = matches.next() {
                let mut name = String::new();
                let mut decl_node: Option<Node> = None;
                let mut node_type = if is_function_query { GraphNodeType::Function } else { GraphNodeType::Class };

                for capture in m.captures {
                    match query_capture_name(query, capture.index) {
                        "name" => name = capture_text(capture.node, bytes).to_string(),
                        "function" => {
                            node_type = GraphNodeType::Function;
                            decl_node = Some(capture.node);
                        }
                        "method" => {
                            node_type = GraphNodeType::Method;
                            decl_node = Some(capture.node);
                        }
                        "class" => {
                            node_type = GraphNodeType::Class;
                            decl_node = Some(capture.node);
                        }
                        "interface" => {
                            node_type = GraphNodeType::Interface;
                            decl_node = Some(capture.node);
                        }
                        "enum" => {
                            node_type = GraphNodeType::Enum;
                            decl_node = Some(capture.node);
                        }
                        "type_alias" => {
                            node_type = GraphNodeType::TypeAlias;
                            decl_node = Some(capture.node);
                        }
                        _ => {}
                    }
                }

                let (Some(decl_node), false) = (decl_node, name.is_empty()) else {
                    continue;
                };

                let label = format!("{file_path}:{name}");
                let (start_line, end_line) = line_range(&decl_node);
                nodes.push(ExtractedNode {
                    label: label.clone(),
                    node_type,
                    start_line,
                    end_line,
                });
                edges.push(ExtractedEdge {
                    from_label: label.clone(),
                    to_label: file_path.to_string(),
                    edge_type: GraphEdgeType::DefinedIn,
                });
                declarations.push(Declaration {
                    label,
                    name,
                    start_row: decl_node.start_position().row,
                    end_row: decl_node.end_position().row,
                });
            }
        }

        // Imports.
        {
            let mut cursor = QueryCursor::new();
            let mut matches = cursor.matches(&queries.import, root, bytes);
            while let Some(m) = matches.next() {
                for capture in m.captures {
                    if query_capture_name(&queries.import, capture.index) == "module" {
                        let module = unquote(capture_text(capture.node, bytes));
                        edges.push(ExtractedEdge {
                            from_label: file_path.to_string(),
                            to_label: module,
                            edge_type: GraphEdgeType::Imports,
                        });
                    }
                }
            }
        }

        if let Some(import_from) = &queries.import_from {
            let mut cursor = QueryCursor::new();
            let mut matches = cursor.matches(import_from, root, bytes);
            while let Some(m) = matches.next() {
                let mut module = String::new();
                let mut symbol = String::new();
                for capture in m.captures {
                    match query_capture_name(import_from, capture.index) {
                        "module" => module = unquote(capture_text(capture.node, bytes)),
                        "symbol" => symbol = capture_text(capture.node, bytes).to_string(),
                        _ => {}
                    }
                }
                if module.is_empty() {
                    continue;
                }
                edges.push(ExtractedEdge {
                    from_label: file_path.to_string(),
                    to_label: module.clone(),
                    edge_type: GraphEdgeType::Imports,
                });
                if !symbol.is_empty() {
                    edges.push(ExtractedEdge {
                        from_label: file_path.to_string(),
                        to_label: format!("{module}:{symbol}"),
                        edge_type: GraphEdgeType::ImportsSymbol,
                    });
                }
            }
        }

        // Exports: file -> inner symbol.
        if let Some(export) = &queries.export {
            let mut cursor = QueryCursor::new();
            let mut matches = cursor.matches(export, root, bytes);
            while let Some(m) = matches.next() {
                for capture in m.captures {
                    if query_capture_name(export, capture.index) == "declaration" {
                        if let Some(name) = declaration_name(capture.node, bytes) {
                            edges.push(ExtractedEdge {
                                from_label: file_path.to_string(),
                                to_label: format!("{file_path}:{name}"),
                                edge_type: GraphEdgeType::Exports,
                            });
                        }
                    }
                }
            }
        }

        // Calls: resolve the enclosing named declaration, then emit an edge
        // to the local declaration if the callee name matches one, else to
        // the bare callee name (left for the indexer to treat as external).
        let by_name: FxHashMap<&str, &str> = declarations.iter().map(|d| (d.name.as_str(), d.label.as_str())).collect();
        {
            let mut cursor = QueryCursor::new();
            let mut matches = cursor.matches(&queries.call, root, bytes);
            while let Some(m) = matches.next() {
                let mut callee = String::new();
                let mut call_row = None;
                for capture in m.captures {
                    match query_capture_name(&queries.call, capture.index) {
                        "callee" => callee = capture_text(capture.node, bytes).to_string(),
                        "call" => call_row = Some(capture.node.start_position().row),
                        _ => {}
                    }
                }
                let (Some(call_row), false) = (call_row, callee.is_empty()) else {
                    continue;
                };

                let Some(enclosing) = declarations.iter().find(|d| d.start_row <= call_row && call_row <= d.end_row) else {
                    continue;
                };

                let to_label = by_name.get(callee.as_str()).map(|s| s.to_string()).unwrap_or(callee);
                edges.push(ExtractedEdge {
                    from_label: enclosing.label.clone(),
                    to_label,
                    edge_type: GraphEdgeType::Calls,
                });
            }
        }

        Ok(FileExtraction { language, nodes, edges })
    }
}

fn query_capture_name(query: &Query, index: u32) -> &str {
    query.capture_names()[index as usize]
}

fn unquote(text: &str) -> String {
    text.trim_matches(|c| c == '"' || c == '\'' || c == '`').to_string()
}

/// Best-effort symbol name for an `export_statement`'s wrapped declaration:
/// the first `identifier`/`type_identifier` child, which covers functions,
/// classes, and `const`/`let` bindings alike.
fn declaration_name(node: Node, source: &[u8]) -> Option<String> {
    if matches!(node.kind(), "variable_declaration" | "lexical_declaration") {
        let declarator = node.named_child(0)?;
        let name = declarator.child_by_field_name("name")?;
        return name.utf8_text(source).ok().map(str::to_string);
    }
    if let Some(name) = node.child_by_field_name("name") {
        return name.utf8_text(source).ok().map(str::to_string);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if matches!(child.kind(), "identifier" | "type_identifier" | "property_identifier") {
            return child.utf8_text(source).ok().map(str::to_string);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> AstExtractor {
        AstExtractor::new(GrammarRegistry::new())
    }

    #[test]
    fn rust_file_emits_file_node_and_function_defined_in_edge() {
        let extraction = extractor().extract_file("src/lib.rs", "pub fn hello() {}\n").unwrap();
        assert!(extraction.nodes.iter().any(|n| n.label == "src/lib.rs" && n.node_type == GraphNodeType::File));
        assert!(extraction.nodes.iter().any(|n| n.label == "src/lib.rs:hello" && n.node_type == GraphNodeType::Function));
        assert!(extraction
            .edges
            .iter()
            .any(|e| e.from_label == "src/lib.rs:hello" && e.to_label == "src/lib.rs" && e.edge_type == GraphEdgeType::DefinedIn));
    }

    #[test]
    fn rust_local_call_resolves_to_local_declaration_label() {
        let source = "fn helper() {}\nfn caller() { helper(); }\n";
        let extraction = extractor().extract_file("src/lib.rs", source).unwrap();
        assert!(extraction.edges.iter().any(|e| {
            e.from_label == "src/lib.rs:caller" && e.to_label == "src/lib.rs:helper" && e.edge_type == GraphEdgeType::Calls
        }));
    }

    #[test]
    fn python_import_from_emits_module_and_symbol_edges() {
        let source = "from os import path\n";
        let extraction = extractor().extract_file("script.py", source).unwrap();
        assert!(extraction
            .edges
            .iter()
            .any(|e| e.edge_type == GraphEdgeType::Imports && e.to_label == "os"));
        assert!(extraction
            .edges
            .iter()
            .any(|e| e.edge_type == GraphEdgeType::ImportsSymbol && e.to_label == "os:path"));
    }

    #[test]
    fn unsupported_extension_errors() {
        let result = extractor().extract_file("README.md", "# hi");
        assert!(result.is_err());
    }
}
