//! The Chunker half of §4.4: partitions a file into `AstChunk`s for
//! embedding, independent of (but sharing grammars with) `AstExtractor`.

use recall_core::types::{AstChunk, ChunkType};
use tree_sitter::{QueryCursor, StreamingIterator};

use crate::language::Language;
use crate::registry::GrammarRegistry;

const PROSE_CHUNK_LINES: usize = 100;

pub struct Chunker {
    registry: GrammarRegistry,
}

struct Declaration {
    chunk_type: ChunkType,
    name: String,
    start_row: usize,
    end_row: usize,
}

impl Chunker {
    pub fn new(registry: GrammarRegistry) -> Self {
        Self { registry }
    }

    pub fn chunk_file(&self, file_path: &str, source: &str) -> Vec<AstChunk> {
        if let Some(language) = Language::from_path(file_path) {
            if self.registry.supports(language) {
                if let Some(chunks) = self.chunk_declarations(file_path, source, language) {
                    return chunks;
                }
            }
        }
        prose_chunks(file_path, source)
    }

    fn chunk_declarations(&self, file_path: &str, source: &str, language: Language) -> Option<Vec<AstChunk>> {
        let queries = self.registry.queries_for(language).ok()?;
        let parser = self.registry.parser_for(language).ok()?;
        let tree = {
            let mut guard = parser.lock().expect("parser mutex poisoned");
            guard.parse(source, None)
        }?;

        let root = tree.root_node();
        let bytes = source.as_bytes();
        let lines: Vec<&str> = source.lines().collect();

        let mut declarations = Vec::new();
        for (query, default_kind) in [(&queries.class, ChunkType::Class), (&queries.function, ChunkType::Function)] {
            let mut cursor = QueryCursor::new();
            let mut matches = cursor.matches(query, root, bytes);
            while let Some(m) = matches.next() {
                let mut name = None;
                let mut decl = None;
                let mut chunk_type = default_kind;
                for capture in m.captures {
                    match query.capture_names()[capture.index as usize] {
                        "name" => name = capture.node.utf8_text(bytes).ok().map(str::to_string),
                        "function" | "method" => {
                            chunk_type = ChunkType::Function;
                            decl = Some(capture.node);
                        }
                        "class" | "interface" | "enum" | "type_alias" => {
                            chunk_type = ChunkType::Class;
                            decl = Some(capture.node);
                        }
                        _ => {}
                    }
                }
                let (Some(decl), Some(name)) = (decl, name) else {
                    continue;
                };
                declarations.push(Declaration {
                    chunk_type,
                    name,
                    start_row: decl.start_position().row,
                    end_row: decl.end_position().row,
                });
            }
        }
        declarations.sort_by_key(|d| d.start_row);

        let mut chunks = Vec::with_capacity(declarations.len());
        let mut covered = vec![false; lines.len()];
        for decl in &declarations {
            let end_row = decl.end_row.min(lines.len().saturating_sub(1));
            for row in decl.start_row..=end_row {
                if let Some(slot) = covered.get_mut(row) {
                    *slot = true;
                }
            }
            chunks.push(AstChunk {
                chunk_type: decl.chunk_type,
                name: Some(decl.name.clone()),
                file_path: file_path.to_string(),
                start_line: decl.start_row as u32 + 1,
                end_line: end_row as u32 + 1,
                content: lines[decl.start_row..=end_row].join("\n"),
            });
        }

        chunks.extend(module_chunks_for_uncovered(file_path, &lines, &covered));
        chunks.sort_by_key(|c| c.start_line);
        Some(chunks)
    }
}

/// Groups contiguous non-blank top-level lines the declaration pass didn't
/// claim into `module` chunks (import blocks, top-level statements/consts).
fn module_chunks_for_uncovered(file_path: &str, lines: &[&str], covered: &[bool]) -> Vec<AstChunk> {
    let mut chunks = Vec::new();
    let mut run_start: Option<usize> = None;

    let mut flush = |start: usize, end: usize, chunks: &mut Vec<AstChunk>| {
        let content = lines[start..=end].join("\n");
        if content.trim().is_empty() {
            return;
        }
        chunks.push(AstChunk {
            chunk_type: ChunkType::Module,
            name: None,
            file_path: file_path.to_string(),
            start_line: start as u32 + 1,
            end_line: end as u32 + 1,
            content,
        });
    };

    for (row, line) in lines.iter().enumerate() {
        let is_uncovered = !covered[row];
        if is_uncovered && !line.trim().is_empty() {
            run_start.get_or_insert(row);
        } else if let Some(start) = run_start.take() {
            flush(start, row - 1, &mut chunks);
        }
    }
    if let Some(start) = run_start {
        flush(start, lines.len() - 1, &mut chunks);
    }

    chunks
}

fn prose_chunks(file_path: &str, source: &str) -> Vec<AstChunk> {
    let lines: Vec<&str> = source.lines().collect();
    if lines.is_empty() {
        return Vec::new();
    }
    lines
        .chunks(PROSE_CHUNK_LINES)
        .enumerate()
        .map(|(i, slice)| AstChunk {
            chunk_type: ChunkType::Prose,
            name: None,
            file_path: file_path.to_string(),
            start_line: (i * PROSE_CHUNK_LINES) as u32 + 1,
            end_line: (i * PROSE_CHUNK_LINES + slice.len()) as u32,
            content: slice.join("\n"),
        })
        .collect()
}
