//! Contextual-prefix formatting shared by the chunker and the embedding
//! service (§4.2 "Contextual prefixing"). Centralized here so the exact
//! wire format can't drift between the crate that builds the text and the
//! crate that caches embeddings keyed on it.

use crate::types::{AstChunk, ChunkType, Memory};

/// `"File: {path} | {chunkType}: {name|unknown} | Lines: {start}-{end}\n\n{content}"`,
/// omitting the `chunkType` label when it is `module`.
pub fn chunk_context_prefix(chunk: &AstChunk) -> String {
    let name = chunk.name.as_deref().unwrap_or("unknown");
    let name_segment = match chunk.chunk_type {
        ChunkType::Module => name.to_string(),
        other => format!("{}: {name}", other.as_str()),
    };

    format!(
        "File: {} | {} | Lines: {}-{}\n\n{}",
        chunk.file_path, name_segment, chunk.start_line, chunk.end_line, chunk.content
    )
}

/// `"[Files: …] | [Module: first related module] | Type: {type}\n\n{content}"`,
/// omitting bracketed parts when empty; if everything is empty the content
/// is returned unmodified.
pub fn memory_context_prefix(memory: &Memory) -> String {
    let mut parts = Vec::new();

    if !memory.related_files.is_empty() {
        parts.push(format!("Files: {}", memory.related_files.join(", ")));
    }
    if let Some(module) = memory.related_modules.first() {
        parts.push(format!("Module: {module}"));
    }

    if parts.is_empty() {
        return memory.content.clone();
    }

    parts.push(format!("Type: {}", memory.memory_type.as_str()));
    format!("{}\n\n{}", parts.join(" | "), memory.content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MemoryType;

    #[test]
    fn chunk_prefix_omits_module_label() {
        let chunk = AstChunk {
            chunk_type: ChunkType::Module,
            name: None,
            file_path: "src/lib.rs".to_string(),
            start_line: 1,
            end_line: 10,
            content: "mod stuff;".to_string(),
        };
        let prefix = chunk_context_prefix(&chunk);
        assert_eq!(prefix, "File: src/lib.rs | unknown | Lines: 1-10\n\nmod stuff;");
    }

    #[test]
    fn chunk_prefix_includes_function_label_and_name() {
        let chunk = AstChunk {
            chunk_type: ChunkType::Function,
            name: Some("parse".to_string()),
            file_path: "src/parser.rs".to_string(),
            start_line: 12,
            end_line: 40,
            content: "fn parse() {}".to_string(),
        };
        let prefix = chunk_context_prefix(&chunk);
        assert_eq!(
            prefix,
            "File: src/parser.rs | function: parse | Lines: 12-40\n\nfn parse() {}"
        );
    }

    #[test]
    fn memory_prefix_is_content_only_when_everything_empty() {
        let memory = Memory::new("proj", MemoryType::Gotcha, "watch out");
        assert_eq!(memory_context_prefix(&memory), "watch out");
    }

    #[test]
    fn memory_prefix_includes_files_and_module() {
        let mut memory = Memory::new("proj", MemoryType::Gotcha, "watch out");
        memory.related_files = vec!["src/a.rs".to_string()];
        memory.related_modules = vec!["auth".to_string()];
        assert_eq!(
            memory_context_prefix(&memory),
            "Files: src/a.rs | Module: auth | Type: gotcha\n\nwatch out"
        );
    }
}
