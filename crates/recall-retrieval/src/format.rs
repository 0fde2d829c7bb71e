//! `formattedContext` (§4.7 "Materialization"): a markdown block grouping
//! the final memory list by type, in the order types first appear.

use recall_core::types::{Memory, MemoryType};

pub fn format_context(memories: &[Memory]) -> String {
    if memories.is_empty() {
        return String::new();
    }

    let mut order: Vec<MemoryType> = Vec::new();
    let mut by_type: std::collections::HashMap<MemoryType, Vec<&Memory>> = std::collections::HashMap::new();
    for memory in memories {
        if !by_type.contains_key(&memory.memory_type) {
            order.push(memory.memory_type);
        }
        by_type.entry(memory.memory_type).or_default().push(memory);
    }

    let mut out = String::new();
    for memory_type in order {
        out.push_str(&format!("## {}\n\n", memory_type.heading()));
        for memory in &by_type[&memory_type] {
            out.push_str(&format!("- {}\n", memory.content));
        }
        out.push('\n');
    }

    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_by_type_with_heading() {
        let mut m = Memory::new("proj", MemoryType::Gotcha, "JWT token expiry must be checked in middleware");
        m.memory_type = MemoryType::Gotcha;
        let formatted = format_context(&[m]);
        assert!(formatted.contains("## Gotcha"));
        assert!(formatted.contains("JWT token expiry"));
    }

    #[test]
    fn empty_list_formats_to_empty_string() {
        assert_eq!(format_context(&[]), "");
    }
}
