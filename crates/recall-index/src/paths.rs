//! Path bookkeeping: project-relative labels and relative-import resolution.
//! Node/edge labels are always project-relative, forward-slash paths, so
//! that ids are stable across machines.

use std::path::{Path, PathBuf};

pub fn relative_label(project_root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(project_root).ok()?;
    let as_str = rel.to_str()?.replace('\\', "/");
    Some(as_str)
}

/// Resolves a relative import specifier (`./utils`, `../lib/foo`) against
/// the importing file's directory into a project-relative label. Doesn't
/// attempt a real module resolver's full search (`index.ts`, `package.json`
/// "main" fields); the one heuristic it does apply is extension inference —
/// a bare specifier with no extension of its own is assumed to share the
/// importing file's extension, the overwhelmingly common case for sibling
/// modules in the same language. The result converges onto the real file
/// node once that file is itself indexed, since `NodeId::make` is
/// deterministic on the resolved label.
pub fn resolve_relative_import(importing_file_label: &str, specifier: &str) -> String {
    let mut segments: Vec<&str> = Path::new(importing_file_label)
        .parent()
        .map(|p| p.iter().filter_map(|c| c.to_str()).collect())
        .unwrap_or_default();

    for part in specifier.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let joined: PathBuf = segments.iter().collect();
    let mut resolved = joined.to_str().unwrap_or(specifier).replace('\\', "/");

    if Path::new(&resolved).extension().is_none() {
        if let Some(ext) = Path::new(importing_file_label).extension().and_then(|e| e.to_str()) {
            resolved = format!("{resolved}.{ext}");
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_sibling_relative_import_inferring_the_importer_extension() {
        assert_eq!(resolve_relative_import("src/components/button.ts", "./helpers"), "src/components/helpers.ts");
    }

    #[test]
    fn resolves_parent_relative_import() {
        assert_eq!(resolve_relative_import("src/components/button.ts", "../lib/format"), "src/lib/format.ts");
    }

    #[test]
    fn an_explicit_extension_in_the_specifier_is_left_alone() {
        assert_eq!(resolve_relative_import("src/components/button.ts", "./helpers.js"), "src/components/helpers.js");
    }

    #[test]
    fn relative_label_strips_project_root() {
        let root = Path::new("/repo");
        let path = Path::new("/repo/src/lib.rs");
        assert_eq!(relative_label(root, path).as_deref(), Some("src/lib.rs"));
    }
}
