//! Text scans for declarations the syntax tree does not retain reliably.

use crate::model::Import;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static PRAGMA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"pragma\s+solidity\s+([^;]+);").expect("pragma pattern is valid")
});

// import {A, B as C} from "path";
static NAMED_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"import\s*\{([^}]*)\}\s*from\s*["']([^"']+)["']"#)
        .expect("named import pattern is valid")
});

// import "path"; import "path" as X; import * as X from "path";
static DEFAULT_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"import\s+(?:\*\s+as\s+(\w+)\s+from\s+|(\w+)\s+from\s+)?["']([^"']+)["'](?:\s+as\s+(\w+))?"#,
    )
    .expect("default import pattern is valid")
});

/// Version constraint of the first `pragma solidity` directive, or empty.
pub fn extract_pragma(source: &str) -> String {
    PRAGMA
        .captures(source)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

/// Imports in source order. A path captured as a named import is never
/// added again as a default import.
pub fn extract_imports(source: &str) -> Vec<Import> {
    let mut found: Vec<(usize, Import)> = Vec::new();
    let mut named_paths: HashSet<String> = HashSet::new();

    for caps in NAMED_IMPORT.captures_iter(source) {
        let (Some(whole), Some(symbols), Some(path)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        let symbols: Vec<String> = symbols
            .as_str()
            .split(',')
            .filter_map(|s| s.split_whitespace().next())
            .map(str::to_owned)
            .collect();
        named_paths.insert(path.as_str().to_owned());
        found.push((
            whole.start(),
            Import {
                path: path.as_str().to_owned(),
                symbols,
                alias: None,
            },
        ));
    }

    for caps in DEFAULT_IMPORT.captures_iter(source) {
        let (Some(whole), Some(path)) = (caps.get(0), caps.get(3)) else {
            continue;
        };
        if named_paths.contains(path.as_str()) {
            continue;
        }
        let alias = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str().to_owned());
        found.push((
            whole.start(),
            Import {
                path: path.as_str().to_owned(),
                symbols: vec![],
                alias,
            },
        ));
    }

    found.sort_by_key(|(offset, _)| *offset);
    found.into_iter().map(|(_, import)| import).collect()
}
