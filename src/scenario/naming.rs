// src/scenario/naming.rs

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::fs::FileSystem;

/// Longest normalized title kept in a scenario file name.
pub const MAX_TITLE_CHARS: usize = 64;

static STRIPPED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[/\\\-'=,():*#]").expect("static regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s").expect("static regex"));

/// Turn a scenario title into a file name prefix.
///
/// `"Routing (with bollards): basic"` at line 12 becomes
/// `"12_routing_with_bollards_basic"`. The line number keeps two scenarios
/// with the same title apart.
pub fn name_for(title: &str, line: u32) -> String {
    let lowered = title.to_lowercase();
    let stripped = STRIPPED.replace_all(&lowered, "");
    let underscored = WHITESPACE.replace_all(&stripped, "_");
    let name: String = underscored
        .replace("__", "_")
        .replace("..", ".")
        .chars()
        .take(MAX_TITLE_CHARS)
        .collect();
    format!("{line}_{name}")
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and try again.
///
/// Returns `None` if the path cannot be reasonably related to `root`.
pub fn relative_str(fs: &dyn FileSystem, root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        let s = rel.to_string_lossy().replace('\\', "/");
        return Some(s);
    }

    if let (Ok(root_canon), Ok(path_canon)) = (fs.canonicalize(root), fs.canonicalize(path)) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            let s = rel.to_string_lossy().replace('\\', "/");
            return Some(s);
        }
    }

    None
}
