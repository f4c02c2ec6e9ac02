//! Glob patterns evaluated against the virtual filesystem
//!
//! Include directives and standard locations use shell-style wildcards
//! (`conf.d/*.conf`, `/etc/postgresql/*/main/postgresql.conf`). Patterns are
//! translated into anchored regular expressions with every non-wildcard character
//! escaped, and evaluated by walking only the wildcard-free directory prefix.

use super::symlink::reroot;
use super::walk::walk_dir;
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Returns true if the text contains a glob wildcard
pub fn has_wildcard(text: &str) -> bool {
    text.contains(['*', '?'])
}

/// Translates a glob into a regex fragment (unanchored).
///
/// `*` matches within a single path segment, `?` matches one non-separator
/// character and everything else is matched literally.
pub fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() * 2);
    let mut literal = String::new();

    for ch in glob.chars() {
        match ch {
            '*' | '?' => {
                out.push_str(&regex::escape(&literal));
                literal.clear();
                out.push_str(if ch == '*' { "[^/]*" } else { "[^/]" });
            }
            _ => literal.push(ch),
        }
    }
    out.push_str(&regex::escape(&literal));

    out
}

/// Longest leading part of `path` whose components contain no wildcard
pub fn static_prefix(path: &Path) -> PathBuf {
    let mut prefix = PathBuf::new();
    for component in path.components() {
        if let Component::Normal(part) = component {
            if has_wildcard(&part.to_string_lossy()) {
                break;
            }
        }
        prefix.push(component.as_os_str());
    }
    prefix
}

/// Expands a virtual-filesystem pattern (absolute, possibly with wildcards) under `root`
pub fn expand(root: &Path, pattern: &str) -> Vec<PathBuf> {
    matching_paths(&reroot(root, Path::new(pattern)))
}

/// Lists existing entries (files, directories or links) matching a real glob path.
///
/// The path must already be absolute on the host; results are sorted by name.
pub fn matching_paths(pattern: &Path) -> Vec<PathBuf> {
    let text = pattern.to_string_lossy();
    if !has_wildcard(&text) {
        return if std::fs::symlink_metadata(pattern).is_ok() {
            vec![pattern.to_path_buf()]
        } else {
            Vec::new()
        };
    }

    let base = static_prefix(pattern);
    let rest = match pattern.strip_prefix(&base) {
        Ok(rest) => rest,
        Err(_) => return Vec::new(),
    };
    let depth = rest.components().count();

    let base_text = base.to_string_lossy();
    let separator = if base_text.ends_with('/') { "" } else { "/" };
    let source = format!(
        "^{}{}{}$",
        regex::escape(&base_text),
        regex::escape(separator),
        glob_to_regex(&rest.to_string_lossy())
    );
    let matcher = match Regex::new(&source) {
        Ok(re) => re,
        Err(err) => {
            debug!(pattern = %text, error = %err, "Glob does not translate to a valid regex");
            return Vec::new();
        }
    };

    walk_dir(&base, Some(depth))
        .into_iter()
        .filter(|path| matcher.is_match(&path.to_string_lossy()))
        .collect()
}
