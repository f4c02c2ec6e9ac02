//! Reconstruction of include-directive aliases
//!
//! A directive such as `include ../../nginx.conf.d/*.conf;` is resolved to concrete
//! files on disk. To recognise the same inclusion later, each staged file records
//! the directive text rewritten for that file (`../../nginx.conf.d/extra.conf`).

use regex::Regex;
use tracing::debug;

pub use crate::fs::glob::glob_to_regex;

/// Splits the leading run of `./`, `../` and `/` from a pattern
pub fn split_relative_prefix(pattern: &str) -> (&str, &str) {
    let mut rest = pattern;
    loop {
        if let Some(stripped) = rest.strip_prefix("../") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('/') {
            rest = stripped;
        } else {
            break;
        }
    }
    let consumed = pattern.len() - rest.len();
    (&pattern[..consumed], rest)
}

/// Rewrites `original_pattern` into the alias under which `concrete_path` was included.
///
/// The pattern core (without its relative prefix) must match a trailing,
/// segment-aligned part of `concrete_path`. Directory patterns match literally;
/// file patterns are globs optionally followed by `suffix_pattern`, a regex fragment.
pub fn adapt(
    original_pattern: &str,
    is_directory: bool,
    concrete_path: &str,
    suffix_pattern: &str,
) -> Option<String> {
    let (prefix, core) = split_relative_prefix(original_pattern);
    if core.is_empty() {
        return None;
    }

    let source = if is_directory {
        format!(
            "(?:^|/)({})(?:/|$)",
            regex::escape(core.trim_end_matches('/'))
        )
    } else {
        format!("(?:^|/)({}{})$", glob_to_regex(core), suffix_pattern)
    };

    let matcher = match Regex::new(&source) {
        Ok(re) => re,
        Err(err) => {
            debug!(pattern = %original_pattern, error = %err, "Include pattern is not adaptable");
            return None;
        }
    };

    let start = matcher.captures(concrete_path)?.get(1)?.start();
    Some(format!("{}{}", prefix, &concrete_path[start..]))
}
