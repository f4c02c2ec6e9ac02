//! Grouping of multi-file configurations into service instances
//!
//! Services such as Kubernetes manifests or Terraform modules spread one logical
//! configuration over many files. Files are bucketed by a shortened directory key
//! and buckets whose keys extend another bucket's key are merged into it.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Grouping key for a file: its directory relative to `root` minus the two deepest segments
fn group_key(root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(root).ok()?;
    let segments: Vec<String> = relative
        .parent()
        .map(|dir| {
            dir.components()
                .filter_map(|c| match c {
                    Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    Some(match segments.len() {
        0 => String::new(),
        1 | 2 => segments[0].clone(),
        n => segments[..n - 2].join("/"),
    })
}

/// Buckets `files` by sub-path key and amalgamates the result.
///
/// Files outside `root` are skipped. Order within each bucket follows `files`.
pub fn group_by_subpath(root: &Path, files: &[PathBuf]) -> BTreeMap<String, Vec<PathBuf>> {
    let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for file in files {
        match group_key(root, file) {
            Some(key) => groups.entry(key).or_default().push(file.clone()),
            None => debug!(path = %file.display(), "File outside scan root, not grouped"),
        }
    }
    amalgamate(groups)
}

/// Merges every bucket into the first bucket whose non-empty key is a string prefix of its key.
///
/// Repeats until no pair of keys is in a prefix relation.
pub fn amalgamate(mut groups: BTreeMap<String, Vec<PathBuf>>) -> BTreeMap<String, Vec<PathBuf>> {
    while let Some((target, merged)) = find_merge(&groups) {
        if let Some(files) = groups.remove(&merged) {
            groups.entry(target).or_default().extend(files);
        }
    }
    groups
}

fn find_merge(groups: &BTreeMap<String, Vec<PathBuf>>) -> Option<(String, String)> {
    let keys: Vec<&String> = groups.keys().collect();
    for (i, a) in keys.iter().enumerate() {
        if a.is_empty() {
            continue;
        }
        if let Some(b) = keys[i + 1..].iter().find(|b| b.starts_with(a.as_str())) {
            return Some(((*a).clone(), (*b).clone()));
        }
    }
    None
}
