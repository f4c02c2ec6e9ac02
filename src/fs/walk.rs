//! Directory walking over the scan root

use ignore::{overrides::OverrideBuilder, WalkBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Walks the whole scan root and returns every file and symlink, sorted by name.
///
/// `excluded_dirs` uses gitignore syntax: `/proc` excludes only the top-level
/// directory while `node_modules` excludes it at any depth. Version-control ignore
/// files are deliberately not honored because the root is a foreign filesystem.
pub fn walk_files(root: &Path, excluded_dirs: &[String]) -> Vec<PathBuf> {
    let mut override_builder = OverrideBuilder::new(root);
    for excluded in excluded_dirs {
        let glob = format!("!{}/", excluded.trim_end_matches('/'));
        if let Err(err) = override_builder.add(&glob) {
            warn!(pattern = %excluded, error = %err, "Ignoring invalid excluded directory");
        }
    }
    let overrides = match override_builder.build() {
        Ok(overrides) => overrides,
        Err(err) => {
            warn!(error = %err, "Failed to build exclusion list, scanning everything");
            ignore::overrides::Override::empty()
        }
    };

    let mut files = Vec::new();
    for result in WalkBuilder::new(root)
        .hidden(false)
        .ignore(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .parents(false)
        .follow_links(false)
        .overrides(overrides)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build()
    {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                debug!(error = %err, "Failed to read directory entry");
                continue;
            }
        };

        let is_candidate = entry
            .file_type()
            .map(|ft| ft.is_file() || ft.is_symlink())
            .unwrap_or(false);
        if is_candidate {
            files.push(entry.into_path());
        }
    }

    debug!(root = %root.display(), files = files.len(), "Filesystem walk completed");
    files
}

/// Lists entries below `dir` (excluding `dir` itself) up to `max_depth` levels, sorted by name
pub fn walk_dir(dir: &Path, max_depth: Option<usize>) -> Vec<PathBuf> {
    let mut walker = WalkDir::new(dir)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name();
    if let Some(depth) = max_depth {
        walker = walker.max_depth(depth);
    }

    walker
        .into_iter()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.into_path())
        .collect()
}
