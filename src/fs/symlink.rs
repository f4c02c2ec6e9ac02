//! Symlink resolution inside a virtual filesystem root
//!
//! Extracted images and cloned repositories carry symlinks whose targets are
//! meaningful only relative to the image root (`/etc/nginx/nginx.conf ->
//! /opt/nginx/conf/nginx.conf`). Resolution therefore re-roots every target under
//! the scan root instead of following it on the host.

use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Default number of links followed before a chain is considered unresolvable
pub const DEFAULT_MAX_SYMLINK_DEPTH: i32 = 10;

/// Resolves `path` through a chain of symbolic links relative to `root`.
///
/// Returns `path` unchanged when it is not a link (including when it does not
/// exist), and `None` when `max_depth` runs out before a non-link is reached or a
/// link cannot be read.
pub fn resolve(root: &Path, path: &Path, max_depth: i32) -> Option<PathBuf> {
    if max_depth < 0 {
        debug!(path = %path.display(), "Symlink chain exceeds maximum depth");
        return None;
    }

    let is_link = fs::symlink_metadata(path)
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(false);
    if !is_link {
        return Some(path.to_path_buf());
    }

    let target = match fs::read_link(path) {
        Ok(target) => target,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "Failed to read symlink");
            return None;
        }
    };

    resolve(root, &reroot(root, &target), max_depth - 1)
}

/// Joins `path` under `root`, treating it as a path inside the virtual filesystem.
///
/// Leading separators are dropped and `..` never climbs above `root`, so the
/// result always stays inside the virtual root.
pub fn reroot(root: &Path, path: &Path) -> PathBuf {
    let mut out = root.to_path_buf();
    let mut depth = 0usize;

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                if depth > 0 {
                    out.pop();
                    depth -= 1;
                }
            }
            Component::Normal(part) => {
                out.push(part);
                depth += 1;
            }
        }
    }

    out
}

/// Maps a real path under `root` back to its absolute path inside the virtual filesystem
pub fn virtual_path(root: &Path, path: &Path) -> PathBuf {
    match path.strip_prefix(root) {
        Ok(relative) => Path::new("/").join(relative),
        Err(_) => path.to_path_buf(),
    }
}
