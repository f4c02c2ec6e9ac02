//! Filesystem primitives for scanning a virtual root
//!
//! - [`symlink`]: bounded symlink resolution re-rooted under the scan root
//! - [`glob`]: wildcard patterns evaluated against the scan root
//! - [`walk`]: whole-root and bounded directory walks

pub mod glob;
pub mod symlink;
pub mod walk;

pub use symlink::{resolve, reroot, virtual_path, DEFAULT_MAX_SYMLINK_DEPTH};
pub use walk::{walk_dir, walk_files};

use std::fs;
use std::io;
use std::path::{Component, Path};
use walkdir::WalkDir;

/// Renders a relative path with `/` separators, `.` for the empty path
pub fn to_posix(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// POSIX form of `path` relative to `root`, or `None` when it lies outside
pub fn relative_posix(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root).ok().map(to_posix)
}

/// File name of `path` as an owned string
pub fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

/// Recursively copies the contents of `src` into `dst`, creating `dst` as needed
pub fn copy_dir_all(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir_all(dst)?;

    for entry in WalkDir::new(src).min_depth(1).follow_links(false) {
        let entry = entry?;
        let relative = match entry.path().strip_prefix(src) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}
