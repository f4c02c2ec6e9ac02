//! Shared helpers for integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// Writes `content` to `root/rel`, creating parent directories
pub fn write_file(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("relative path has a parent"))
        .expect("Failed to create parent directories");
    fs::write(&path, content).expect("Failed to write fixture file");
    path
}

/// Creates a symlink at `root/rel` pointing at `target` verbatim
#[cfg(unix)]
pub fn symlink(root: &Path, rel: &str, target: &str) {
    let link = root.join(rel);
    fs::create_dir_all(link.parent().expect("relative path has a parent"))
        .expect("Failed to create parent directories");
    std::os::unix::fs::symlink(target, link).expect("Failed to create symlink");
}

/// Path of the compiled `confscout` binary
pub fn confscout_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_confscout"))
}
