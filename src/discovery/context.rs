use crate::fs::{self as vfs, DEFAULT_MAX_SYMLINK_DEPTH};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tempfile::TempDir;
use tracing::debug;

/// Default upper bound for files read into memory for sniffing or include scanning
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Prefix of per-finding staging directories
pub const STAGING_PREFIX: &str = "confscout-stage-";

/// Tunables shared by every finder during one scan
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub max_symlink_depth: i32,
    pub max_file_size: u64,
    /// Directories skipped by the filesystem-wide search, in gitignore syntax
    pub excluded_dirs: Vec<String>,
    /// Parent for staging directories; the system temp dir when unset
    pub staging_parent: Option<PathBuf>,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            max_symlink_depth: DEFAULT_MAX_SYMLINK_DEPTH,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            excluded_dirs: default_excluded_dirs(),
            staging_parent: None,
        }
    }
}

pub fn default_excluded_dirs() -> Vec<String> {
    ["/proc", "/sys", "/dev", "/run", ".git", "node_modules"]
        .iter()
        .map(|d| d.to_string())
        .collect()
}

/// Scan root plus options, with the filesystem walk cached across finders
#[derive(Debug)]
pub struct DiscoveryContext {
    root: PathBuf,
    options: DiscoveryOptions,
    files: OnceLock<Vec<PathBuf>>,
}

impl DiscoveryContext {
    pub fn new(root: impl Into<PathBuf>, options: DiscoveryOptions) -> Self {
        Self {
            root: root.into(),
            options,
            files: OnceLock::new(),
        }
    }

    pub fn with_defaults(root: impl Into<PathBuf>) -> Self {
        Self::new(root, DiscoveryOptions::default())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &DiscoveryOptions {
        &self.options
    }

    /// Resolves symlinks in `path` relative to the scan root
    pub fn resolve(&self, path: &Path) -> Option<PathBuf> {
        vfs::resolve(&self.root, path, self.options.max_symlink_depth)
    }

    /// Every file and link under the root, walked once and then reused
    pub fn files(&self) -> &[PathBuf] {
        self.files
            .get_or_init(|| vfs::walk_files(&self.root, &self.options.excluded_dirs))
    }

    /// Root-relative POSIX path, `None` for paths outside the root
    pub fn relative(&self, path: &Path) -> Option<String> {
        vfs::relative_posix(&self.root, path)
    }

    /// Absolute path of `path` as seen from inside the virtual filesystem
    pub fn virtual_path(&self, path: &Path) -> PathBuf {
        vfs::virtual_path(&self.root, path)
    }

    /// Reads a candidate file as text after resolving links.
    ///
    /// Returns `None` for missing, oversized or unreadable files.
    pub fn read_candidate(&self, path: &Path) -> Option<String> {
        let resolved = self.resolve(path)?;
        let meta = fs::metadata(&resolved).ok()?;
        if !meta.is_file() {
            return None;
        }
        if meta.len() > self.options.max_file_size {
            debug!(
                path = %resolved.display(),
                size = meta.len(),
                limit = self.options.max_file_size,
                "Skipping oversized file"
            );
            return None;
        }

        match fs::read(&resolved) {
            Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(err) => {
                debug!(path = %resolved.display(), error = %err, "Failed to read file");
                None
            }
        }
    }

    /// Creates a fresh, uniquely named staging directory
    pub fn allocate_staging(&self) -> io::Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(STAGING_PREFIX);
        match &self.options.staging_parent {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)
            }
            None => builder.tempdir(),
        }
    }
}
