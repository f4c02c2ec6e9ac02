use std::path::PathBuf;
use thiserror::Error;

/// Fatal discovery failures surfaced to the caller.
///
/// Everything below this level (missing files, broken links, malformed content)
/// is logged and skipped instead.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Scan root does not exist
    #[error("Scan root not found: {}", .0.display())]
    RootNotFound(PathBuf),

    /// Scan root exists but is not a directory
    #[error("Scan root is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// A built-in or user-supplied pattern failed to compile
    #[error("Invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Reading or writing the collection tree failed
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Manifest could not be serialized
    #[error("Failed to serialize manifest: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl DiscoveryError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_pattern(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            source,
        }
    }
}
