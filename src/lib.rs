//! confscout - service configuration discovery for filesystem images
//!
//! Given the root of a mounted filesystem or unpacked container image, confscout
//! finds the configuration files of known services, follows their include
//! directives, stages copies of everything it found and writes a collection
//! directory described by a JSON manifest.
//!
//! # Example
//!
//! ```no_run
//! use confscout::{Collector, ConfscoutConfig};
//! use std::path::Path;
//!
//! let config = ConfscoutConfig::load(None)?;
//! let collector = Collector::from_config(&config);
//!
//! if let Some(collection) = collector.collect(Path::new("/mnt/image"), "web-01", None)? {
//!     println!("{} services in {}", collection.manifest.service_count(), collection.dir.display());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Project Structure
//!
//! - [`fs`]: symlink resolution inside the root, glob expansion and directory walks
//! - [`discovery`]: shared discovery machinery (pattern adaptation, includes,
//!   grouping, staging) and the manifest types
//! - [`finder`]: per-service finders and the registry that holds them
//! - [`collector`]: runs every finder and writes the collection

pub mod cli;
pub mod collector;
pub mod config;
pub mod discovery;
pub mod finder;
pub mod fs;
pub mod util;

pub use collector::{Collection, Collector};
pub use config::{ConfigError, ConfscoutConfig};
pub use discovery::{
    CollectionManifest, ConfigFileType, ContainerDescriptor, DiscoveryContext, DiscoveryError,
    DiscoveryOptions, FileDescriptor, ManifestEntry, StagedFinding,
};
pub use finder::{Finder, FinderRegistry, ServiceId};
pub use util::{init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
