//! Building blocks shared by every service finder
//!
//! Finders locate candidate files; this module turns them into staged findings:
//! content sniffing, include resolution, grouping of multi-file configurations,
//! copying into staging directories and call-command inference.

#[macro_use]
pub mod tag_enum_macro;

pub mod command;
pub mod context;
pub mod error;
pub mod grouping;
pub mod includes;
pub mod pattern;
pub mod sniff;
pub mod staging;
pub mod types;

pub use command::ContainerDescriptor;
pub use context::{DiscoveryContext, DiscoveryOptions};
pub use error::DiscoveryError;
pub use grouping::{amalgamate, group_by_subpath};
pub use includes::{resolve_includes, IncludeRule};
pub use pattern::adapt;
pub use staging::{build_grouped, build_single, DefaultName, FindingTemplate};
pub use types::{
    CollectionManifest, ConfigFileType, FileDescriptor, Machine, ManifestEntry, StagedFinding,
};
