//! Superzip core library
//!
//! Everything a superzip bundle needs at start-up, plus the archive writer
//! used to produce one:
//! - Host-syntax path primitives that never touch the filesystem
//! - Splitting a path at an archive boundary
//! - Archive-transparent existence checks
//! - Directive (`*.pth`) file processing
//! - Site directory registration into an owned search path
//! - Bundle bootstrap and hand-off to a host runtime
//! - Compressing a directory tree into a bundle

pub mod archive;
pub mod bootstrap;
pub mod config;
pub mod directive;
pub mod error;
pub mod host;
pub mod locate;
pub mod path;
pub mod search_path;
pub mod site;
pub mod split;
pub mod zipdir;

pub use archive::{exists, is_archive};
pub use bootstrap::{is_bundle, Bootstrap};
pub use config::{BundleConfig, EntryPoint, HostConfig, SiteConfig, CONFIG_MEMBER, SITE_PACKAGES};
pub use directive::{DeferredImports, DirectiveOutcome, ImportHook, LineFault, RefuseImports};
pub use error::{DirectiveError, SiteError};
pub use host::{InterpreterHost, Launch, ModuleHost};
pub use locate::locate_module;
pub use search_path::{KnownPaths, SearchPath};
pub use site::Site;
pub use split::{get_path_parts, split_zip_path, ArchiveBoundary, Location};
pub use zipdir::{write_bundle, zip_directory};
