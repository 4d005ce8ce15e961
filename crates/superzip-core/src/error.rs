//! Error types for archive resolution and bootstrapping.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort path resolution, site registration, or bootstrap.
///
/// A missing member or a path prefix that is not an archive is not an
/// error: those are reported as `false` / `None` by the resolver.
#[derive(Debug, Error)]
pub enum SiteError {
    /// File I/O error
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// An archive passed the signature probe but cannot be opened or parsed
    #[error("Cannot read archive {}: {source}", .archive.display())]
    ArchiveUnreadable {
        archive: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// Writing an archive failed
    #[error("Failed to write archive: {0}")]
    ArchiveWrite(#[source] zip::result::ZipError),

    /// A member that must be present in the bundle is not
    #[error("Archive {} has no member '{member}'", .archive.display())]
    MemberMissing { archive: PathBuf, member: String },

    /// Entry point is not of the form `module:callable`
    #[error("Invalid entry point '{0}': expected 'module:callable'")]
    EntryPointFormat(String),

    /// Entry point module is not reachable through the search path
    #[error("Cannot find module '{module}' for entry point '{entry_point}'")]
    EntryPointNotFound { entry_point: String, module: String },

    /// Bundle configuration could not be parsed
    #[error("Failed to parse bundle configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// The host runtime failed to start or run the entry point
    #[error("Host error: {0}")]
    Host(String),
}

impl SiteError {
    pub(crate) fn unreadable(archive: impl Into<PathBuf>, source: zip::result::ZipError) -> Self {
        SiteError::ArchiveUnreadable {
            archive: archive.into(),
            source,
        }
    }
}

/// Errors raised while interpreting a single directive line.
///
/// These never propagate out of directive processing; they end the
/// current file and are reported with the line number.
#[derive(Debug, Error)]
pub enum DirectiveError {
    /// Line bytes are not valid UTF-8
    #[error("line is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// The directive file could not be read past this point
    #[error("cannot read directive file")]
    Read(#[source] std::io::Error),

    /// Line cannot name a filesystem path
    #[error("invalid path {0:?}: embedded NUL byte")]
    InvalidPath(String),

    /// Relative path could not be made absolute
    #[error("cannot resolve current directory: {0}")]
    CurrentDir(#[source] std::io::Error),

    /// The import hook rejected or failed to run the statement
    #[error("import statement failed: {0}")]
    Import(String),

    /// Resolving the path touched an unreadable archive
    #[error(transparent)]
    Archive(#[from] Box<SiteError>),
}
