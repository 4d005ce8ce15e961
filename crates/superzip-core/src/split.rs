//! Splitting paths at an archive boundary.
//!
//! A path such as `/opt/app.sz/site-packages/six.py` names a file inside
//! the archive `/opt/app.sz`. [`split_zip_path`] finds that boundary by
//! probing each prefix of the path, shortest first. Only the outermost
//! archive is honored; an archive nested inside another is never opened.

use std::path::Path;

use crate::archive::is_archive;
use crate::path::{join, split, split_drive};

/// The split point between a real archive file and a path inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveBoundary {
    /// Real-filesystem path of the archive file.
    pub archive_path: String,

    /// Path relative to the archive root. Empty for the root itself.
    pub inner_path: String,
}

/// Where a path lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// No prefix of the path is an archive; the whole path is a
    /// real-filesystem path.
    Real(String),

    /// The path crosses into an archive.
    Archived(ArchiveBoundary),
}

impl Location {
    /// The archive boundary, if any.
    pub fn boundary(&self) -> Option<&ArchiveBoundary> {
        match self {
            Location::Real(_) => None,
            Location::Archived(boundary) => Some(boundary),
        }
    }

    pub fn is_archived(&self) -> bool {
        matches!(self, Location::Archived(_))
    }
}

/// Split a path into its components, root first.
///
/// The root marker is kept as its own component and a trailing separator
/// produces a trailing empty component, so `/foo/bar/` and `/foo/bar`
/// are distinguishable.
///
/// ```text
/// "delicious/apple/sauce" -> ["delicious", "apple", "sauce"]
/// "/"                     -> ["/"]
/// "/foo/bar/"             -> ["/", "foo", "bar", ""]
/// ```
pub fn get_path_parts(path: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = path;

    loop {
        let (remaining, tail) = split(rest);
        if remaining == rest {
            if !rest.is_empty() {
                parts.push(rest);
            }
            break;
        }
        rest = remaining;
        parts.push(tail);
    }

    parts.reverse();
    parts
}

/// Split a path at the first prefix that is a valid archive file.
///
/// Returns [`Location::Real`] with the path unchanged when no prefix is an
/// archive.
pub fn split_zip_path(path: &str) -> Location {
    let (drive, rest) = split_drive(path);
    let parts = get_path_parts(rest);

    for i in 0..parts.len() {
        let mut front_parts = Vec::with_capacity(i + 2);
        front_parts.push(drive);
        front_parts.extend_from_slice(&parts[..=i]);
        let front = join(&front_parts);

        if is_archive(Path::new(&front)) {
            let tail = &parts[i + 1..];
            let inner_path = if tail.is_empty() {
                String::new()
            } else {
                join(tail)
            };
            tracing::trace!(archive = %front, inner = %inner_path, "archive boundary");
            return Location::Archived(ArchiveBoundary {
                archive_path: front,
                inner_path,
            });
        }
    }

    Location::Real(path.to_string())
}
