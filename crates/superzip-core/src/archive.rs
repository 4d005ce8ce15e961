//! Archive probing and archive-transparent existence checks.

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use zip::ZipArchive;

use crate::error::SiteError;
use crate::path::member_name;
use crate::split::{split_zip_path, Location};

/// End-of-central-directory record signature (`PK\x05\x06`).
const EOCD_SIGNATURE: [u8; 4] = [0x50, 0x4b, 0x05, 0x06];

/// Fixed size of the end-of-central-directory record.
const EOCD_SIZE: usize = 22;

/// Largest archive comment the record can be followed by.
const MAX_COMMENT_SIZE: usize = 0xFFFF;

/// Check whether `path` is a regular file carrying an archive.
///
/// Only the end-of-central-directory record is looked for, in the last
/// 64 KiB of the file, so arbitrary bytes (a launcher executable, a
/// shebang line) may precede the archive data. Any I/O failure means
/// "not an archive".
pub fn is_archive(path: &Path) -> bool {
    probe_end_record(path).unwrap_or(false)
}

fn probe_end_record(path: &Path) -> io::Result<bool> {
    let meta = fs::metadata(path)?;
    if !meta.is_file() || meta.len() < EOCD_SIZE as u64 {
        return Ok(false);
    }

    let window = meta.len().min((EOCD_SIZE + MAX_COMMENT_SIZE) as u64);
    let mut file = File::open(path)?;
    file.seek(SeekFrom::End(-(window as i64)))?;
    let mut buf = vec![0u8; window as usize];
    file.read_exact(&mut buf)?;

    Ok((0..=buf.len() - EOCD_SIZE)
        .rev()
        .any(|i| buf[i..i + 4] == EOCD_SIGNATURE))
}

/// Open an archive read-only.
///
/// The caller has already established that `path` looks like an archive,
/// so any failure here means the bundle itself is broken.
pub fn open_archive(path: &str) -> Result<ZipArchive<File>, SiteError> {
    let file = File::open(path).map_err(|e| SiteError::unreadable(path, e.into()))?;
    ZipArchive::new(file).map_err(|e| SiteError::unreadable(path, e))
}

/// Check whether `inner` names a member of `archive`, either exactly or as
/// a directory entry (`inner/`).
pub fn contains_member<R: Read + Seek>(archive: &ZipArchive<R>, inner: &str) -> bool {
    let name = member_name(inner);
    let dir_name = format!("{}/", name);
    archive.index_for_name(&name).is_some() || archive.index_for_name(&dir_name).is_some()
}

/// Member names in the order the archive's central directory stores them.
pub fn member_names<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    archive_path: &str,
) -> Result<Vec<String>, SiteError> {
    let mut names = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let entry = archive
            .by_index_raw(i)
            .map_err(|e| SiteError::unreadable(archive_path, e))?;
        names.push(entry.name().to_owned());
    }
    Ok(names)
}

/// Read a whole member as UTF-8 text.
pub fn read_member_text<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    archive_path: &str,
    member: &str,
) -> Result<String, SiteError> {
    let mut entry = match archive.by_name(member) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(SiteError::MemberMissing {
                archive: archive_path.into(),
                member: member.to_string(),
            })
        }
        Err(e) => return Err(SiteError::unreadable(archive_path, e)),
    };
    let mut text = String::new();
    entry.read_to_string(&mut text)?;
    Ok(text)
}

/// Check whether a path exists, looking inside an archive when the path
/// crosses an archive boundary.
///
/// A missing member is `Ok(false)`. An archive that passes the probe but
/// cannot be opened is an error.
pub fn exists(path: &str) -> Result<bool, SiteError> {
    match split_zip_path(path) {
        Location::Real(real) => Ok(Path::new(&real).exists()),
        Location::Archived(boundary) => {
            let archive = open_archive(&boundary.archive_path)?;
            Ok(contains_member(&archive, &boundary.inner_path))
        }
    }
}
