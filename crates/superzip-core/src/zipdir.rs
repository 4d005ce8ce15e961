//! Compressing a directory tree into a bundle archive.

use std::fs::{self, File};
use std::io::{self, Seek, Write};
use std::path::Path;

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::SiteError;

/// Deflate every file and directory under `dir` into a zip archive written
/// to `writer`, starting at the writer's current position.
///
/// Member names are `/`-separated and relative to `dir`. Directories get
/// their own entries so they can be looked up like files. Entries are
/// written in file-name order.
pub fn zip_directory<W: Write + Seek>(dir: &Path, writer: W) -> Result<W, SiteError> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_dir() {
            zip.add_directory(name.as_str(), options.unix_permissions(0o755))
                .map_err(SiteError::ArchiveWrite)?;
        } else {
            tracing::trace!(member = %name, "adding file");
            zip.start_file(name.as_str(), options)
                .map_err(SiteError::ArchiveWrite)?;
            let mut file = File::open(entry.path())?;
            io::copy(&mut file, &mut zip)?;
        }
    }

    zip.finish().map_err(SiteError::ArchiveWrite)
}

/// Write a bundle: the `launcher` executable's bytes followed by the
/// archive of `dir`.
pub fn write_bundle(launcher: &Path, dir: &Path, output: &Path) -> Result<(), SiteError> {
    let mut out = File::create(output)?;
    let mut prefix = File::open(launcher)?;
    io::copy(&mut prefix, &mut out)?;

    let mut out = zip_directory(dir, out)?;
    out.flush()?;
    tracing::debug!(output = %output.display(), bytes = fs::metadata(output)?.len(), "bundle written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::io::{Cursor, Read};

    fn build_tree(root: &Path) {
        fs::create_dir_all(root.join("a")).unwrap();
        fs::create_dir_all(root.join("b/empty")).unwrap();
        fs::write(root.join("a/foo"), vec![b'x'; 1000]).unwrap();
        fs::write(root.join("a/bar"), vec![b'y'; 10]).unwrap();
        fs::write(root.join("top"), b"").unwrap();
    }

    #[test]
    fn test_zip_directory_members() {
        let temp = tempfile::tempdir().unwrap();
        build_tree(temp.path());

        let cursor = zip_directory(temp.path(), Cursor::new(Vec::new())).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(cursor.into_inner())).unwrap();

        let names: BTreeSet<String> = archive.file_names().map(String::from).collect();
        let expected: BTreeSet<String> = ["a/", "a/bar", "a/foo", "b/", "b/empty/", "top"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(names, expected);

        let mut foo = archive.by_name("a/foo").unwrap();
        assert_eq!(foo.size(), 1000);
        let mut data = Vec::new();
        foo.read_to_end(&mut data).unwrap();
        assert!(data.iter().all(|b| *b == b'x'));
    }

    #[test]
    fn test_write_bundle_with_launcher() {
        let temp = tempfile::tempdir().unwrap();
        let tree = temp.path().join("tree");
        build_tree(&tree);
        let launcher = temp.path().join("launcher");
        fs::write(&launcher, b"\x7fELF-not-really-an-executable").unwrap();
        let output = temp.path().join("out.sz");

        write_bundle(&launcher, &tree, &output).unwrap();

        let bytes = fs::read(&output).unwrap();
        assert!(bytes.starts_with(b"\x7fELF"));
        assert!(crate::archive::is_archive(&output));

        let mut archive = crate::archive::open_archive(output.to_str().unwrap()).unwrap();
        let text = crate::archive::read_member_text(&mut archive, "out.sz", "a/bar").unwrap();
        assert_eq!(text, "y".repeat(10));
    }
}
