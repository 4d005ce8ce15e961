//! Integration tests for archive boundary splitting and existence checks

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use superzip_core::{exists, get_path_parts, split_zip_path, ArchiveBoundary, Location, SiteError};
use tempfile::TempDir;

/// Write an archive; directory members end in `/`, files hold their own
/// name as content.
fn write_zip(path: &Path, members: &[&str]) {
    let file = File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    for name in members {
        if let Some(dir) = name.strip_suffix('/') {
            zip.add_directory(dir, options).unwrap();
        } else {
            zip.start_file(*name, options).unwrap();
            zip.write_all(name.as_bytes()).unwrap();
        }
    }
    zip.finish().unwrap();
}

fn archived(archive: &str, inner: &str) -> Location {
    Location::Archived(ArchiveBoundary {
        archive_path: archive.to_string(),
        inner_path: inner.to_string(),
    })
}

#[test]
fn test_path_parts() {
    assert_eq!(
        get_path_parts("delicious/apple/sauce"),
        vec!["delicious", "apple", "sauce"]
    );
    assert_eq!(get_path_parts("/"), vec!["/"]);
    assert_eq!(get_path_parts("/foo/bar/"), vec!["/", "foo", "bar", ""]);
}

#[cfg(unix)]
#[test]
fn test_split_at_archive() {
    let temp = TempDir::new().unwrap();
    let testing = temp.path().join("testing");
    fs::create_dir_all(&testing).unwrap();
    let stuff = testing.join("stuff.zip");
    write_zip(&stuff, &["hi/", "hi/bar"]);
    let stuff = stuff.to_str().unwrap();

    assert_eq!(
        split_zip_path(&format!("{}/hi/bar", stuff)),
        archived(stuff, "hi/bar")
    );
    assert_eq!(split_zip_path(stuff), archived(stuff, ""));
    assert_eq!(split_zip_path(&format!("{}/", stuff)), archived(stuff, ""));
}

#[cfg(unix)]
#[test]
fn test_split_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let stuff = temp.path().join("stuff.zip");
    write_zip(&stuff, &["a.txt"]);

    let path = format!("{}/a.txt", stuff.display());
    assert_eq!(split_zip_path(&path), split_zip_path(&path));

    let plain = format!("{}/nothing/here", temp.path().display());
    assert_eq!(split_zip_path(&plain), split_zip_path(&plain));
}

#[cfg(unix)]
#[test]
fn test_no_archive_keeps_path() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("lib/pkg")).unwrap();
    fs::write(temp.path().join("lib/pkg/mod.py"), "x = 1\n").unwrap();

    for path in [
        format!("{}/lib/pkg/mod.py", temp.path().display()),
        format!("{}/lib/missing/deeper", temp.path().display()),
        "relative/path/only".to_string(),
    ] {
        assert_eq!(split_zip_path(&path), Location::Real(path.clone()));
    }
}

#[cfg(unix)]
#[test]
fn test_nested_archive_is_not_opened() {
    let temp = TempDir::new().unwrap();
    let inner = temp.path().join("inner.zip");
    write_zip(&inner, &["deep.txt"]);
    let outer = temp.path().join("outer.zip");
    {
        let mut zip = zip::ZipWriter::new(File::create(&outer).unwrap());
        zip.start_file("inner.zip", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(&fs::read(&inner).unwrap()).unwrap();
        zip.finish().unwrap();
    }

    let outer = outer.to_str().unwrap();
    let nested = format!("{}/inner.zip/deep.txt", outer);
    assert_eq!(split_zip_path(&nested), archived(outer, "inner.zip/deep.txt"));
    assert!(!exists(&nested).unwrap());
    assert!(exists(&format!("{}/inner.zip", outer)).unwrap());
}

#[cfg(unix)]
#[test]
fn test_exists_through_archive() {
    let temp = TempDir::new().unwrap();
    let bundle = temp.path().join("bundle.sz");
    write_zip(&bundle, &["site-packages/", "site-packages/six.py"]);
    let bundle = bundle.display().to_string();

    assert!(exists(&format!("{}/site-packages/six.py", bundle)).unwrap());
    assert!(exists(&format!("{}/site-packages", bundle)).unwrap());
    assert!(exists(&format!("{}/site-packages/", bundle)).unwrap());
    assert!(!exists(&format!("{}/site-packages/seven.py", bundle)).unwrap());
    assert!(!exists(&format!("{}/elsewhere/six.py", bundle)).unwrap());

    assert!(exists(&temp.path().display().to_string()).unwrap());
    assert!(!exists(&format!("{}/absent", temp.path().display())).unwrap());
}

#[cfg(unix)]
#[test]
fn test_exists_fails_on_unreadable_archive() {
    let temp = TempDir::new().unwrap();
    let broken = temp.path().join("broken.zip");

    // Central directory claims one entry at offset 0, where there is none.
    let mut bytes = vec![b'x'; 46];
    bytes.extend_from_slice(&[0x50, 0x4b, 0x05, 0x06]);
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&46u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());
    fs::write(&broken, bytes).unwrap();

    let path = format!("{}/anything", broken.display());
    assert!(split_zip_path(&path).is_archived());
    assert!(matches!(
        exists(&path),
        Err(SiteError::ArchiveUnreadable { .. })
    ));
}
