//! Finding a module through the assembled search path.

use crate::archive::exists;
use crate::config::{EntryPoint, HostConfig};
use crate::error::SiteError;
use crate::path::join;
use crate::search_path::SearchPath;

/// Find the file that provides `entry`'s module.
///
/// Each search-path entry is tried in order, first as a module file
/// (`a/b.py`) and then as a package (`a/b/__init__.py`). Entries may lie
/// inside an archive.
pub fn locate_module(
    search_path: &SearchPath,
    entry: &EntryPoint,
    host: &HostConfig,
) -> Result<Option<String>, SiteError> {
    for base in search_path.iter() {
        let mut parts = vec![base];
        parts.extend(entry.module_segments());
        let stem = join(&parts);

        let module_file = format!("{}.{}", stem, host.module_suffix);
        if exists(&module_file)? {
            return Ok(Some(module_file));
        }

        let package_init = join(&[stem.as_str(), host.package_init.as_str()]);
        if exists(&package_init)? {
            return Ok(Some(package_init));
        }
    }
    Ok(None)
}
