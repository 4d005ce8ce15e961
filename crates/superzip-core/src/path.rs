//! Host-syntax path primitives.
//!
//! Paths handled by the site layer may point *into* an archive, so they
//! cannot be run through `std::path::Path::canonicalize` or anything else
//! that touches the filesystem. These helpers work purely on strings using
//! the host platform's separator rules. Archive member names always use
//! `/`, see [`member_name`].

use std::io;

/// Preferred separator for the host platform.
#[cfg(windows)]
pub const SEP: char = '\\';
#[cfg(not(windows))]
pub const SEP: char = '/';

/// Check whether `c` is a path separator on this platform.
pub fn is_sep(c: char) -> bool {
    c == '/' || (cfg!(windows) && c == '\\')
}

/// Split off a drive prefix (`C:`). Always empty on non-Windows hosts.
pub fn split_drive(path: &str) -> (&str, &str) {
    if cfg!(windows) {
        let bytes = path.as_bytes();
        if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
            return path.split_at(2);
        }
    }
    ("", path)
}

/// Split a path into `(head, tail)` where `tail` is everything after the
/// last separator.
///
/// Trailing separators are stripped from `head` unless `head` is nothing
/// but separators (the root). A path ending in a separator has an empty
/// `tail`.
pub fn split(path: &str) -> (&str, &str) {
    let (drive, rest) = split_drive(path);
    let idx = rest.rfind(is_sep).map(|i| i + 1).unwrap_or(0);
    let (head, tail) = rest.split_at(idx);
    let trimmed = head.trim_end_matches(is_sep);
    let head = if trimmed.is_empty() { head } else { trimmed };
    (&path[..drive.len() + head.len()], tail)
}

/// Join path segments. An absolute segment discards everything before it.
pub fn join<S: AsRef<str>>(parts: &[S]) -> String {
    let mut out = String::new();
    for part in parts {
        let part = part.as_ref();
        if is_absolute(part) {
            out = part.to_string();
        } else if out.is_empty() || out.ends_with(is_sep) || is_bare_drive(&out) {
            out.push_str(part);
        } else {
            out.push(SEP);
            out.push_str(part);
        }
    }
    out
}

fn is_bare_drive(path: &str) -> bool {
    let (drive, rest) = split_drive(path);
    !drive.is_empty() && rest.is_empty()
}

/// Check whether a path is rooted (after any drive prefix).
pub fn is_absolute(path: &str) -> bool {
    split_drive(path).1.starts_with(is_sep)
}

/// Lexically normalize a path: collapse separators, drop `.` and resolve
/// `..` against preceding components.
pub fn normalize(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }

    let (drive, rest) = split_drive(path);
    let rooted = rest.starts_with(is_sep);
    let mut comps: Vec<&str> = Vec::new();

    for comp in rest.split(is_sep) {
        match comp {
            "" | "." => {}
            ".." => {
                if comps.last().is_some_and(|c| *c != "..") {
                    comps.pop();
                } else if !rooted {
                    comps.push("..");
                }
            }
            other => comps.push(other),
        }
    }

    let mut out = String::from(drive);
    if rooted {
        out.push(SEP);
    }
    out.push_str(&comps.join(&SEP.to_string()));
    if out.is_empty() {
        out.push('.');
    }
    out
}

/// Make a path absolute against the current directory and normalize it.
pub fn absolute(path: &str) -> io::Result<String> {
    if is_absolute(path) {
        return Ok(normalize(path));
    }
    let cwd = std::env::current_dir()?
        .into_os_string()
        .into_string()
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "current directory is not UTF-8"))?;
    Ok(normalize(&join(&[cwd.as_str(), path])))
}

/// Case-fold a path for comparison. Identity outside Windows.
pub fn normcase(path: &str) -> String {
    if cfg!(windows) {
        path.replace('/', "\\").to_lowercase()
    } else {
        path.to_string()
    }
}

/// Resolve `name` relative to `dir`, returning the absolute path and its
/// de-duplication key.
pub fn make_path(dir: &str, name: &str) -> io::Result<(String, String)> {
    let resolved = absolute(&join(&[dir, name]))?;
    let key = normcase(&resolved);
    Ok((resolved, key))
}

/// Convert a host-syntax path inside an archive to a member name.
pub fn member_name(inner: &str) -> String {
    if cfg!(windows) {
        inner.replace('\\', "/")
    } else {
        inner.to_string()
    }
}

/// Parent of an archive member name (`a/b/c.pth` -> `a/b`).
pub fn member_parent(name: &str) -> &str {
    match name.rfind('/') {
        Some(idx) => {
            let head = &name[..=idx];
            let trimmed = head.trim_end_matches('/');
            if trimmed.is_empty() {
                head
            } else {
                trimmed
            }
        }
        None => "",
    }
}

/// Final component of an archive member name.
pub fn member_basename(name: &str) -> &str {
    match name.rfind('/') {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}
