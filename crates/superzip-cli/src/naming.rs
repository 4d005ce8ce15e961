//! Default output file naming.

use anyhow::{anyhow, bail, Context};
use std::path::Path;
use std::process::{Command, Stdio};

/// Extension given to bundles named after a package.
pub const BUNDLE_EXTENSION: &str = "sz";

/// Pick an output name from the last package spec, each spec already
/// split into arguments.
///
/// A local directory is asked for its name through `setup.py --name`; any
/// other spec is a requirement whose version constraint is cut off
/// (`bla==2.3` -> `bla`). Pip options such as `-r FILE` are skipped.
pub fn output_name(packages: &[Vec<String>], python: &str) -> anyhow::Result<String> {
    let last = packages
        .iter()
        .rev()
        .filter_map(|spec| spec.first())
        .map(String::as_str)
        .find(|first| !first.starts_with('-'))
        .ok_or_else(|| anyhow!("No output file or packages specified"))?;

    let name = if Path::new(last).is_dir() {
        setup_name(Path::new(last), python)?
    } else {
        strip_version(last).to_string()
    };

    if name.is_empty() {
        bail!("Cannot derive an output name from '{}'", last);
    }
    Ok(format!("{}.{}", name, BUNDLE_EXTENSION))
}

/// Cut a requirement spec at its first `=`, `>` or `<`.
pub fn strip_version(spec: &str) -> &str {
    match spec.find(['=', '>', '<']) {
        Some(idx) => &spec[..idx],
        None => spec,
    }
}

/// Check that `name` is made only of ASCII letters, digits, `_` and `-`.
pub fn is_valid_package_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn setup_name(dir: &Path, python: &str) -> anyhow::Result<String> {
    tracing::debug!(dir = %dir.display(), "asking setup.py for the package name");
    let output = Command::new(python)
        .arg(dir.join("setup.py"))
        .arg("--name")
        .stderr(Stdio::null())
        .output()
        .with_context(|| format!("Failed to run {}", python))?;

    if !output.status.success() {
        bail!("Could not determine name of package at {}", dir.display());
    }

    let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if !is_valid_package_name(&name) {
        bail!("setup.py is reporting an illegal package name of '{}'", name);
    }
    Ok(name)
}
