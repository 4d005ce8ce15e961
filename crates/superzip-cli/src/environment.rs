//! Throwaway install environment.
//!
//! Packages are installed with `pip` into a fresh `virtualenv` living in a
//! temporary directory. The directory is removed when the [`Environment`]
//! is dropped.

use anyhow::{anyhow, bail, Context};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;
use walkdir::WalkDir;

/// Directive files pip leaves behind that make no sense inside a bundle.
const LEFTOVER_DIRECTIVES: &[&str] = &["easy-install.pth", "setuptools.pth"];

pub struct Environment {
    dir: TempDir,
    forward_output: bool,
}

impl Environment {
    /// Create a virtualenv for `python`.
    pub fn create(python: &str, forward_output: bool) -> anyhow::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("superzip-env-")
            .tempdir()
            .context("Failed to create temporary directory")?;
        tracing::debug!(dir = %dir.path().display(), "creating virtual environment");

        run(
            Command::new("virtualenv").arg("-p").arg(python).arg(dir.path()),
            "virtualenv",
            forward_output,
        )?;

        Ok(Self { dir, forward_output })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn pip(&self) -> PathBuf {
        if cfg!(windows) {
            self.dir.path().join("Scripts").join("pip.exe")
        } else {
            self.dir.path().join("bin").join("pip")
        }
    }

    /// `pip install` one package spec, already split into arguments. The
    /// spec may carry pip options (`PyYAML --no-binary :all:`,
    /// `-r requirements.txt`).
    pub fn install(&self, spec: &[String]) -> anyhow::Result<()> {
        tracing::info!("Installing package with `pip install {}`", spec.join(" "));
        run(
            Command::new(self.pip()).arg("install").args(spec),
            "pip",
            self.forward_output,
        )
    }

    /// Remove pip and setuptools so they do not end up in the bundle.
    pub fn strip_tooling(&self) -> anyhow::Result<()> {
        tracing::debug!("uninstalling pip and setuptools");
        run(
            Command::new(self.pip()).args(["uninstall", "--yes", "pip", "setuptools"]),
            "pip",
            self.forward_output,
        )
    }

    /// The environment's site-packages directory, cleaned of leftover
    /// directive files.
    pub fn site_packages(&self) -> anyhow::Result<PathBuf> {
        let site = find_site_packages(self.path()).with_context(|| {
            format!("No site-packages directory found in {}", self.path().display())
        })?;
        remove_leftover_directives(&site)?;
        Ok(site)
    }
}

/// Split one package argument the way a POSIX shell would, so quoted pip
/// options (`--global-option="--with libyaml"`) stay whole.
pub fn split_spec(spec: &str) -> anyhow::Result<Vec<String>> {
    let args = shlex::split(spec)
        .ok_or_else(|| anyhow!("Unbalanced quoting in package spec '{}'", spec))?;
    if args.is_empty() {
        bail!("Empty package spec");
    }
    Ok(args)
}

fn run(command: &mut Command, program: &str, forward_output: bool) -> anyhow::Result<()> {
    if !forward_output {
        command.stdout(Stdio::null()).stderr(Stdio::null());
    }
    let status = command
        .status()
        .with_context(|| format!("Failed to run {}", program))?;
    if !status.success() {
        match status.code() {
            Some(code) => bail!("{} returned non-zero exit status ({})", program, code),
            None => bail!("{} was terminated by a signal", program),
        }
    }
    Ok(())
}

/// First `site-packages` directory under `root`, in file-name order.
/// Later ones are reported and ignored.
pub fn find_site_packages(root: &Path) -> Option<PathBuf> {
    let mut found: Option<PathBuf> = None;
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir() && e.file_name() == "site-packages")
    {
        match &found {
            Some(first) => tracing::warn!(
                "Multiple site-packages directories found. `{}` will be used. `{}` was found afterwards.",
                first.display(),
                entry.path().display()
            ),
            None => found = Some(entry.into_path()),
        }
    }
    found
}

pub fn remove_leftover_directives(site: &Path) -> io::Result<()> {
    for name in LEFTOVER_DIRECTIVES {
        match fs::remove_file(site.join(name)) {
            Ok(()) => tracing::debug!("removed {}", name),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Move a directory, copying when a rename is not possible (different
/// filesystems).
pub fn move_dir(from: &Path, to: &Path) -> anyhow::Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    copy_tree(from, to)?;
    fs::remove_dir_all(from).with_context(|| format!("Failed to remove {}", from.display()))
}

/// Copy a file or a whole directory tree to `to`.
pub fn copy_tree(from: &Path, to: &Path) -> anyhow::Result<()> {
    let meta = fs::metadata(from).with_context(|| format!("Cannot copy {}", from.display()))?;
    if !meta.is_dir() {
        fs::copy(from, to)
            .with_context(|| format!("Failed to copy {} to {}", from.display(), to.display()))?;
        return Ok(());
    }

    for entry in WalkDir::new(from).follow_links(true) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(from)?;
        let target = to.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create {}", target.display()))?;
        } else {
            fs::copy(entry.path(), &target).with_context(|| {
                format!("Failed to copy {} to {}", entry.path().display(), target.display())
            })?;
        }
    }
    Ok(())
}
