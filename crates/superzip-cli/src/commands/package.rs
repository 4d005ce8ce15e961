//! `superzip [OPTIONS] [PACKAGE ...] ENTRY_POINT` — build a bundle.
//!
//! 1. install the packages into a throwaway virtualenv
//! 2. move its site-packages into a build directory, add raw copies
//! 3. write `superzip.toml`
//! 4. write this executable followed by the zipped build directory
//! 5. mark the result executable

use anyhow::{anyhow, Context};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use superzip_core::{write_bundle, BundleConfig, EntryPoint, CONFIG_MEMBER, SITE_PACKAGES};

use crate::environment::{copy_tree, move_dir, Environment};
use crate::naming;

/// A file or directory copied into the bundle's site-packages as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCopy {
    pub source: PathBuf,

    /// Name inside site-packages
    pub name: String,
}

impl RawCopy {
    pub fn renamed(source: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            name: name.into(),
        }
    }

    /// Copy keeping the source's own name.
    pub fn from_path(source: &Path) -> anyhow::Result<Self> {
        let name = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("Cannot take a name for raw copy from '{}'", source.display()))?;
        Ok(Self::renamed(source, name))
    }
}

pub struct PackageOptions {
    /// Arguments for each `pip install`, in order
    pub packages: Vec<Vec<String>>,

    pub entry_point: String,

    pub output: Option<PathBuf>,

    pub raw_copies: Vec<RawCopy>,

    /// Interpreter for the virtualenv and for running the bundle
    pub python: String,

    /// Refuse `import` lines in directive files at run time
    pub sandbox: bool,

    /// Let virtualenv and pip write to the terminal
    pub forward_output: bool,
}

impl PackageOptions {
    /// Configuration stored in the bundle.
    pub fn bundle_config(&self, entry_point: &EntryPoint) -> BundleConfig {
        let mut config = BundleConfig::new(entry_point.to_string());
        config.site.allow_imports = !self.sandbox;
        config.host.program = self.python.clone();
        config
    }
}

/// Build the bundle and return its path.
pub fn execute(options: &PackageOptions) -> anyhow::Result<PathBuf> {
    let entry_point: EntryPoint = options.entry_point.parse()?;
    let output = match &options.output {
        Some(path) => path.clone(),
        None => PathBuf::from(naming::output_name(&options.packages, &options.python)?),
    };

    let environment = Environment::create(&options.python, options.forward_output)?;
    if options.packages.is_empty() {
        tracing::warn!("No packages specified.");
    }
    for spec in &options.packages {
        environment.install(spec)?;
    }
    environment.strip_tooling()?;
    let installed = environment.site_packages()?;

    let build = tempfile::Builder::new()
        .prefix("superzip-build-")
        .tempdir()
        .context("Failed to create temporary directory")?;
    let site = build.path().join(SITE_PACKAGES);
    tracing::debug!(from = %installed.display(), to = %site.display(), "moving site-packages");
    move_dir(&installed, &site)?;

    stage(build.path(), &options.raw_copies, &options.bundle_config(&entry_point))?;
    write_output(build.path(), &output)?;

    tracing::info!("Bundle written to {}", output.display());
    Ok(output)
}

/// Add raw copies and the configuration to a build directory that already
/// holds `site-packages`.
pub fn stage(build: &Path, raw_copies: &[RawCopy], config: &BundleConfig) -> anyhow::Result<()> {
    let site = build.join(SITE_PACKAGES);
    fs::create_dir_all(&site).with_context(|| format!("Failed to create {}", site.display()))?;

    for copy in raw_copies {
        tracing::debug!(
            "Performing raw copy of `{}`, destination name: `{}`",
            copy.source.display(),
            copy.name
        );
        copy_tree(&copy.source, &site.join(&copy.name))?;
    }

    tracing::debug!("adding configuration file");
    let text = config.to_toml().context("Failed to serialize bundle configuration")?;
    fs::write(build.join(CONFIG_MEMBER), text)
        .with_context(|| format!("Failed to write {}", CONFIG_MEMBER))?;
    Ok(())
}

/// Write this executable followed by the zipped build directory to
/// `output` and make it executable.
pub fn write_output(build: &Path, output: &Path) -> anyhow::Result<()> {
    let launcher = env::current_exe().context("Cannot locate the superzip executable")?;
    write_output_with(&launcher, build, output)
}

fn write_output_with(launcher: &Path, build: &Path, output: &Path) -> anyhow::Result<()> {
    tracing::debug!("zipping up {}", build.display());
    write_bundle(launcher, build, output)
        .with_context(|| format!("Could not write to output file at '{}'", output.display()))?;
    make_executable(output)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .with_context(|| format!("Failed to mark {} executable", path.display()))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> anyhow::Result<()> {
    Ok(())
}
