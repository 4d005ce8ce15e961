//! Bundle start-up.
//!
//! A bundle is an archive (possibly preceded by a launcher executable)
//! holding `superzip.toml` and a `site-packages/` tree. Bootstrapping:
//!
//! 1. read the configuration from the bundle
//! 2. register `<bundle>/site-packages` as a site directory, processing
//!    its directive files
//! 3. parse the entry point and find its module on the search path
//! 4. hand everything to a [`ModuleHost`]

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::Path;

use crate::archive::{contains_member, is_archive, open_archive, read_member_text};
use crate::config::{BundleConfig, EntryPoint, CONFIG_MEMBER, SITE_PACKAGES};
use crate::directive::{DeferredImports, ImportHook, LineFault, RefuseImports};
use crate::error::SiteError;
use crate::host::{Launch, ModuleHost};
use crate::locate::locate_module;
use crate::path::{absolute, join};
use crate::search_path::SearchPath;
use crate::site::Site;

/// Check whether `path` is a bundle: an archive carrying `superzip.toml`.
pub fn is_bundle(path: &Path) -> bool {
    if !is_archive(path) {
        return false;
    }
    let Some(path) = path.to_str() else {
        return false;
    };
    match open_archive(path) {
        Ok(archive) => contains_member(&archive, CONFIG_MEMBER),
        Err(_) => false,
    }
}

/// A bundle with its search path assembled, ready to launch.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    /// Absolute path of the bundle
    pub bundle: String,

    pub config: BundleConfig,

    pub entry_point: EntryPoint,

    /// File providing the entry module
    pub module_origin: String,

    pub search_path: SearchPath,

    /// Deferred `import` statements, empty in sandboxed mode
    pub imports: Vec<String>,

    /// Directive lines that failed during registration
    pub faults: Vec<LineFault>,
}

impl Bootstrap {
    /// Prepare a bundle for launch. Directive errors are written to
    /// `errors`.
    pub fn prepare(bundle: &Path, errors: &mut dyn Write) -> Result<Self, SiteError> {
        let bundle = bundle.to_str().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "bundle path is not valid UTF-8")
        })?;
        let bundle = absolute(bundle)?;

        let config = {
            let mut archive = open_archive(&bundle)?;
            let text = read_member_text(&mut archive, &bundle, CONFIG_MEMBER)?;
            BundleConfig::parse(&text)?
        };

        let site_dir = join(&[bundle.as_str(), SITE_PACKAGES]);
        let mut deferred = DeferredImports::new();
        let mut refused = RefuseImports::new();
        let hook: &mut dyn ImportHook = if config.site.allow_imports {
            &mut deferred
        } else {
            &mut refused
        };

        let mut site = Site::new(config.site.clone(), hook, errors);
        site.add_site_directory(&site_dir, true)?;
        let (search_path, faults) = site.finish();
        tracing::debug!(entries = search_path.len(), faults = faults.len(), "search path assembled");

        let entry_point = config.entry()?;
        let module_origin = locate_module(&search_path, &entry_point, &config.host)?.ok_or_else(|| {
            SiteError::EntryPointNotFound {
                entry_point: entry_point.to_string(),
                module: entry_point.module.clone(),
            }
        })?;

        Ok(Bootstrap {
            bundle,
            config,
            entry_point,
            module_origin,
            search_path,
            imports: deferred.into_statements(),
            faults,
        })
    }

    /// Run the entry point through `host`, returning its exit status.
    pub fn launch<H: ModuleHost + ?Sized>(&self, host: &mut H, args: &[OsString]) -> Result<i32, SiteError> {
        let launch = Launch {
            bundle: &self.bundle,
            entry_point: &self.entry_point,
            module_origin: &self.module_origin,
            search_path: &self.search_path,
            imports: &self.imports,
            args,
        };
        host.invoke(&launch)
    }
}

/// Prepare and launch a bundle, reporting directive errors on stderr.
pub fn run<H: ModuleHost + ?Sized>(bundle: &Path, host: &mut H, args: &[OsString]) -> Result<i32, SiteError> {
    let mut stderr = io::stderr();
    let bootstrap = Bootstrap::prepare(bundle, &mut stderr)?;
    bootstrap.launch(host, args)
}
