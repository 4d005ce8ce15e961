//! Site directory registration.
//!
//! A [`Site`] owns the search path being built during one bootstrap,
//! the set of directories already on it, and the sinks for `import` lines
//! and directive errors. Registering a site directory puts the directory
//! itself on the search path and then processes every directive file found
//! directly inside it.

use std::fs;
use std::io::{self, Write};

use crate::archive::{member_names, open_archive};
use crate::config::SiteConfig;
use crate::directive::{ImportHook, LineFault};
use crate::error::SiteError;
use crate::path::{
    absolute, is_sep, join, member_basename, member_name, member_parent, normcase, SEP,
};
use crate::search_path::{KnownPaths, SearchPath};
use crate::split::{split_zip_path, ArchiveBoundary, Location};

/// Search-path state for one bootstrap.
pub struct Site<'h> {
    pub(crate) search_path: SearchPath,
    pub(crate) known_paths: KnownPaths,
    pub(crate) imports: &'h mut dyn ImportHook,
    pub(crate) errors: &'h mut dyn Write,
    pub(crate) faults: Vec<LineFault>,
    config: SiteConfig,
}

impl<'h> Site<'h> {
    /// Create a site with an empty search path.
    pub fn new(config: SiteConfig, imports: &'h mut dyn ImportHook, errors: &'h mut dyn Write) -> Self {
        Self {
            search_path: SearchPath::new(),
            known_paths: KnownPaths::new(),
            imports,
            errors,
            faults: Vec::new(),
            config,
        }
    }

    /// Start from an existing search path. Its entries are seeded into the
    /// known-paths set.
    pub fn with_search_path(mut self, search_path: SearchPath) -> Self {
        self.known_paths = KnownPaths::from_search_path(&search_path);
        self.search_path = search_path;
        self
    }

    pub fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    pub fn known_paths(&self) -> &KnownPaths {
        &self.known_paths
    }

    /// Directive lines that failed so far.
    pub fn faults(&self) -> &[LineFault] {
        &self.faults
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Consume the site, returning the assembled search path and faults.
    pub fn finish(self) -> (SearchPath, Vec<LineFault>) {
        (self.search_path, self.faults)
    }

    /// Register a site directory, real or inside an archive.
    pub fn add_site_directory(&mut self, dir: &str, prepend_mode: bool) -> Result<(), SiteError> {
        match split_zip_path(dir) {
            Location::Real(real) => self.add_real_site_directory(&real, prepend_mode),
            Location::Archived(boundary) => {
                self.add_archived_site_directory(dir, &boundary, prepend_mode)
            }
        }
    }

    fn add_archived_site_directory(
        &mut self,
        dir: &str,
        boundary: &ArchiveBoundary,
        prepend_mode: bool,
    ) -> Result<(), SiteError> {
        tracing::debug!(%dir, archive = %boundary.archive_path, "registering archived site directory");
        self.search_path.insert(dir.to_string(), prepend_mode);

        let site_member = member_name(&boundary.inner_path);
        let parent = site_member.trim_matches('/');
        let suffix = format!(".{}", self.config.directive_suffix);

        let mut directives: Vec<String> = {
            let mut archive = open_archive(&boundary.archive_path)?;
            member_names(&mut archive, &boundary.archive_path)?
                .into_iter()
                .filter(|name| member_parent(name) == parent && name.ends_with(&suffix))
                .map(|name| member_basename(&name).to_string())
                .collect()
        };
        if self.config.sort_directives {
            directives.sort();
        }

        let mut site_dir = join(&[boundary.archive_path.as_str(), boundary.inner_path.as_str()]);
        if !site_dir.ends_with(is_sep) {
            site_dir.push(SEP);
        }
        for name in directives {
            self.process_directive_file(&site_dir, &name, prepend_mode)?;
        }
        Ok(())
    }

    fn add_real_site_directory(&mut self, dir: &str, prepend_mode: bool) -> Result<(), SiteError> {
        let resolved = absolute(dir)?;
        let entries = match fs::read_dir(&resolved) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(dir = %resolved, "site directory does not exist");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(dir = %resolved, "registering site directory");
        if self.known_paths.insert(normcase(&resolved)) {
            self.search_path.insert(resolved.clone(), prepend_mode);
        }

        let suffix = format!(".{}", self.config.directive_suffix);
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.ends_with(&suffix))
            .collect();
        names.sort();

        for name in names {
            self.process_directive_file(&resolved, &name, prepend_mode)?;
        }
        Ok(())
    }
}
