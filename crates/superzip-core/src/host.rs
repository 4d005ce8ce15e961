//! Handing the assembled search path and entry point to a host runtime.
//!
//! The search path built during bootstrap is an ordinary owned value. It
//! only becomes visible to the runtime at the process boundary, when a
//! [`ModuleHost`] installs it.

use std::env;
use std::ffi::OsString;
use std::process::Command;

use crate::config::{EntryPoint, HostConfig};
use crate::error::SiteError;
use crate::search_path::SearchPath;

/// Everything the host needs to run the entry point.
#[derive(Debug, Clone, Copy)]
pub struct Launch<'a> {
    /// Path of the running bundle
    pub bundle: &'a str,

    pub entry_point: &'a EntryPoint,

    /// File the entry module was found in
    pub module_origin: &'a str,

    /// Search path, highest priority first
    pub search_path: &'a SearchPath,

    /// Deferred `import` statements from directive files
    pub imports: &'a [String],

    /// Command-line arguments for the program, passed through unchanged
    pub args: &'a [OsString],
}

/// A runtime that can load a module through a search path and call into
/// it.
pub trait ModuleHost {
    /// Run the entry point and return the program's exit status.
    fn invoke(&mut self, launch: &Launch<'_>) -> Result<i32, SiteError>;
}

/// Runs the entry point in an external interpreter process.
///
/// The search path is passed through `path_variable`, ahead of any value
/// inherited from the environment, so bundled modules shadow ambient ones.
/// The interpreter receives a short `-c` program that applies deferred
/// `import` statements and then calls the entry point.
#[derive(Debug, Clone)]
pub struct InterpreterHost {
    config: HostConfig,
}

impl InterpreterHost {
    pub fn new(config: HostConfig) -> Self {
        Self { config }
    }

    /// Value for `path_variable`: search-path entries first, then whatever
    /// was inherited.
    pub fn path_value(
        &self,
        search_path: &SearchPath,
        inherited: Option<OsString>,
    ) -> Result<OsString, SiteError> {
        let mut entries: Vec<OsString> = search_path.iter().map(OsString::from).collect();
        if let Some(inherited) = inherited {
            entries.extend(env::split_paths(&inherited).map(|p| p.into_os_string()));
        }
        env::join_paths(entries).map_err(|e| SiteError::Host(format!("cannot build search path: {}", e)))
    }

    /// Launcher program passed to the interpreter with `-c`.
    ///
    /// `-c` puts the working directory in front of the search path; it is
    /// dropped so nothing there can shadow the bundle.
    pub fn launcher_source(launch: &Launch<'_>) -> String {
        let mut source = String::from("import sys\n");
        source.push_str("if sys.path and sys.path[0] == '':\n    del sys.path[0]\n");
        source.push_str(&format!("sys.argv[0] = {}\n", quote(launch.bundle)));
        for statement in launch.imports {
            source.push_str(statement);
            source.push('\n');
        }
        source.push_str(&format!(
            "from {} import {} as _superzip_entry\n_superzip_entry()\n",
            launch.entry_point.module, launch.entry_point.callable
        ));
        source
    }
}

impl ModuleHost for InterpreterHost {
    fn invoke(&mut self, launch: &Launch<'_>) -> Result<i32, SiteError> {
        let path_value = self.path_value(launch.search_path, env::var_os(&self.config.path_variable))?;

        tracing::info!(
            program = %self.config.program,
            entry_point = %launch.entry_point,
            origin = %launch.module_origin,
            "starting entry point"
        );

        let status = Command::new(&self.config.program)
            .arg("-c")
            .arg(Self::launcher_source(launch))
            .args(launch.args)
            .env(&self.config.path_variable, path_value)
            .status()
            .map_err(|e| SiteError::Host(format!("failed to start {}: {}", self.config.program, e)))?;

        Ok(status.code().unwrap_or(1))
    }
}

/// Quote a string as an interpreter string literal.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}
