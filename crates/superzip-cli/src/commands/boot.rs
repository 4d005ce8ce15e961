//! Launch mode: the running executable is a bundle.

use anyhow::Context;
use std::env;
use std::ffi::OsString;
use std::io;
use std::path::Path;

use superzip_core::{is_bundle, Bootstrap, InterpreterHost};

use crate::logging;

/// Run the bundled entry point if the current executable is a bundle.
///
/// Returns the exit status to use, or `None` when this is a plain
/// `superzip` binary.
pub fn try_launch() -> Option<i32> {
    let exe = env::current_exe().ok()?;
    if !is_bundle(&exe) {
        return None;
    }

    logging::init_launch();
    let args: Vec<OsString> = env::args_os().skip(1).collect();

    Some(match launch(&exe, &args) {
        Ok(status) => status,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    })
}

fn launch(bundle: &Path, args: &[OsString]) -> anyhow::Result<i32> {
    let mut stderr = io::stderr();
    let bootstrap = Bootstrap::prepare(bundle, &mut stderr)
        .with_context(|| format!("Cannot start bundle {}", bundle.display()))?;
    tracing::debug!(
        entries = bootstrap.search_path.len(),
        imports = bootstrap.imports.len(),
        "bundle prepared"
    );

    let mut host = InterpreterHost::new(bootstrap.config.host.clone());
    let status = bootstrap.launch(&mut host, args)?;
    Ok(status)
}
