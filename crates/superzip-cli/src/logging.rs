//! Log output setup.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Environment variable controlling log output when a bundle runs.
pub const LAUNCH_LOG_ENV: &str = "SUPERZIP_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verbosity {
    pub level: Level,

    /// Let invoked programs (virtualenv, pip) write to the terminal
    pub forward_output: bool,
}

impl Verbosity {
    /// Map `-v` count and `-q` to a level. `-v` wins over `-q`.
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        let level = match verbose {
            0 if quiet => Level::ERROR,
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        };
        Self {
            level,
            forward_output: verbose >= 3,
        }
    }
}

/// Install the packaging-mode subscriber on stderr.
pub fn init(verbosity: Verbosity) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(verbosity.level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();
    tracing::debug!("logging initialized");
}

/// Install the launch-mode subscriber. The bundled program owns stdout and
/// stderr, so only warnings are shown unless `SUPERZIP_LOG` says otherwise.
pub fn init_launch() {
    let filter = EnvFilter::try_from_env(LAUNCH_LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();
}
