//! superzip command-line tool
//!
//! Installs a program and its dependencies into a throwaway environment
//! and packs the result into one executable bundle. A bundle is this same
//! binary with the archive appended, so when the running executable turns
//! out to be a bundle it launches the bundled entry point instead of
//! parsing arguments.

mod commands;
mod environment;
mod logging;
mod naming;
mod output;

use clap::{ArgAction, Parser};
use std::path::PathBuf;

use commands::package::{PackageOptions, RawCopy};
use output::StyledOutput;

#[derive(Parser)]
#[command(name = "superzip")]
#[command(about = "Bundle a program and its dependencies into a single executable", long_about = None)]
#[command(version)]
struct Cli {
    /// More output: -v INFO, -vv DEBUG, -vvv DEBUG plus the output of invoked programs
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only report errors
    #[arg(short, long)]
    quiet: bool,

    /// Output file (defaults to the name of the last package plus ".sz")
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Requirements file to install from (may be repeated)
    #[arg(short, long = "requirements", value_name = "FILE")]
    requirements: Vec<String>,

    /// File or directory to copy into the bundle as is (may be repeated)
    #[arg(short = 'c', long = "raw-copy", value_name = "PATH")]
    raw_copy: Vec<PathBuf>,

    /// Like --raw-copy, but give the copy an importable NAME
    #[arg(long = "raw-copy-rename", num_args = 2, value_names = ["PATH", "NAME"], action = ArgAction::Append)]
    raw_copy_rename: Vec<String>,

    /// Interpreter used for the environment and to run the bundle
    #[arg(long, value_name = "PROGRAM", default_value = "python3")]
    python: String,

    /// Refuse `import` lines in directive files when the bundle runs
    #[arg(long)]
    sandbox: bool,

    /// Colorize output
    #[arg(long, value_name = "WHEN", value_parser = ["auto", "always", "never"])]
    color: Option<String>,

    /// Packages passed to `pip install`, followed by the entry point (module:callable)
    #[arg(value_name = "PACKAGE ... ENTRY_POINT", required = true)]
    args: Vec<String>,
}

impl Cli {
    fn into_options(self, forward_output: bool) -> anyhow::Result<PackageOptions> {
        let mut args = self.args;
        let entry_point = args.pop().unwrap_or_default();
        let mut packages = args
            .iter()
            .map(|spec| environment::split_spec(spec))
            .collect::<anyhow::Result<Vec<_>>>()?;
        packages.extend(
            self.requirements
                .into_iter()
                .map(|file| vec!["-r".to_string(), file]),
        );

        let mut raw_copies = self
            .raw_copy_rename
            .chunks(2)
            .map(|pair| RawCopy::renamed(&pair[0], &pair[1]))
            .collect::<Vec<_>>();
        for path in &self.raw_copy {
            raw_copies.push(RawCopy::from_path(path)?);
        }

        Ok(PackageOptions {
            packages,
            entry_point,
            output: self.output,
            raw_copies,
            python: self.python,
            sandbox: self.sandbox,
            forward_output,
        })
    }
}

fn main() {
    if let Some(status) = commands::boot::try_launch() {
        std::process::exit(status);
    }

    let cli = Cli::parse();
    let verbosity = logging::Verbosity::from_flags(cli.verbose, cli.quiet);
    logging::init(verbosity);
    let mut out = StyledOutput::new(output::resolve_color_choice(cli.color.as_deref()));

    let result = cli
        .into_options(verbosity.forward_output)
        .and_then(|options| commands::package::execute(&options));

    match result {
        Ok(path) => {
            out.status("Created", &path.display().to_string());
        }
        Err(e) => {
            tracing::debug!("{:?}", e);
            out.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    }
}
