//! Colored terminal output.
//!
//! Uses `termcolor`. Respects the `NO_COLOR` environment variable and the
//! `--color` flag.

use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Resolve `ColorChoice` from the CLI flag and environment.
///
/// Priority: `NO_COLOR` env > `--color` flag > auto-detect TTY.
pub fn resolve_color_choice(flag: Option<&str>) -> ColorChoice {
    if std::env::var_os("NO_COLOR").is_some() {
        return ColorChoice::Never;
    }
    choice_from_flag(flag)
}

fn choice_from_flag(flag: Option<&str>) -> ColorChoice {
    match flag {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}

pub struct StyledOutput {
    stdout: StandardStream,
    stderr: StandardStream,
}

impl StyledOutput {
    pub fn new(choice: ColorChoice) -> Self {
        Self {
            stdout: StandardStream::stdout(choice),
            stderr: StandardStream::stderr(choice),
        }
    }

    /// Right-aligned green label followed by plain text, on stdout.
    pub fn status(&mut self, label: &str, text: &str) {
        write_labeled(&mut self.stdout, &format!("{:>12}", label), Color::Green, text);
    }

    /// Red `error:` label followed by the message, on stderr.
    pub fn error(&mut self, message: &str) {
        write_labeled(&mut self.stderr, "error:", Color::Red, message);
    }
}

fn write_labeled(stream: &mut StandardStream, label: &str, color: Color, text: &str) {
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(color)).set_bold(true);
    let _ = stream.set_color(&spec);
    let _ = write!(stream, "{}", label);
    let _ = stream.reset();
    let _ = writeln!(stream, " {}", text);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_from_flag() {
        assert_eq!(choice_from_flag(Some("always")), ColorChoice::Always);
        assert_eq!(choice_from_flag(Some("never")), ColorChoice::Never);
        assert_eq!(choice_from_flag(Some("auto")), ColorChoice::Auto);
        assert_eq!(choice_from_flag(None), ColorChoice::Auto);
    }
}
