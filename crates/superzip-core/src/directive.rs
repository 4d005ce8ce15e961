//! Directive file (`*.pth`) interpretation.
//!
//! A directive file lives in a site directory and is read line by line:
//!
//! - `#...` is a comment
//! - `import ...` / `import\t...` is a statement for the host runtime,
//!   routed through an [`ImportHook`]
//! - any other non-blank line is a directory, relative to the site
//!   directory, to put on the search path if it exists
//!
//! A failing line ends processing of that file only. Lines before it stay
//! in effect and a report naming the file and line goes to the error sink.

use std::error::Error as _;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};

use crate::archive::{exists, open_archive};
use crate::error::{DirectiveError, SiteError};
use crate::path::{join, make_path, member_name};
use crate::site::Site;
use crate::split::{split_zip_path, Location};

/// Capability for `import` lines.
///
/// Directive files may carry statements to run at registration time.
/// The site layer never runs them itself; whoever builds the [`Site`]
/// decides what happens to them.
pub trait ImportHook {
    /// Handle one statement. `origin` is the directive file it came from.
    /// An error ends processing of that file.
    fn execute(&mut self, statement: &str, origin: &str) -> Result<(), DirectiveError>;
}

/// Records statements so the host runtime can run them before the entry
/// point.
#[derive(Debug, Default)]
pub struct DeferredImports {
    statements: Vec<String>,
}

impl DeferredImports {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn into_statements(self) -> Vec<String> {
        self.statements
    }
}

impl ImportHook for DeferredImports {
    fn execute(&mut self, statement: &str, origin: &str) -> Result<(), DirectiveError> {
        tracing::debug!(%origin, %statement, "deferring import statement");
        self.statements.push(statement.to_string());
        Ok(())
    }
}

/// Sandboxed mode: statements are logged and skipped.
#[derive(Debug, Default)]
pub struct RefuseImports {
    refused: usize,
}

impl RefuseImports {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of statements refused so far.
    pub fn refused(&self) -> usize {
        self.refused
    }
}

impl ImportHook for RefuseImports {
    fn execute(&mut self, statement: &str, origin: &str) -> Result<(), DirectiveError> {
        tracing::warn!(%origin, %statement, "refusing import statement in sandboxed mode");
        self.refused += 1;
        Ok(())
    }
}

/// A directive line that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFault {
    /// 1-based line number
    pub line: usize,

    /// Resolved name of the directive file
    pub file: String,

    /// Formatted error chain
    pub message: String,
}

/// What processing one directive file did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveOutcome {
    /// Directories put on the search path, in line order
    pub added: Vec<String>,

    /// `import` statements handed to the hook
    pub imports: usize,

    /// The line that ended processing early, if any
    pub fault: Option<LineFault>,
}

/// Kind of a directive line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Comment,
    Import,
    Path,
    Blank,
}

/// Classify a raw line (including its line terminator).
pub fn classify(raw: &[u8]) -> LineKind {
    if raw.starts_with(b"#") {
        LineKind::Comment
    } else if raw.starts_with(b"import ") || raw.starts_with(b"import\t") {
        LineKind::Import
    } else if raw.iter().all(|b| b.is_ascii_whitespace()) {
        LineKind::Blank
    } else {
        LineKind::Path
    }
}

impl Site<'_> {
    /// Process the directive file `name` inside `site_dir`.
    ///
    /// `site_dir` may lie inside an archive. Failing to open the archive or
    /// read the member is an error. A real file that cannot be opened is skipped, and a read or
    /// line failure ends up in [`DirectiveOutcome::fault`], so sibling files
    /// are still processed.
    pub fn process_directive_file(
        &mut self,
        site_dir: &str,
        name: &str,
        prepend_mode: bool,
    ) -> Result<DirectiveOutcome, SiteError> {
        let fullname = join(&[site_dir, name]);
        tracing::debug!(file = %fullname, "processing directive file");

        match split_zip_path(&fullname) {
            Location::Real(real) => {
                let file = match File::open(&real) {
                    Ok(file) => file,
                    Err(e) => {
                        tracing::warn!(file = %fullname, error = %e, "skipping unreadable directive file");
                        return Ok(DirectiveOutcome::default());
                    }
                };
                Ok(self.process_lines(BufReader::new(file), site_dir, &fullname, prepend_mode))
            }
            Location::Archived(boundary) => {
                let mut archive = open_archive(&boundary.archive_path)?;
                let member = member_name(&boundary.inner_path);
                let mut entry = match archive.by_name(&member) {
                    Ok(entry) => entry,
                    Err(zip::result::ZipError::FileNotFound) => {
                        return Err(SiteError::MemberMissing {
                            archive: boundary.archive_path.into(),
                            member,
                        })
                    }
                    Err(e) => return Err(SiteError::unreadable(&boundary.archive_path, e)),
                };
                // A member that cannot be read means the bundle is broken.
                let mut content = Vec::new();
                entry
                    .read_to_end(&mut content)
                    .map_err(|e| SiteError::unreadable(&boundary.archive_path, e.into()))?;
                Ok(self.process_lines(content.as_slice(), site_dir, &fullname, prepend_mode))
            }
        }
    }

    fn process_lines<R: BufRead>(
        &mut self,
        mut reader: R,
        site_dir: &str,
        fullname: &str,
        prepend_mode: bool,
    ) -> DirectiveOutcome {
        let mut outcome = DirectiveOutcome::default();
        let mut raw = Vec::new();
        let mut lineno = 0;

        loop {
            raw.clear();
            lineno += 1;
            let applied = match reader.read_until(b'\n', &mut raw) {
                Ok(0) => break,
                Ok(_) => self.apply_line(&raw, site_dir, fullname, prepend_mode, &mut outcome),
                Err(e) => Err(DirectiveError::Read(e)),
            };

            if let Err(err) = applied {
                let fault = self.report_fault(fullname, lineno, &err);
                outcome.fault = Some(fault);
                break;
            }
        }

        outcome
    }

    fn apply_line(
        &mut self,
        raw: &[u8],
        site_dir: &str,
        fullname: &str,
        prepend_mode: bool,
        outcome: &mut DirectiveOutcome,
    ) -> Result<(), DirectiveError> {
        match classify(raw) {
            LineKind::Comment | LineKind::Blank => Ok(()),
            LineKind::Import => {
                let text = String::from_utf8(raw.to_vec())?;
                self.imports.execute(text.trim_end(), fullname)?;
                outcome.imports += 1;
                Ok(())
            }
            LineKind::Path => {
                let text = String::from_utf8(raw.to_vec())?;
                let line = text.trim_end();
                if line.contains('\0') {
                    return Err(DirectiveError::InvalidPath(line.to_string()));
                }

                let (dir, key) = make_path(site_dir, line).map_err(DirectiveError::CurrentDir)?;
                if self.known_paths.contains(&key) {
                    tracing::trace!(%dir, "already on search path");
                    return Ok(());
                }
                if !exists(&dir).map_err(Box::new)? {
                    tracing::debug!(%dir, "skipping missing directory");
                    return Ok(());
                }

                tracing::debug!(%dir, "adding to search path");
                self.search_path.insert(dir.clone(), prepend_mode);
                self.known_paths.insert(key);
                outcome.added.push(dir);
                Ok(())
            }
        }
    }

    fn report_fault(&mut self, fullname: &str, line: usize, err: &DirectiveError) -> LineFault {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(&format!("\ncaused by: {}", cause));
            source = cause.source();
        }

        tracing::debug!(file = %fullname, line, "{}", message);

        let _ = writeln!(self.errors, "Error processing line {} of {}:\n", line, fullname);
        for record in message.lines() {
            let _ = writeln!(self.errors, "  {}", record);
        }
        let _ = writeln!(self.errors, "\nRemainder of file ignored");

        let fault = LineFault {
            line,
            file: fullname.to_string(),
            message,
        };
        self.faults.push(fault.clone());
        fault
    }
}
