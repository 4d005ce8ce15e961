//! Bundle configuration (superzip.toml) and entry point parsing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SiteError;

/// Name of the configuration member at the archive root.
pub const CONFIG_MEMBER: &str = "superzip.toml";

/// Bundled-dependency directory, relative to the archive root.
pub const SITE_PACKAGES: &str = "site-packages";

/// Bundle configuration stored at the archive root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BundleConfig {
    /// Entry point in the form `module:callable`
    pub entry_point: String,

    /// Search-path registration settings
    #[serde(default)]
    pub site: SiteConfig,

    /// Host runtime settings
    #[serde(default)]
    pub host: HostConfig,
}

/// Settings for site directory registration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteConfig {
    /// Extension (without the dot) identifying directive files
    #[serde(default = "default_directive_suffix")]
    pub directive_suffix: String,

    /// Process archived directive files in lexical order instead of
    /// archive member order
    #[serde(default)]
    pub sort_directives: bool,

    /// Whether `import` lines in directive files are handed to the host.
    /// When false, they are refused and skipped.
    #[serde(default = "default_true")]
    pub allow_imports: bool,
}

fn default_directive_suffix() -> String {
    "pth".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            directive_suffix: default_directive_suffix(),
            sort_directives: false,
            allow_imports: true,
        }
    }
}

/// How the entry point is handed to the host runtime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostConfig {
    /// Interpreter program
    #[serde(default = "default_program")]
    pub program: String,

    /// Environment variable that carries the search path
    #[serde(default = "default_path_variable")]
    pub path_variable: String,

    /// Extension of module source files
    #[serde(default = "default_module_suffix")]
    pub module_suffix: String,

    /// File marking a directory as a package
    #[serde(default = "default_package_init")]
    pub package_init: String,
}

fn default_program() -> String {
    "python3".to_string()
}

fn default_path_variable() -> String {
    "PYTHONPATH".to_string()
}

fn default_module_suffix() -> String {
    "py".to_string()
}

fn default_package_init() -> String {
    "__init__.py".to_string()
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            path_variable: default_path_variable(),
            module_suffix: default_module_suffix(),
            package_init: default_package_init(),
        }
    }
}

impl BundleConfig {
    /// Create a configuration with default site and host settings.
    pub fn new(entry_point: impl Into<String>) -> Self {
        Self {
            entry_point: entry_point.into(),
            site: SiteConfig::default(),
            host: HostConfig::default(),
        }
    }

    /// Parse a configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, SiteError> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize to TOML text.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    /// Parse the entry point.
    pub fn entry(&self) -> Result<EntryPoint, SiteError> {
        self.entry_point.parse()
    }
}

/// A `module:callable` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    /// Dotted module name
    pub module: String,

    /// Name of a zero-argument callable in that module
    pub callable: String,
}

impl EntryPoint {
    /// Module name split into its dotted segments.
    pub fn module_segments(&self) -> impl Iterator<Item = &str> {
        self.module.split('.')
    }
}

impl FromStr for EntryPoint {
    type Err = SiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SiteError::EntryPointFormat(s.to_string());

        let (module, callable) = s.split_once(':').ok_or_else(invalid)?;
        if callable.contains(':') || !is_identifier(callable) {
            return Err(invalid());
        }
        if !module.split('.').all(is_identifier) {
            return Err(invalid());
        }

        Ok(EntryPoint {
            module: module.to_string(),
            callable: callable.to_string(),
        })
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.callable)
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let config = BundleConfig::parse("entry_point = \"tinyscript.main:run\"\n").unwrap();
        assert_eq!(config.entry_point, "tinyscript.main:run");
        assert_eq!(config.site, SiteConfig::default());
        assert_eq!(config.host.program, "python3");

        let entry = config.entry().unwrap();
        assert_eq!(entry.module, "tinyscript.main");
        assert_eq!(entry.callable, "run");
        assert_eq!(entry.module_segments().collect::<Vec<_>>(), vec!["tinyscript", "main"]);
    }

    #[test]
    fn test_parse_sections() {
        let toml = r#"
entry_point = "app:main"

[site]
directive_suffix = "paths"
sort_directives = true
allow_imports = false

[host]
program = "/usr/bin/python3.12"
"#;
        let config = BundleConfig::parse(toml).unwrap();
        assert_eq!(config.site.directive_suffix, "paths");
        assert!(config.site.sort_directives);
        assert!(!config.site.allow_imports);
        assert_eq!(config.host.program, "/usr/bin/python3.12");
        assert_eq!(config.host.path_variable, "PYTHONPATH");
    }

    #[test]
    fn test_parse_missing_entry_point() {
        assert!(matches!(
            BundleConfig::parse("[site]\n"),
            Err(SiteError::Config(_))
        ));
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut config = BundleConfig::new("app:main");
        config.site.allow_imports = false;
        let text = config.to_toml().unwrap();
        assert_eq!(BundleConfig::parse(&text).unwrap(), config);
    }

    #[test]
    fn test_entry_point_errors() {
        for bad in ["app", "app:", ":main", "a:b:c", "app.:main", "app:ma in", "1app:main"] {
            assert!(
                matches!(bad.parse::<EntryPoint>(), Err(SiteError::EntryPointFormat(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_entry_point_display() {
        let entry: EntryPoint = "pkg.cli:main".parse().unwrap();
        assert_eq!(entry.to_string(), "pkg.cli:main");
    }
}
