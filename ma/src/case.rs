//! SU2 case file (`KEY= value`) parsing and rendering
//!
//! The case file is both the flow solver's configuration and the carrier of
//! the `ADAP_*` adaptation keys. Entries keep their file order so a derived
//! case written for a solver run diffs cleanly against the source file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{AdaptError, ConfigError};

/// Ordered key/value view of an SU2 case file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseConfig {
    entries: Vec<(String, String)>,
}

impl CaseConfig {
    /// Load and parse a case file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!(?path, "CaseConfig::load: called");
        let text = fs::read_to_string(path).map_err(|source| ConfigError::CaseFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &text)
    }

    /// Parse case file text; `path` is only used in error messages
    pub fn parse(path: &Path, text: &str) -> Result<Self, ConfigError> {
        let mut case = Self::default();
        for (n, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('%') {
                continue;
            }
            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(ConfigError::CaseSyntax {
                    path: path.to_path_buf(),
                    line: n + 1,
                    text: trimmed.to_string(),
                });
            };
            case.set(key, value.trim());
        }
        debug!(entries = case.entries.len(), "CaseConfig::parse: parsed");
        Ok(case)
    }

    /// Value of a key (keys are case-insensitive)
    pub fn get(&self, key: &str) -> Option<&str> {
        let key = normalize(key);
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
    }

    /// True when the key is present and set to YES
    pub fn is_yes(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| v.eq_ignore_ascii_case("YES"))
    }

    /// Set a key, replacing an existing value in place or appending
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let key = normalize(key);
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder form of [`CaseConfig::set`]
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render back to case file text
    pub fn render(&self) -> String {
        self.entries.iter().map(|(k, v)| format!("{}= {}\n", k, v)).collect()
    }

    /// Write the rendered case to `path`
    pub fn write(&self, path: &Path) -> Result<PathBuf, AdaptError> {
        debug!(?path, "CaseConfig::write: called");
        fs::write(path, self.render()).map_err(|e| AdaptError::io(path, e))?;
        Ok(path.to_path_buf())
    }
}

fn normalize(key: &str) -> String {
    key.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const CASE: &str = "% ------------- ADAPTATION -------------%
%
ADAP_COMPLEXITIES= (1000, 2000)
ADAP_SUBITE= (2, 1)
MESH_FILENAME= naca0012.meshb

MACH_NUMBER= 0.8
";

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let case = CaseConfig::parse(Path::new("case.cfg"), CASE).unwrap();

        assert_eq!(case.len(), 4);
        assert_eq!(case.get("ADAP_COMPLEXITIES"), Some("(1000, 2000)"));
        assert_eq!(case.get("mesh_filename"), Some("naca0012.meshb"));
        assert_eq!(case.get("ADAP_BACK"), None);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let case = CaseConfig::parse(Path::new("case.cfg"), CASE)
            .unwrap()
            .with("mesh_filename", "current.new.meshb")
            .with("RESTART_SOL", "YES");

        let rendered = case.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[2], "MESH_FILENAME= current.new.meshb");
        assert_eq!(lines[4], "RESTART_SOL= YES");
        assert!(case.is_yes("restart_sol"));
    }

    #[test]
    fn test_syntax_error_reports_line() {
        let err = CaseConfig::parse(Path::new("bad.cfg"), "A= 1\nnot a pair\n").unwrap_err();
        assert!(matches!(err, ConfigError::CaseSyntax { line: 2, .. }));
    }

    #[test]
    fn test_write_then_load() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("derived.cfg");
        let case = CaseConfig::parse(Path::new("case.cfg"), CASE).unwrap();

        case.write(&path).unwrap();
        assert_eq!(CaseConfig::load(&path).unwrap(), case);
    }

    #[test]
    fn test_load_missing_file() {
        let err = CaseConfig::load(Path::new("/nonexistent/case.cfg")).unwrap_err();
        assert!(matches!(err, ConfigError::CaseFile { .. }));
    }
}
