//! INI file configuration adapter.

use crate::domain::error::StratlabError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StratlabError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| StratlabError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, StratlabError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| StratlabError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    /// An empty configuration; every lookup falls back to defaults.
    pub fn empty() -> Self {
        Self { config: Ini::new() }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config
            .get(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn has_section(&self, section: &str) -> bool {
        let section = section.to_lowercase();
        self.config.sections().iter().any(|s| *s == section)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_sections() {
        let content = r#"
[chop_zone]
length = 30
source = close

[optimize.chop_zone]
length = 10..=50:10
ema_length = 20, 34
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(adapter.get_string("chop_zone", "length"), Some("30".into()));
        assert_eq!(
            adapter.get_string("optimize.chop_zone", "length"),
            Some("10..=50:10".into())
        );
        assert!(adapter.has_section("optimize.chop_zone"));
        assert!(!adapter.has_section("squeeze_dmi"));
    }

    #[test]
    fn get_string_missing_or_blank_is_none() {
        let adapter = FileConfigAdapter::from_string("[optimize]\nseed =\n").unwrap();
        assert_eq!(adapter.get_string("optimize", "seed"), None);
        assert_eq!(adapter.get_string("optimize", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn keys_are_case_insensitive() {
        let adapter = FileConfigAdapter::from_string("[Screen]\nThreshold = 0.4\n").unwrap();
        assert_eq!(adapter.get_string("screen", "threshold"), Some("0.4".into()));
        assert!(adapter.has_section("SCREEN"));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[optimize]\nmax_trials = 500\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(adapter.get_string("optimize", "max_trials"), Some("500".into()));
    }

    #[test]
    fn from_file_missing_is_parse_error() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(StratlabError::ConfigParse { .. })));
    }

    #[test]
    fn empty_has_nothing() {
        let adapter = FileConfigAdapter::empty();
        assert!(!adapter.has_section("optimize"));
        assert_eq!(adapter.get_string("optimize", "seed"), None);
    }
}
