//! INI file configuration adapter.

use crate::domain::error::PortmixError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PortmixError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| PortmixError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, PortmixError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| PortmixError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_deref()
            .and_then(Self::parse_bool)
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[data]
source = sqlite

[sqlite]
path = /var/lib/portmix/portmix.db
pool_size = 4

[csv]
dir = ./data

[logging]
level = debug

[output]
pretty = yes
"#;

    #[test]
    fn reads_all_sections() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();

        assert_eq!(adapter.get_string("data", "source"), Some("sqlite".to_string()));
        assert_eq!(
            adapter.get_string("sqlite", "path"),
            Some("/var/lib/portmix/portmix.db".to_string())
        );
        assert_eq!(adapter.get_int("sqlite", "pool_size", 1), 4);
        assert_eq!(adapter.get_string("csv", "dir"), Some("./data".to_string()));
        assert_eq!(adapter.get_string("logging", "level"), Some("debug".to_string()));
        assert!(adapter.get_bool("output", "pretty", false));
    }

    #[test]
    fn missing_keys_give_none_or_default() {
        let adapter = FileConfigAdapter::from_string("[sqlite]\n").unwrap();
        assert_eq!(adapter.get_string("sqlite", "path"), None);
        assert_eq!(adapter.get_string("nope", "path"), None);
        assert_eq!(adapter.get_int("sqlite", "pool_size", 4), 4);
        assert!(adapter.get_bool("output", "pretty", true));
    }

    #[test]
    fn unparsable_numbers_fall_back() {
        let adapter =
            FileConfigAdapter::from_string("[sqlite]\npool_size = many\n").unwrap();
        assert_eq!(adapter.get_int("sqlite", "pool_size", 2), 2);
    }

    #[test]
    fn bool_spellings() {
        let adapter = FileConfigAdapter::from_string(
            "[output]\na = true\nb = on\nc = 1\nd = no\ne = off\nf = 0\ng = maybe\n",
        )
        .unwrap();
        assert!(adapter.get_bool("output", "a", false));
        assert!(adapter.get_bool("output", "b", false));
        assert!(adapter.get_bool("output", "c", false));
        assert!(!adapter.get_bool("output", "d", true));
        assert!(!adapter.get_bool("output", "e", true));
        assert!(!adapter.get_bool("output", "f", true));
        assert!(adapter.get_bool("output", "g", true));
    }

    #[test]
    fn require_string_rejects_blank() {
        let adapter = FileConfigAdapter::from_string("[csv]\ndir =  \n").unwrap();
        let err = adapter.require_string("csv", "dir").unwrap_err();
        assert!(matches!(err, PortmixError::ConfigMissing { key, .. } if key == "dir"));
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[csv]\ndir = /tmp/prices\n").unwrap();

        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(adapter.require_string("csv", "dir").unwrap(), "/tmp/prices");
    }

    #[test]
    fn from_file_missing_is_config_parse_error() {
        let err = FileConfigAdapter::from_file("/nonexistent/portmix.ini").err().unwrap();
        assert!(matches!(err, PortmixError::ConfigParse { file, .. } if file.contains("portmix.ini")));
    }
}
