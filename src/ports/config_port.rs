//! Configuration lookup port.
//!
//! Values are addressed by INI-style `[section] key` pairs. Typed getters
//! fall back to the given default when a key is absent or unparsable.

use crate::domain::error::PortmixError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// A non-blank string value, or `ConfigMissing`.
    fn require_string(&self, section: &str, key: &str) -> Result<String, PortmixError> {
        match self.get_string(section, key) {
            Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
            _ => Err(PortmixError::ConfigMissing {
                section: section.to_string(),
                key: key.to_string(),
            }),
        }
    }
}
