//! Scan configuration.
//!
//! Settings come from an optional TOML file and are then overridden by
//! command-line flags. A missing file is not an error; every key has a
//! default matching a stock Linux host.
//!
//! ```toml
//! passwd_path = "/etc/passwd"
//! group_path = "/etc/group"
//! acl_tool = "getfacl"
//! acl_flag = "-p"
//! acl_end_of_options = true
//! channel_capacity = 1024
//! system_lookup = true
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{HoundError, Result};

/// Runtime settings for one scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// passwd-style user registry.
    pub passwd_path: PathBuf,
    /// group-style group registry.
    pub group_path: PathBuf,
    /// ACL probe executable, looked up on `PATH`.
    pub acl_tool: String,
    /// Flag passed to the ACL probe before the path.
    pub acl_flag: String,
    /// Pass `--` between the flag and the path.
    pub acl_end_of_options: bool,
    /// Bound of the walker → builder channel.
    pub channel_capacity: usize,
    /// Ask the system (NSS) for names before scanning the raw registry files.
    pub system_lookup: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            passwd_path: PathBuf::from("/etc/passwd"),
            group_path: PathBuf::from("/etc/group"),
            acl_tool: "getfacl".to_string(),
            acl_flag: "-p".to_string(),
            acl_end_of_options: true,
            channel_capacity: 1024,
            system_lookup: true,
        }
    }
}

impl ScanConfig {
    /// Load from a TOML file, falling back to defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        let config: ScanConfig = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.channel_capacity == 0 {
            return Err(HoundError::Config(
                "channel_capacity must be at least 1".to_string(),
            ));
        }
        if self.acl_tool.trim().is_empty() {
            return Err(HoundError::Config("acl_tool must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = ScanConfig::load(Path::new("/nonexistent/permhound.toml")).unwrap();
        assert_eq!(config, ScanConfig::default());
        assert_eq!(config.acl_tool, "getfacl");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "passwd_path = \"/tmp/passwd\"").unwrap();
        writeln!(file, "channel_capacity = 8").unwrap();

        let config = ScanConfig::load(file.path()).unwrap();
        assert_eq!(config.passwd_path, PathBuf::from("/tmp/passwd"));
        assert_eq!(config.channel_capacity, 8);
        assert_eq!(config.group_path, PathBuf::from("/etc/group"));
        assert!(config.system_lookup);
        assert!(config.acl_end_of_options);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "channel_capacity = 0").unwrap();

        let err = ScanConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, HoundError::Config(_)));
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "channel_capacity = \"lots\"").unwrap();

        let err = ScanConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, HoundError::ConfigParse(_)));
    }
}
