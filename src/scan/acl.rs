//! POSIX ACL presence detection through an external probe (`getfacl`).
//!
//! This is a presence signal only: `true` means grants exist beyond the
//! basic mode bits, nothing more is extracted.

use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, trace};

use crate::config::ScanConfig;

/// Outcome of probing one path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AclReport {
    pub has_acl: bool,
    /// Soft failure text, appended to the record's scan error.
    pub error: Option<String>,
}

/// Runs `<tool> <flag> <path>` and applies the detection heuristic.
#[derive(Debug, Clone)]
pub struct AclProbe {
    tool: String,
    flag: String,
    /// Pass `--` before the path so names starting with `-` stay operands.
    end_of_options: bool,
    /// Resolved on `PATH` once; `None` disables probing.
    executable: Option<PathBuf>,
}

impl AclProbe {
    pub fn new(tool: impl Into<String>, flag: impl Into<String>) -> Self {
        let tool = tool.into();
        let executable = match which::which(&tool) {
            Ok(path) => Some(path),
            Err(e) => {
                debug!(tool = %tool, error = %e, "ACL probe not found, ACL detection disabled");
                None
            }
        };
        Self {
            tool,
            flag: flag.into(),
            end_of_options: true,
            executable,
        }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(&config.acl_tool, &config.acl_flag)
            .with_end_of_options(config.acl_end_of_options)
    }

    pub fn with_end_of_options(mut self, enabled: bool) -> Self {
        self.end_of_options = enabled;
        self
    }

    pub fn is_available(&self) -> bool {
        self.executable.is_some()
    }

    pub fn detect(&self, path: &Path) -> AclReport {
        let Some(exe) = &self.executable else {
            return AclReport::default();
        };

        let mut command = Command::new(exe);
        command.arg(&self.flag);
        if self.end_of_options {
            command.arg("--");
        }
        let output = match command.arg(path).output() {
            Ok(output) => output,
            Err(e) => {
                return AclReport {
                    has_acl: false,
                    error: Some(format!("{}: {}", self.tool, e)),
                }
            }
        };

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        let mut error = None;
        if !output.status.success() {
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            error = Some(format!("{} exited with {}", self.tool, output.status));
        }

        let has_acl = parse_acl_output(&text);
        trace!(path = %path.display(), has_acl, "ACL probe finished");
        AclReport { has_acl, error }
    }
}

impl Default for AclProbe {
    fn default() -> Self {
        Self::from_config(&ScanConfig::default())
    }
}

/// Whether getfacl-style output shows any grant beyond the mode bits.
pub fn parse_acl_output(output: &str) -> bool {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .any(is_extended_entry)
}

fn is_extended_entry(line: &str) -> bool {
    if line.starts_with("mask:") || line.starts_with("default:") {
        return true;
    }

    let fields: Vec<&str> = line.split(':').collect();
    if fields.len() < 3 {
        return false;
    }
    let qualifier = fields[1];
    match fields[0] {
        "user" => !qualifier.is_empty() && qualifier != "0",
        "group" => !qualifier.is_empty(),
        _ => false,
    }
}
