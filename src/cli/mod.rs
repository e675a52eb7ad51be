//! Command-line interface for permhound.
//!
//! Flags select the record source (tree walk or path list on stdin), how
//! entries are inspected, and which output envelope is written.

use clap::Parser;
use std::io::{self, BufReader, IsTerminal};
use std::path::PathBuf;

use crate::config::ScanConfig;
use crate::error::Result;
use crate::pipeline::Source;
use crate::scan::Inspector;

#[derive(Parser, Debug)]
#[command(name = "permhound")]
#[command(about = "Map filesystem permissions into a user/group/file graph", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Starting path (default: current directory)
    #[arg(short, long)]
    pub path: Option<PathBuf>,

    /// Levels below the starting path's children to descend (-1 = unlimited)
    #[arg(short = 'd', long, default_value_t = -1, allow_negative_numbers = true)]
    pub max_depth: i64,

    /// Stat the target of symlinks instead of the link itself
    #[arg(long)]
    pub follow_symlink: bool,

    /// Do not probe entries for extended ACLs
    #[arg(long)]
    pub skip_acl: bool,

    /// Read newline-separated paths from stdin instead of walking
    #[arg(long)]
    pub stdin: bool,

    /// Emit users, groups and raw entries instead of the graph
    #[arg(long, conflicts_with = "human")]
    pub base_collection: bool,

    /// Print one tab-separated line per entry instead of JSON
    #[arg(long)]
    pub human: bool,

    /// Print JSON to stdout instead of writing a file
    #[arg(long)]
    pub stdout: bool,

    /// Output file name, without the .json extension
    #[arg(short, long, default_value = "output")]
    pub output: String,

    /// Print graph statistics and escalation paths on stderr
    #[arg(long)]
    pub summary: bool,

    /// TOML config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// What the run emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Graph,
    Collection,
    Human,
}

impl Cli {
    pub fn scan_config(&self) -> Result<ScanConfig> {
        match &self.config {
            Some(path) => ScanConfig::load(path),
            None => Ok(ScanConfig::default()),
        }
    }

    pub fn mode(&self) -> OutputMode {
        if self.human {
            OutputMode::Human
        } else if self.base_collection {
            OutputMode::Collection
        } else {
            OutputMode::Graph
        }
    }

    /// Paths come from stdin when asked for, or when no path was given and
    /// stdin is piped.
    pub fn reads_stdin(&self, stdin_is_terminal: bool) -> bool {
        self.stdin || (self.path.is_none() && !stdin_is_terminal)
    }

    pub fn source(&self) -> Source {
        if self.reads_stdin(io::stdin().is_terminal()) {
            Source::Paths(Box::new(BufReader::new(io::stdin())))
        } else {
            Source::Walk {
                root: self.path.clone().unwrap_or_else(|| PathBuf::from(".")),
                max_depth: self.max_depth,
            }
        }
    }

    pub fn inspector(&self, config: &ScanConfig) -> Inspector {
        Inspector::from_config(config, self.follow_symlink, !self.skip_acl)
    }

    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}
