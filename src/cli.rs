use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only show files with differences or errors
    Quiet,
    /// Show one line per file
    #[default]
    Normal,
    /// Also show configuration and a summary
    Verbose,
}

/// Format of the written report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain text report
    #[default]
    Human,
    /// Machine-readable JSON report
    Json,
}

/// Compare control XML documents against test XML documents
#[derive(Parser, Debug, Clone)]
#[command(name = "xml-compare")]
#[command(about = "Compare control XML documents with test XML documents of the same name")]
#[command(version)]
pub struct Cli {
    /// Directory holding the control (expected) documents
    #[arg(help = "Control directory [default: ControlXML]")]
    pub control_dir: Option<PathBuf>,

    /// Directory holding the test (actual) documents
    #[arg(help = "Test directory [default: TestXML]")]
    pub test_dir: Option<PathBuf>,

    /// Configuration file (.properties, .toml or .json)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Numeric tolerance for text and attribute values
    #[arg(long = "epsilon")]
    pub epsilon: Option<f64>,

    /// Node names to ignore (repeatable, `;`-separated lists accepted)
    #[arg(short = 'i', long = "ignore", action = clap::ArgAction::Append)]
    pub ignore: Vec<String>,

    /// Path of the written report
    #[arg(short = 'r', long = "report")]
    pub report: Option<PathBuf>,

    /// Report format
    #[arg(short = 'f', long = "format", value_enum)]
    pub format: Option<OutputFormat>,

    /// File extensions to process (comma-separated)
    #[arg(
        short = 'e',
        long = "extensions",
        help = "File extensions to process (e.g., 'xml,cmdi')"
    )]
    pub extensions: Option<String>,

    /// Include file patterns (glob syntax)
    #[arg(long = "include", action = clap::ArgAction::Append)]
    pub include_patterns: Vec<String>,

    /// Exclude file patterns (glob syntax)
    #[arg(long = "exclude", action = clap::ArgAction::Append)]
    pub exclude_patterns: Vec<String>,

    /// Descend into subdirectories, pairing files by relative path
    #[arg(long = "recursive")]
    pub recursive: bool,

    /// Number of concurrent comparisons
    #[arg(short = 't', long = "threads")]
    pub threads: Option<usize>,

    /// Also report parents whose number of children differs
    #[arg(long = "child-count")]
    pub child_count: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", help = "Enable verbose output")]
    pub verbose: bool,

    /// Enable quiet mode (differences and errors only)
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Quiet mode",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn get_extensions(&self) -> Option<Vec<String>> {
        self.extensions.as_ref().map(|extensions| {
            extensions
                .split(',')
                .map(|s| s.trim().trim_start_matches('.').to_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        })
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}
