use crate::cli::{Cli, OutputFormat, VerbosityLevel};
use crate::comparator::ComparisonSettings;
use crate::error::{ConfigError, ConfigResult as Result};
use crate::filter::IgnoreSet;
use crate::normalizer::Epsilon;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Trait for abstracting environment variable access
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub comparison: ComparisonSettings,
    pub files: FileConfig,
    pub output: OutputConfig,
    pub engine: EngineConfig,
}

/// Where documents come from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    /// Directory holding the control documents
    pub control_dir: PathBuf,
    /// Directory holding the test documents
    pub test_dir: PathBuf,
    /// File extensions to process
    pub extensions: Vec<String>,
    /// Include patterns (glob syntax)
    pub include_patterns: Vec<String>,
    /// Exclude patterns (glob syntax)
    pub exclude_patterns: Vec<String>,
    /// Descend into subdirectories
    pub recursive: bool,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the written report
    pub report_path: PathBuf,
    /// Report format
    pub format: OutputFormat,
    /// Verbose output
    pub verbose: bool,
    /// Quiet mode (differences and errors only)
    pub quiet: bool,
}

/// Batch engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of concurrent comparisons
    pub threads: Option<usize>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            control_dir: PathBuf::from("ControlXML"),
            test_dir: PathBuf::from("TestXML"),
            extensions: vec!["xml".to_string()],
            include_patterns: vec![],
            exclude_patterns: vec![],
            recursive: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_path: PathBuf::from("report.txt"),
            format: OutputFormat::Human,
            verbose: false,
            quiet: false,
        }
    }
}

impl OutputConfig {
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

/// Default properties file name
pub const PROPERTIES_FILE_NAME: &str = "comparator_configs.properties";

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: file -> environment -> CLI
    pub async fn load_config(cli: &Cli) -> Result<Config> {
        Self::load_config_with(&SystemEnvProvider, cli).await
    }

    /// Same as [`ConfigManager::load_config`] with a custom environment provider
    pub async fn load_config_with(env: &impl EnvProvider, cli: &Cli) -> Result<Config> {
        // Start with default configuration
        let mut config = Config::default();

        // Load from configuration file if specified
        if let Some(config_path) = &cli.config {
            config = Self::load_from_file(config_path).await?;
        } else if let Some(found_config) = Self::find_config_file().await? {
            config = found_config;
        }

        // Apply environment variable overrides
        config = Self::apply_environment_overrides_with(env, config)?;

        // Apply CLI argument overrides (highest precedence)
        config = Self::merge_with_cli(config, cli)?;

        // Validate the final configuration
        Self::validate_config(&config)?;

        Ok(config)
    }

    /// Load configuration from a file (properties, TOML or JSON)
    pub async fn load_from_file(path: &Path) -> Result<Config> {
        let content = tokio::fs::read_to_string(path).await?;
        debug!(path = %path.display(), "loading configuration file");

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("properties") => Self::from_properties(&content),
            Some("toml") => {
                let config: Config = toml::from_str(&content)?;
                Ok(config)
            }
            Some("json") => {
                let config: Config = serde_json::from_str(&content)?;
                Ok(config)
            }
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => {
                // Try to parse as TOML first, then JSON
                if let Ok(config) = toml::from_str::<Config>(&content) {
                    Ok(config)
                } else {
                    let config: Config = serde_json::from_str(&content)?;
                    Ok(config)
                }
            }
        }
    }

    /// Build a configuration from the `key=value` properties format.
    ///
    /// `epsilon` is required; `ignored-nodes` is a `;`-separated list and
    /// defaults to empty. The remaining keys are optional extensions.
    pub fn from_properties(content: &str) -> Result<Config> {
        let properties = parse_properties(content);
        let mut config = Config::default();

        let epsilon = properties
            .get("epsilon")
            .ok_or_else(|| ConfigError::MissingField {
                field: "epsilon".to_string(),
            })?;
        config.comparison.epsilon = Epsilon::parse(epsilon)?;

        if let Some(ignored) = properties.get("ignored-nodes") {
            config.comparison.ignore_set = IgnoreSet::from_delimited(ignored);
        }

        for (key, value) in &properties {
            match key.as_str() {
                "epsilon" | "ignored-nodes" => {}
                "report-child-count" => {
                    config.comparison.report_child_count =
                        parse_bool_property(key, value)?;
                }
                "control-dir" => config.files.control_dir = PathBuf::from(value),
                "test-dir" => config.files.test_dir = PathBuf::from(value),
                "report" => config.output.report_path = PathBuf::from(value),
                other => debug!(key = other, "ignoring unknown property"),
            }
        }

        Ok(config)
    }

    /// Find configuration file in standard locations
    pub async fn find_config_file() -> Result<Option<Config>> {
        let config_names = [
            PROPERTIES_FILE_NAME,
            "xml-compare.toml",
            "xml-compare.json",
            ".xml-compare.toml",
            ".xml-compare.json",
        ];

        // Check current directory first
        for name in &config_names {
            let path = PathBuf::from(name);
            if path.exists() {
                info!(path = %path.display(), "using configuration file");
                return Ok(Some(Self::load_from_file(&path).await?));
            }
        }

        // Check user config directory
        if let Some(config_dir) = dirs::config_dir() {
            let app_config_dir = config_dir.join("xml-compare");
            for name in &config_names {
                let path = app_config_dir.join(name);
                if path.exists() {
                    info!(path = %path.display(), "using configuration file");
                    return Ok(Some(Self::load_from_file(&path).await?));
                }
            }
        }

        Ok(None)
    }

    /// Apply environment variable overrides using the system environment
    pub fn apply_environment_overrides(config: Config) -> Result<Config> {
        Self::apply_environment_overrides_with(&SystemEnvProvider, config)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> Result<Config> {
        // Comparison settings
        if let Some(epsilon) = env.get("XML_COMPARE_EPSILON") {
            config.comparison.epsilon = Epsilon::parse(&epsilon).map_err(|e| {
                ConfigError::Environment(format!("Invalid XML_COMPARE_EPSILON value: {}", e))
            })?;
        }

        if let Some(ignored) = env.get("XML_COMPARE_IGNORED_NODES") {
            config.comparison.ignore_set = IgnoreSet::from_delimited(&ignored);
        }

        if let Some(child_count) = env.get("XML_COMPARE_CHILD_COUNT") {
            config.comparison.report_child_count = child_count.parse().map_err(|_| {
                ConfigError::Environment(format!(
                    "Invalid XML_COMPARE_CHILD_COUNT value: {}",
                    child_count
                ))
            })?;
        }

        // Engine settings
        if let Some(threads) = env.get("XML_COMPARE_THREADS") {
            config.engine.threads = Some(threads.parse().map_err(|_| {
                ConfigError::Environment(format!("Invalid XML_COMPARE_THREADS value: {}", threads))
            })?);
        }

        // Output settings
        if let Some(report) = env.get("XML_COMPARE_REPORT") {
            config.output.report_path = PathBuf::from(report);
        }

        if let Some(format) = env.get("XML_COMPARE_FORMAT") {
            config.output.format = match format.to_lowercase().as_str() {
                "human" => OutputFormat::Human,
                "json" => OutputFormat::Json,
                _ => {
                    return Err(ConfigError::Environment(format!(
                        "Invalid XML_COMPARE_FORMAT value: {}",
                        format
                    )));
                }
            };
        }

        Ok(config)
    }

    /// Merge CLI arguments with configuration (CLI takes precedence)
    pub fn merge_with_cli(mut config: Config, cli: &Cli) -> Result<Config> {
        // Comparison settings
        if let Some(epsilon) = cli.epsilon {
            config.comparison.epsilon = Epsilon::new(epsilon)?;
        }
        for list in &cli.ignore {
            config
                .comparison
                .ignore_set
                .extend_from(&IgnoreSet::from_delimited(list));
        }
        if cli.child_count {
            config.comparison.report_child_count = true;
        }

        // File settings
        if let Some(control_dir) = &cli.control_dir {
            config.files.control_dir = control_dir.clone();
        }
        if let Some(test_dir) = &cli.test_dir {
            config.files.test_dir = test_dir.clone();
        }
        if let Some(extensions) = cli.get_extensions() {
            config.files.extensions = extensions;
        }
        if !cli.include_patterns.is_empty() {
            config.files.include_patterns = cli.include_patterns.clone();
        }
        if !cli.exclude_patterns.is_empty() {
            config.files.exclude_patterns = cli.exclude_patterns.clone();
        }
        if cli.recursive {
            config.files.recursive = true;
        }

        // Engine settings
        if cli.threads.is_some() {
            config.engine.threads = cli.threads;
        }

        // Output settings
        if let Some(report) = &cli.report {
            config.output.report_path = report.clone();
        }
        if let Some(format) = cli.format {
            config.output.format = format;
        }
        if cli.verbose {
            config.output.verbose = true;
            config.output.quiet = false;
        }
        if cli.quiet {
            config.output.quiet = true;
            config.output.verbose = false;
        }

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> Result<()> {
        // Validate epsilon
        Epsilon::new(config.comparison.epsilon.value())?;

        // Validate threads
        if let Some(threads) = config.engine.threads {
            if threads == 0 {
                return Err(ConfigError::Validation(
                    "Number of threads must be greater than 0".to_string(),
                ));
            }
            if threads > 1000 {
                return Err(ConfigError::Validation(
                    "Number of threads cannot exceed 1000".to_string(),
                ));
            }
        }

        // Validate output settings
        if config.output.verbose && config.output.quiet {
            return Err(ConfigError::Validation(
                "Cannot enable both verbose and quiet modes".to_string(),
            ));
        }

        // Validate file settings
        if config.files.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "At least one file extension must be specified".to_string(),
            ));
        }

        for ext in &config.files.extensions {
            if ext.contains('/') || ext.contains('\\') || ext.contains('.') {
                return Err(ConfigError::Validation(format!(
                    "Invalid file extension: {}",
                    ext
                )));
            }
        }

        Ok(())
    }

    /// Get the effective thread count
    pub fn get_thread_count(config: &Config) -> usize {
        config.engine.threads.unwrap_or_else(num_cpus::get)
    }
}

/// Parse `key=value` lines. `#` and `!` start comments, `:` also separates
/// key from value, and a trailing backslash continues the line.
pub fn parse_properties(content: &str) -> BTreeMap<String, String> {
    let mut properties = BTreeMap::new();
    let mut logical = String::new();

    for line in content.lines() {
        let line = line.trim_start();
        if logical.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!'))
        {
            continue;
        }

        if let Some(continued) = line.strip_suffix('\\') {
            logical.push_str(continued);
            continue;
        }
        logical.push_str(line);

        let entry = std::mem::take(&mut logical);
        let (key, value) = match entry.find(['=', ':']) {
            Some(idx) => (&entry[..idx], &entry[idx + 1..]),
            None => (entry.as_str(), ""),
        };
        properties.insert(key.trim().to_string(), value.trim().to_string());
    }

    if !logical.is_empty() {
        let (key, value) = logical.split_once(['=', ':']).unwrap_or((logical.as_str(), ""));
        properties.insert(key.trim().to_string(), value.trim().to_string());
    }

    properties
}

fn parse_bool_property(key: &str, value: &str) -> Result<bool> {
    value.parse().map_err(|_| ConfigError::Validation(format!(
        "Invalid boolean for {}: {}",
        key, value
    )))
}
