use std::process::ExitCode;

use anyhow::Context;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use xml_compare::cli::{Cli, VerbosityLevel};
use xml_compare::config::ConfigManager;
use xml_compare::engine::ComparisonEngine;
use xml_compare::file_discovery::FileDiscovery;
use xml_compare::output::{self, Output};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse_args();

    init_tracing(cli.verbosity());

    let config = ConfigManager::load_config(&cli)
        .await
        .context("Failed to load configuration")?;
    debug!(?config, "effective configuration");

    let verbosity = config.output.verbosity();
    let console = Output::new(verbosity);

    let discovery = FileDiscovery::new()
        .with_extensions(config.files.extensions.clone())
        .with_include_patterns(&config.files.include_patterns)?
        .with_exclude_patterns(&config.files.exclude_patterns)?
        .with_recursive(config.files.recursive);

    let threads = ConfigManager::get_thread_count(&config);
    let engine = ComparisonEngine::new(config.comparison.clone(), threads);

    print!(
        "{}",
        console.format_start(
            &config.files.control_dir,
            &config.comparison.ignore_set,
            &config.output.report_path,
        )
    );

    let results = engine
        .compare_directories(&discovery, &config.files.control_dir, &config.files.test_dir)
        .await
        .context("Comparison failed")?;

    for result in &results.file_results {
        if let Some(line) = console.format_file_result(result, &config.output.report_path) {
            println!("{}", line);
        }
    }

    output::write_report(
        &config.output.report_path,
        config.output.format,
        &results,
        engine.settings(),
    )
    .await
    .with_context(|| {
        format!(
            "Failed to write report to {}",
            config.output.report_path.display()
        )
    })?;
    info!(report = %config.output.report_path.display(), "report written");

    print!("{}", console.format_summary(&results));
    print!("{}", console.format_finish());

    if results.has_failures() {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Log to stderr. `RUST_LOG` wins over the verbosity-derived default.
fn init_tracing(verbosity: VerbosityLevel) {
    let default_level = match verbosity {
        VerbosityLevel::Quiet => "error",
        VerbosityLevel::Normal => "warn",
        VerbosityLevel::Verbose => "info",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("xml_compare={}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
