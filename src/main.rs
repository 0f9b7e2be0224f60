use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use webcheckpoint::{
    catalog::VersionCatalog,
    config::Config,
    fetch::HttpFetcher,
    model::ProjectInfo,
    output::{
        format_report_to_string, print_catalog_table, print_lookup, print_report,
        print_verification, OutputFormat,
    },
    scanner::Checkpoint,
};

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const NOT_APPROVED: u8 = 2;
}

#[derive(Parser)]
#[command(name = "webcheckpoint")]
#[command(
    author,
    version,
    about = "Pre-assessment security checkpoint for web applications"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Extra catalog file of approved versions (`name: v1, v2` per line)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the 14 checkpoint checks against a URL
    Scan {
        /// Target URL; https:// is assumed when no scheme is given
        url: String,

        /// Output format (table, json, html)
        #[arg(short, long)]
        format: Option<String>,

        /// Write the report to a file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Project name for the report
        #[arg(long)]
        project: Option<String>,

        /// Report author
        #[arg(long)]
        author: Option<String>,

        /// Ticket reference
        #[arg(long)]
        ticket: Option<String>,

        /// Project version
        #[arg(long = "project-version")]
        project_version: Option<String>,

        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Exit with code 2 when the target is NOT APPROVED
        #[arg(long)]
        fail_on_reject: bool,
    },

    /// Look up a piece of software in the approved catalog
    Lookup {
        /// Software name, optionally followed by a version ("jquery 3.6.4")
        software: String,

        /// Version, when not part of the name
        version: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Verify several pieces of software at once
    Verify {
        /// Entries such as "jquery 3.6.4" "php 8.2"
        #[arg(required = true)]
        software: Vec<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the approved software catalog
    Catalog {
        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

fn init_logging(verbose: bool) {
    // RUST_LOG wins over --verbose.
    let env_filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("webcheckpoint=debug")
    } else {
        EnvFilter::new("webcheckpoint=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    debug!("Logging initialized (verbose={})", verbose);
}

async fn run(cli: Cli) -> Result<u8> {
    let config = Config::load().unwrap_or_default();

    match cli.command {
        Commands::Scan {
            url,
            format,
            output,
            project,
            author,
            ticket,
            project_version,
            timeout,
            fail_on_reject,
        } => {
            let catalog = load_catalog(&config, cli.catalog.as_deref())?;
            let format = format.unwrap_or_else(|| config.default_format.clone());

            let mut info = config.project.clone();
            override_field(&mut info.name, project);
            override_field(&mut info.author, author);
            override_field(&mut info.ticket, ticket);
            override_field(&mut info.version, project_version);

            let settings = ScanSettings {
                format,
                output,
                timeout_secs: timeout.unwrap_or(config.timeout_secs),
                fail_on_reject,
            };
            run_scan(&url, &config, catalog, &info, settings).await
        }
        Commands::Lookup {
            software,
            version,
            json,
        } => {
            let catalog = load_catalog(&config, cli.catalog.as_deref())?;
            let result = catalog.lookup_version(&software, version.as_deref());

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_lookup(&result);
            }
            Ok(exit_codes::SUCCESS)
        }
        Commands::Verify { software, json } => {
            let catalog = load_catalog(&config, cli.catalog.as_deref())?;
            let report = catalog.snapshot().verify_all(&software);

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_verification(&report)?;
            }
            Ok(exit_codes::SUCCESS)
        }
        Commands::Catalog { format } => {
            let catalog = load_catalog(&config, cli.catalog.as_deref())?;
            let summary = catalog.snapshot().summary();

            match format.to_lowercase().as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
                "table" => print_catalog_table(&summary)?,
                other => anyhow::bail!("Unknown format: {}. Use 'table' or 'json'", other),
            }
            Ok(exit_codes::SUCCESS)
        }
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
    }
}

struct ScanSettings {
    format: String,
    output: Option<PathBuf>,
    timeout_secs: u64,
    fail_on_reject: bool,
}

async fn run_scan(
    url: &str,
    config: &Config,
    catalog: Arc<VersionCatalog>,
    project: &ProjectInfo,
    settings: ScanSettings,
) -> Result<u8> {
    let format = OutputFormat::from_str(&settings.format).map_err(|e| anyhow::anyhow!(e))?;
    let is_interactive = format == OutputFormat::Table;

    let fetcher = HttpFetcher::with_settings(&config.user_agent, settings.timeout_secs)?;
    let checkpoint =
        Checkpoint::new(fetcher, catalog).with_allowed_domains(config.allowed_domains.clone());

    let progress = if is_interactive {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("Scanning {}...", url));
        Some(pb)
    } else {
        None
    };

    let result = checkpoint.scan(url).await;

    if let Some(pb) = progress {
        match &result {
            Ok(report) => pb.finish_with_message(format!(
                "Completed {} checks: {}",
                report.total, report.status
            )),
            Err(_) => pb.finish_and_clear(),
        }
    }

    let report = result?;

    if let Some(path) = settings.output {
        let content = format_report_to_string(&report, project, format)?;
        std::fs::write(&path, content)?;
        if is_interactive {
            println!("Report written to: {}", path.display());
        }
    } else {
        print_report(&report, project, format)?;
    }

    if settings.fail_on_reject && !report.is_approved() {
        Ok(exit_codes::NOT_APPROVED)
    } else {
        Ok(exit_codes::SUCCESS)
    }
}

/// Built-in catalog plus the configured and command-line catalog files.
///
/// A configured file that fails to load is skipped with a warning; a file
/// given on the command line must load.
fn load_catalog(config: &Config, extra: Option<&Path>) -> Result<Arc<VersionCatalog>> {
    let catalog = VersionCatalog::new();

    if let Some(path) = &config.catalog_file {
        catalog.load_from_file(path);
    }
    if let Some(path) = extra {
        if !catalog.load_from_file(path) {
            anyhow::bail!("could not load catalog file {}", path.display());
        }
    }

    Ok(Arc::new(catalog))
}

fn override_field(field: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *field = value;
    }
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let config = Config::default();
        config.save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'webcheckpoint config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}
