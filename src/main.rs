//! PowerStore Batch Provisioner CLI
//!
//! Reads a CSV batch of volume/file-system requests, provisions them against
//! one PowerStore array, and writes the audit report.
//!
//! Exit codes: 0 when every request succeeded cleanly, 1 when the report
//! contains any non-Success outcome, 2 on a fatal pre-loop error (bad
//! configuration or the array is unreachable).

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use powerstore_provisioner::{
    input, render, ArrayConfig, Error, GatewayFactory, Orchestrator, Result, RunConfig,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Batch-provision block volumes and file systems on a PowerStore array
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Batch CSV file to provision
    input: Option<PathBuf>,

    /// YAML file with array connection settings
    #[arg(long, env = "PS_CONFIG")]
    config: Option<PathBuf>,

    /// Array management endpoint, e.g. https://10.64.2.10
    #[arg(long, env = "PS_ENDPOINT")]
    endpoint: Option<String>,

    /// Array management user
    #[arg(long, env = "PS_USERNAME")]
    username: Option<String>,

    /// Array management password
    #[arg(long, env = "PS_PASSWORD")]
    password: Option<String>,

    /// Accept self-signed certificates
    #[arg(long)]
    insecure: bool,

    /// Write the joined per-request report as CSV
    #[arg(long, value_name = "PATH")]
    report_csv: Option<PathBuf>,

    /// Write the styled report as a single HTML file
    #[arg(long, value_name = "PATH")]
    report_html: Option<PathBuf>,

    /// Pause between requests in milliseconds (0 disables)
    #[arg(long, env = "PS_PAUSE_MS", default_value = "250")]
    pause_ms: u64,

    /// Validate the batch against the array without provisioning
    #[arg(long)]
    validate_only: bool,

    /// Write a sample batch file and exit
    #[arg(long, value_name = "PATH")]
    write_sample: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args);

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!("Fatal: {}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    if let Some(path) = &args.write_sample {
        input::write_sample(path)?;
        println!("Sample batch written to {}", path.display());
        return Ok(ExitCode::SUCCESS);
    }

    let input_path = args.input.as_ref().ok_or_else(|| {
        Error::Configuration("no batch file given (try --write-sample to get started)".into())
    })?;

    let config = build_config(&args)?;
    let requests = input::load_requests(input_path)?;

    info!("Connecting to {}", config.endpoint);
    let gateway = GatewayFactory::connect(config).await?;

    let orchestrator = Orchestrator::new(
        gateway,
        RunConfig {
            pause_ms: args.pause_ms,
        },
    );

    if args.validate_only {
        let verdicts = orchestrator.preflight(&requests).await?;
        let mut all_valid = true;
        for verdict in &verdicts {
            let state = if verdict.is_valid { "ok" } else { "INVALID" };
            println!("{:<24} {}", verdict.request_name, state);
            for err in &verdict.errors {
                println!("    error: {}", err);
            }
            for warning in &verdict.warnings {
                println!("    warning: {}", warning);
            }
            all_valid &= verdict.is_valid;
        }
        return Ok(if all_valid {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(1)
        });
    }

    let report = orchestrator.run(&requests).await?;
    print!("{}", render::render_summary(&report));

    if let Some(path) = &args.report_csv {
        render::write_csv(&report, path)?;
        info!("CSV report written to {}", path.display());
    }
    if let Some(path) = &args.report_html {
        render::write_html(&report, path)?;
        info!("HTML report written to {}", path.display());
    }

    Ok(if report.is_full_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

/// Config file first, then CLI/env overrides field by field.
fn build_config(args: &Args) -> Result<ArrayConfig> {
    let mut config = match &args.config {
        Some(path) => ArrayConfig::from_file(path)?,
        None => ArrayConfig::default(),
    };

    if let Some(endpoint) = &args.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(username) = &args.username {
        config.username = username.clone();
    }
    if let Some(password) = &args.password {
        config.password = password.clone();
    }
    if args.insecure {
        config.accept_invalid_certs = true;
    }

    config.validate()?;
    Ok(config)
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("reqwest=warn".parse().unwrap());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}
