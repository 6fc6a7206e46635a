mod catalog;
mod config;
mod report;
mod scheduler;
mod web;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::catalog::{CatalogLoader, LoadedCatalog, PassStatus};
use crate::config::Config;
use crate::report::{ReportFormat, ScheduleReport};
use crate::scheduler::ScheduleEngine;

#[derive(Parser)]
#[command(name = "pass-o-mat")]
#[command(about = "Ground station pass scheduler")]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a pass catalog without scheduling it
    Validate { catalog: PathBuf },
    /// Schedule a pass catalog and write the report
    Run {
        catalog: PathBuf,
        /// Report destination; printed to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Report format; guessed from the output extension when omitted
        #[arg(short, long, value_enum)]
        format: Option<ReportFormat>,
    },
    /// Serve the scheduling API
    Serve,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match cli.command {
        Commands::Validate { catalog } => validate(&catalog),
        Commands::Run {
            catalog,
            output,
            format,
        } => run(&config, &catalog, output.as_deref(), format),
        Commands::Serve => serve(config),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config, ExitCode> {
    let Some(path) = path else {
        log::debug!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    match Config::from_file(path) {
        Ok(config) => {
            for station in &config.stations {
                log::info!(
                    "Known station {} ({})",
                    station.id,
                    station.name.as_deref().unwrap_or("unnamed")
                );
            }
            Ok(config)
        }
        Err(e) => {
            eprintln!("Error loading config {}: {}", path.display(), e);
            Err(ExitCode::FAILURE)
        }
    }
}

fn load_catalog(path: &Path) -> Result<LoadedCatalog, ExitCode> {
    CatalogLoader::new(path.to_path_buf()).load().map_err(|e| {
        eprintln!("Error loading catalog {}: {}", path.display(), e);
        ExitCode::FAILURE
    })
}

fn validate(path: &Path) -> ExitCode {
    let loaded = match load_catalog(path) {
        Ok(l) => l,
        Err(code) => return code,
    };

    println!(
        "{} passes accepted ({} satellites, {} stations)",
        loaded.catalog.len(),
        loaded.catalog.satellites().len(),
        loaded.catalog.stations().len()
    );
    let first = loaded.catalog.iter().map(|p| p.start).min();
    let last = loaded.catalog.iter().map(|p| p.end).max();
    if let (Some(first), Some(last)) = (first, last) {
        println!("  spanning {} to {}", first, last);
    }
    for rejected in &loaded.rejected {
        println!("  record {}: {}", rejected.index, rejected.message);
    }

    if loaded.rejected.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run(
    config: &Config,
    path: &Path,
    output: Option<&Path>,
    format: Option<ReportFormat>,
) -> ExitCode {
    let LoadedCatalog { catalog, rejected } = match load_catalog(path) {
        Ok(l) => l,
        Err(code) => return code,
    };

    let outcome = ScheduleEngine::new(catalog, &config.engine_settings()).run();
    let (scheduled, offloaded, dropped) = (
        outcome.count(PassStatus::Scheduled),
        outcome.count(PassStatus::Offloaded),
        outcome.count(PassStatus::Dropped),
    );
    let report = ScheduleReport::new(outcome, rejected);

    let result = match output {
        Some(out) => {
            let format = format.unwrap_or_else(|| ReportFormat::from_path(out));
            report.save(out, format).map(|()| {
                log::info!("Report {} written to {}", report.run_id, out.display());
            })
        }
        None => report
            .render(format.unwrap_or(ReportFormat::Yaml))
            .map(|text| print!("{}", text)),
    };

    if let Err(e) = result {
        eprintln!("Error writing report: {}", e);
        return ExitCode::FAILURE;
    }

    eprintln!(
        "{} scheduled, {} offloaded, {} dropped, {} rejected",
        scheduled,
        offloaded,
        dropped,
        report.rejected.len()
    );
    ExitCode::SUCCESS
}

fn serve(config: Config) -> ExitCode {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error starting runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(web::run_server(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}
