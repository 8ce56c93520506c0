//! check_model - check data model documentation against FITS files from the command line.

use clap::{Parser, ValueEnum};
use datamodel::{CheckOptions, CheckReport, ModelChecker, Severity};
use std::path::PathBuf;
use std::process;
use tracing::Level;

#[derive(Parser)]
#[command(name = "check_model")]
#[command(about = "Check actual data model files against the data model documentation", long_about = None)]
#[command(version)]
struct Cli {
    /// Documentation root, e.g. doc/DESI_SPECTRO_DATA
    #[arg(value_name = "SECTION")]
    section: PathBuf,

    /// Root of the real data files (required with --compare-files)
    #[arg(value_name = "DIRECTORY", required_if_eq("compare_files", "true"))]
    directory: Option<PathBuf>,

    /// Match real files and compare them with the documentation
    #[arg(short = 'F', long)]
    compare_files: bool,

    /// Print extra debugging information
    #[arg(short, long)]
    verbose: bool,

    /// Treat documentation defects as errors
    #[arg(short = 'W', long)]
    warning_is_error: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "human")]
    format: OutputFormat,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable summary
    Human,
    /// JSON report for CI
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = CheckOptions {
        section: cli.section,
        directory: cli.directory.unwrap_or_else(|| PathBuf::from(".")),
        compare_files: cli.compare_files,
        strict: cli.warning_is_error,
    };

    let exit_code = match ModelChecker::run(&options) {
        Ok(report) => {
            output_report(&report, &cli.format);
            if report.failed {
                1
            } else {
                0
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn output_report(report: &CheckReport, format: &OutputFormat) {
    match format {
        OutputFormat::Human => output_human(report),
        OutputFormat::Json => output_json(report),
    }
}

fn output_human(report: &CheckReport) {
    println!("\nSection: {}", report.section.display());
    println!("{}", "─".repeat(60));
    println!("  Documents: {}", report.documents.len());

    if !report.matches.is_empty() {
        let matched = report.matches.iter().filter(|m| m.prototype.is_some()).count();
        println!("  With prototype: {}", matched);
    }

    let critical: Vec<_> = report
        .log
        .iter()
        .filter(|e| matches!(e.severity, Severity::Critical))
        .collect();
    if !critical.is_empty() {
        println!("\n  CRITICAL:");
        for entry in critical {
            println!("    - {}", entry.message);
        }
    }

    println!("\n  Summary:");
    println!("    Critical: {}", report.stats.critical);
    println!("    Warning:  {}", report.stats.warning);
    println!("    Info:     {}", report.stats.info);
    if report.failed {
        println!("\n  Check failed.");
    }
}

fn output_json(report: &CheckReport) {
    match serde_json::to_string_pretty(report) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Error: {}", e),
    }
}
