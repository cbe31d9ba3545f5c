//! Output formatting for CLI

use clap::ValueEnum;
use critik_e2e::RunReport;

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Check lines and summary only
    #[default]
    Text,
    /// Check lines and summary, then the run report as JSON
    Json,
}

/// Print whatever the format adds after the console report
pub fn print_report(report: &RunReport, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {}
        OutputFormat::Json => println!("{}", report.to_json()?),
    }
    Ok(())
}

/// Process exit code for a finished run
pub fn exit_code(report: &RunReport) -> i32 {
    if report.success() {
        0
    } else {
        1
    }
}
