//! Terminal output for run reports

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use plancheck_harness::{CaseReport, Outcome, RunReport};

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One line per case plus a summary table
    #[default]
    Text,
    /// The full report as JSON
    Json,
}

/// Print a finished run
pub fn print_report(report: &RunReport, format: OutputFormat) -> serde_json::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => println!("{}", render_text(report)),
    }
    Ok(())
}

/// Human-readable rendering of a run
pub fn render_text(report: &RunReport) -> String {
    let mut out = String::new();

    for suite in &report.suites {
        out.push_str(&format!("\n{}\n", suite.suite.bold()));
        for case in &suite.cases {
            out.push_str(&case_line(case));
            out.push('\n');
        }
    }

    out.push('\n');
    out.push_str(&summary_table(report).to_string());
    out.push('\n');

    let totals = format!(
        "{} passed, {} failed, {} errored, {} skipped in {} ms (run {})",
        report.passed, report.failed, report.errored, report.skipped, report.duration_ms, report.run_id
    );
    if report.success() {
        out.push_str(&format!("✅ {}", totals.green()));
    } else {
        out.push_str(&format!("❌ {}", totals.red()));
    }
    out
}

/// One report line for a case, followed by its message and notes
pub fn case_line(case: &CaseReport) -> String {
    let mut line = match &case.outcome {
        Outcome::Passed => format!("  {} {} ({} ms)", "✓".green(), case.name, case.duration_ms),
        Outcome::Failed { .. } => format!("  {} {} ({} ms)", "✗".red(), case.name.red(), case.duration_ms),
        Outcome::Errored { .. } => format!("  {} {} ({} ms)", "!".yellow(), case.name.yellow(), case.duration_ms),
        Outcome::Skipped { reason } => format!("  {} {} (skipped: {})", "-".dimmed(), case.name.dimmed(), reason),
    };

    if matches!(case.outcome, Outcome::Failed { .. } | Outcome::Errored { .. }) {
        if let Some(message) = &case.message {
            for detail in message.lines() {
                line.push_str(&format!("\n      {detail}"));
            }
        }
    }
    for note in &case.notes {
        line.push_str(&format!("\n      {} {}", "note:".yellow(), note));
    }
    line
}

fn summary_table(report: &RunReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Suite", "Passed", "Failed", "Errored", "Skipped", "Duration"]);

    for suite in &report.suites {
        table.add_row(vec![
            Cell::new(&suite.suite),
            Cell::new(suite.passed),
            Cell::new(suite.failed),
            Cell::new(suite.errored),
            Cell::new(suite.skipped),
            Cell::new(format!("{} ms", suite.duration_ms)),
        ]);
    }
    table
}
