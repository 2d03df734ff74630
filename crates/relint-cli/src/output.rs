//! Report rendering: human-readable text and machine-readable JSON.

use anyhow::Result;
use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use relint_core::{LintReport, Problem, Severity};

/// Output format selection for the `lint` subcommand.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
#[value(rename_all = "lower")]
pub enum OutputFormat {
    /// Human-readable problem listing.
    Text,
    /// The full report as pretty-printed JSON.
    Json,
}

/// Print a lint report to stdout in the chosen format.
pub fn print_report(report: &LintReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(report)?;
            println!("{json}");
        },
        OutputFormat::Text => print_text(report),
    }
    Ok(())
}

fn print_text(report: &LintReport) {
    for problem in &report.problems {
        println!("{}", render_problem(problem));
    }
    if let Some(problem) = &report.aborted {
        println!("{}", render_problem(problem));
        println!("{}", "check aborted".red().bold());
    }
    let summary = format!(
        "{} problem(s), {} bookmark(s), {} block(s), {} inline(s)",
        report.problems.len() + usize::from(report.aborted.is_some()),
        report.bookmarks.len(),
        report.blocks.len(),
        report.inlines.len(),
    );
    println!("{}", summary.dimmed());
}

fn render_problem(problem: &Problem) -> String {
    let mut out = format!("[{}]", paint_letter(problem.severity));
    if let Some(source) = &problem.source {
        out.push(' ');
        out.push_str(source);
    }
    match problem.line {
        Some(line) => out.push_str(&format!(" L{line}: {}", problem.description)),
        None => out.push_str(&format!(" L?: {}", problem.description)),
    }
    if let Some(context) = &problem.context {
        out.push_str(&format!(" (content: \"{context}\")"));
    }
    out
}

fn paint_letter(severity: Severity) -> ColoredString {
    let letter = severity.letter().to_string();
    match severity {
        Severity::Error | Severity::Critical => letter.red().bold(),
        Severity::Warning => letter.yellow(),
        Severity::Info => letter.cyan(),
        Severity::Debug => letter.dimmed(),
    }
}
