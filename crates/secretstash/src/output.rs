//! Terminal output utilities
//!
//! Status lines go to stdout except errors and warnings. Commands that
//! write a document to stdout must stay quiet here.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use secretstash_backup::{RestoreAction, RestoreReport};
use std::time::Duration;
use tabled::{settings::Style, Table, Tabled};

pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

pub fn warning(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), msg);
}

pub fn info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

pub fn header(msg: &str) {
    println!("\n{}", style(msg).bold().underlined());
}

pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}

/// Spinner on stderr, cleared by the caller when the step finishes
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let template = ProgressStyle::with_template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(template.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn dry_run_notice() {
    warning("DRY RUN - nothing will be written (pass --dry-run false to write)");
}

#[derive(Debug, PartialEq, Tabled)]
struct OutcomeRow {
    source: String,
    target: String,
    action: String,
}

fn outcome_rows(report: &RestoreReport) -> Vec<OutcomeRow> {
    report
        .outcomes
        .iter()
        .map(|o| OutcomeRow {
            source: o.source.clone(),
            target: o.target.clone().unwrap_or_else(|| "-".to_string()),
            action: match o.action {
                RestoreAction::Written { attempts } if attempts > 1 => {
                    format!("{} ({} attempts)", o.action, attempts)
                }
                _ => o.action.to_string(),
            },
        })
        .collect()
}

/// Per-entry table followed by a one-line summary
pub fn restore_report(report: &RestoreReport, kind: &str) {
    if report.outcomes.is_empty() {
        info(&format!("The backup holds no {}s", kind));
        return;
    }

    let mut table = Table::new(outcome_rows(report));
    table.with(Style::sharp());
    println!("\n{}", table);

    if report.dry_run {
        info(&format!(
            "{} would be written, {} skipped",
            report.would_write(),
            report.skipped()
        ));
    } else {
        success(&format!(
            "{} written, {} skipped",
            report.written(),
            report.skipped()
        ));
    }
}
