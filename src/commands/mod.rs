pub mod package;
pub mod render;
pub mod validate;
pub mod verify;

use anyhow::Result;
use appcheck::{Outcome, ValidationReport};
use std::path::Path;

use crate::config::PackagingConfig;
use crate::paths;
use crate::ui;

/// Load the build configuration named by `--config`, the environment, or
/// the current directory.
fn load_config(explicit: Option<&Path>) -> Result<PackagingConfig> {
    let path = paths::config_file(explicit);
    log::debug!("Loading {}", path.display());
    PackagingConfig::load(&path)
}

/// One line of a validation summary
#[derive(Debug, PartialEq, Eq)]
enum ReportLine {
    Warning(String),
    Verdict(String),
    Skipped,
}

/// Warnings first, in the order they were raised, then the verdict.
///
/// The validator only traces its warnings at debug level, so this is the
/// one place they reach the user.
fn report_lines(report: &ValidationReport) -> Vec<ReportLine> {
    let mut lines: Vec<ReportLine> = report
        .warnings
        .iter()
        .map(|warning| ReportLine::Warning(warning.to_string()))
        .collect();
    lines.push(match &report.outcome {
        Outcome::Valid { version, family } => ReportLine::Verdict(format!(
            "Configuration valid for Dropwizard {version} ({family})"
        )),
        Outcome::Skipped { .. } => ReportLine::Skipped,
    });
    lines
}

/// Print warnings and the verdict of a validation run.
fn print_report(report: &ValidationReport) {
    for line in report_lines(report) {
        match line {
            ReportLine::Warning(msg) => ui::warn(&msg),
            ReportLine::Verdict(msg) => ui::success(&msg),
            ReportLine::Skipped => ui::dim("Configuration validation skipped"),
        }
    }
}
