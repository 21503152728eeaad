use anyhow::{Context, Result};
use log::info;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::pipeline::{Analysis, SummaryStats, ACTIVE_CPS, BUSY_CPS};

pub const DEFAULT_REPORT_NAME: &str = "cps_report";
pub const DEFAULT_CEILING: f64 = 25.0;

/// Everything reported about one analyzed recording.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub name: String,
    pub duration: f64,
    pub sample_rate: u32,
    pub analysis: Analysis,
}

/// A recording that was skipped, with the reason.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub file: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
struct SeriesRow {
    time: f64,
    cps: f64,
    cps_display: f64,
}

#[derive(Debug, Clone, Serialize)]
struct FileDocument<'a> {
    file: &'a str,
    duration_seconds: f64,
    sample_rate: u32,
    stats: Option<SummaryStats>,
    series: Vec<SeriesRow>,
}

#[derive(Debug, Clone, Serialize)]
struct ReportDocument<'a> {
    display_ceiling: f64,
    files: Vec<FileDocument<'a>>,
    failures: &'a [FileFailure],
}

/// Text summary of one file.
pub fn render_summary(report: &FileReport) -> String {
    let mut out = String::new();
    let name = &report.name;
    let _ = writeln!(out, "===== Processing: {} =====", name);
    let _ = writeln!(out, "Audio File: {}", name);
    let _ = writeln!(out, "Duration: {:.2} seconds", report.duration);
    let _ = writeln!(out, "Sampling Rate: {} Hz", report.sample_rate);
    let _ = writeln!(out, "CPS Statistics:");
    match &report.analysis.stats {
        Some(s) => {
            let _ = writeln!(out, "Average CPS: {:.2}", s.mean);
            let _ = writeln!(out, "Maximum CPS: {:.2}", s.max);
            let _ = writeln!(out, "Minimum CPS: {:.2}", s.min);
            let _ = writeln!(out, "Frames with CPS >= {}: {}", ACTIVE_CPS, s.count_ge_5);
            let _ = writeln!(out, "Frames with CPS >= {}: {}", BUSY_CPS, s.count_ge_10);
        }
        None => {
            let _ = writeln!(out, "Average CPS: undefined");
            let _ = writeln!(out, "Maximum CPS: undefined");
            let _ = writeln!(out, "Minimum CPS: undefined");
            let _ = writeln!(out, "Frames with CPS >= {}: undefined", ACTIVE_CPS);
            let _ = writeln!(out, "Frames with CPS >= {}: undefined", BUSY_CPS);
        }
    }
    out
}

/// Text report of a whole batch: one summary block per file, then the skipped files.
pub fn render_text(reports: &[FileReport], failures: &[FileFailure]) -> String {
    let mut out = String::new();
    for report in reports {
        out.push('\n');
        out.push_str(&render_summary(report));
    }
    if !failures.is_empty() {
        out.push_str("\nSkipped files:\n");
        for f in failures {
            let _ = writeln!(out, "{}: {}", f.file, f.error);
        }
    }
    out
}

/// JSON report for a chart renderer. `cps_display` is the rate clipped to
/// `[0, ceiling]`; statistics always come from the unclipped series.
pub fn render_json(reports: &[FileReport], failures: &[FileFailure], ceiling: f64) -> Result<String> {
    let files = reports
        .iter()
        .map(|r| FileDocument {
            file: &r.name,
            duration_seconds: r.duration,
            sample_rate: r.sample_rate,
            stats: r.analysis.stats,
            series: r
                .analysis
                .smoothed
                .points()
                .iter()
                .map(|p| SeriesRow { time: p.time, cps: p.rate, cps_display: p.rate.clamp(0.0, ceiling) })
                .collect(),
        })
        .collect();

    let doc = ReportDocument { display_ceiling: ceiling, files, failures };
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Writes `<name>.txt` and `<name>.json` into `dir`, returning both paths.
pub fn write_reports(
    dir: &Path,
    name: &str,
    reports: &[FileReport],
    failures: &[FileFailure],
    ceiling: f64,
) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create report directory {}", dir.display()))?;

    let text_path = dir.join(format!("{}.txt", name));
    std::fs::write(&text_path, render_text(reports, failures))
        .with_context(|| format!("Failed to write {}", text_path.display()))?;

    let json_path = dir.join(format!("{}.json", name));
    std::fs::write(&json_path, render_json(reports, failures, ceiling)?)
        .with_context(|| format!("Failed to write {}", json_path.display()))?;

    info!("Results saved to {} and {}", text_path.display(), json_path.display());
    Ok((text_path, json_path))
}
