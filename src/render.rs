//! Report rendering
//!
//! Pure views over the batch report: a console summary, a joined CSV (one
//! row per request with verdict and outcome columns), and a single-file HTML
//! document. Nothing here feeds back into the pipeline.

use crate::error::{Error, Result};
use crate::orchestrator::provisioner::OutcomeStatus;
use crate::orchestrator::report::BatchReport;
use std::path::Path;

// =============================================================================
// Console Summary
// =============================================================================

/// Human-readable run summary with per-item lines.
pub fn render_summary(report: &BatchReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Batch provisioning report ({})\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!(
        "  requested: {}  success: {}  partial: {}  failed: {}  skipped: {}\n",
        report.total_requested, report.succeeded, report.partial, report.failed, report.skipped
    ));
    out.push_str(&format!(
        "  success rate: {:.1}%\n\n",
        report.success_rate_percent
    ));

    for (i, outcome) in report.outcomes.iter().enumerate() {
        out.push_str(&format!(
            "  [{}] {:<24} {:<18} {}\n",
            i + 1,
            outcome.request_name,
            outcome.status.to_string(),
            outcome.message
        ));
        if let Some(verdict) = report.verdicts.get(i) {
            for warning in &verdict.warnings {
                out.push_str(&format!("      warning: {}\n", warning));
            }
        }
        for (consumer, reason) in &outcome.failed_consumers {
            out.push_str(&format!("      attach failed: {}: {}\n", consumer, reason));
        }
    }

    out
}

// =============================================================================
// CSV Report
// =============================================================================

/// Write the joined view: one row per request carrying both the verdict and
/// the outcome.
pub fn write_csv(report: &BatchReport, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path).map_err(|e| {
        Error::Configuration(format!("cannot write report {}: {}", path.display(), e))
    })?;

    writer.write_record([
        "name",
        "status",
        "resource_id",
        "wwn",
        "attached",
        "failed_attachments",
        "errors",
        "warnings",
        "message",
        "duration_ms",
        "timestamp",
    ])?;

    for (i, outcome) in report.outcomes.iter().enumerate() {
        let verdict = report.verdicts.get(i);
        let failed: Vec<String> = outcome
            .failed_consumers
            .iter()
            .map(|(consumer, reason)| format!("{}: {}", consumer, reason))
            .collect();

        writer.write_record([
            outcome.request_name.as_str(),
            &outcome.status.to_string(),
            outcome.resource_id.as_deref().unwrap_or(""),
            outcome.wwn.as_deref().unwrap_or(""),
            &outcome.attached_consumers.join("; "),
            &failed.join("; "),
            &verdict.map(|v| v.errors.join("; ")).unwrap_or_default(),
            &verdict.map(|v| v.warnings.join("; ")).unwrap_or_default(),
            outcome.message.as_str(),
            &outcome.duration_millis.to_string(),
            &outcome.timestamp.to_rfc3339(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

// =============================================================================
// HTML Report
// =============================================================================

/// Write a self-contained styled HTML report.
pub fn write_html(report: &BatchReport, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut rows = String::new();

    for (i, outcome) in report.outcomes.iter().enumerate() {
        let verdict = report.verdicts.get(i);
        let class = match outcome.status {
            OutcomeStatus::Success => "ok",
            OutcomeStatus::PartialSuccess => "partial",
            _ => "bad",
        };
        let notes: Vec<String> = verdict
            .map(|v| {
                v.errors
                    .iter()
                    .chain(v.warnings.iter())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        rows.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
             <td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            class,
            i + 1,
            escape(&outcome.request_name),
            outcome.status,
            escape(outcome.resource_id.as_deref().unwrap_or("-")),
            escape(&outcome.attached_consumers.join(", ")),
            escape(&outcome.message),
            escape(&notes.join("; ")),
            outcome.duration_millis,
        ));
    }

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Batch provisioning report</title>
<style>
  body {{ font-family: -apple-system, "Segoe UI", sans-serif; margin: 2rem; color: #1a1a2e; }}
  h1 {{ font-size: 1.4rem; }}
  .stats {{ margin: 1rem 0; }}
  .stats span {{ display: inline-block; margin-right: 1.5rem; font-weight: 600; }}
  table {{ border-collapse: collapse; width: 100%; }}
  th, td {{ text-align: left; padding: 0.4rem 0.7rem; border-bottom: 1px solid #ddd; font-size: 0.9rem; }}
  th {{ background: #16213e; color: #fff; }}
  tr.ok td:nth-child(3) {{ color: #0a7d33; font-weight: 600; }}
  tr.partial td:nth-child(3) {{ color: #b96a00; font-weight: 600; }}
  tr.bad td:nth-child(3) {{ color: #b00020; font-weight: 600; }}
</style>
</head>
<body>
<h1>Batch provisioning report</h1>
<p>Generated {generated}</p>
<div class="stats">
  <span>requested: {total}</span>
  <span>success: {succeeded}</span>
  <span>partial: {partial}</span>
  <span>failed: {failed}</span>
  <span>skipped: {skipped}</span>
  <span>success rate: {rate:.1}%</span>
</div>
<table>
<thead><tr><th>#</th><th>name</th><th>status</th><th>resource id</th>
<th>attached</th><th>message</th><th>notes</th><th>ms</th></tr></thead>
<tbody>
{rows}</tbody>
</table>
</body>
</html>
"#,
        generated = report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        total = report.total_requested,
        succeeded = report.succeeded,
        partial = report.partial,
        failed = report.failed,
        skipped = report.skipped,
        rate = report.success_rate_percent,
        rows = rows,
    );

    std::fs::write(path, html)?;
    Ok(())
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::provisioner::{OutcomeStatus, ProvisionOutcome};
    use crate::orchestrator::report::aggregate;
    use chrono::Utc;

    fn sample_report() -> BatchReport {
        let outcomes = vec![
            ProvisionOutcome {
                request_name: "vol-01".into(),
                status: OutcomeStatus::Success,
                resource_id: Some("v-100".into()),
                wwn: Some("naa.68ccf098003f0009".into()),
                attached_consumers: vec!["esx-01".into()],
                failed_consumers: Vec::new(),
                message: "created as v-100, attached 1 consumer(s)".into(),
                duration_millis: 412,
                timestamp: Utc::now(),
            },
            ProvisionOutcome {
                request_name: "vol-02".into(),
                status: OutcomeStatus::Failed,
                resource_id: None,
                wwn: None,
                attached_consumers: Vec::new(),
                failed_consumers: Vec::new(),
                message: "Array request failed: create block 'vol-02': no space".into(),
                duration_millis: 98,
                timestamp: Utc::now(),
            },
        ];
        aggregate(outcomes, Vec::new())
    }

    #[test]
    fn test_summary_contains_counts_and_items() {
        let summary = render_summary(&sample_report());

        assert!(summary.contains("requested: 2"));
        assert!(summary.contains("success: 1"));
        assert!(summary.contains("success rate: 50.0%"));
        assert!(summary.contains("vol-01"));
        assert!(summary.contains("no space"));
    }

    #[test]
    fn test_csv_has_one_row_per_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");

        write_csv(&sample_report(), &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<_> = reader.records().collect::<std::result::Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "vol-01");
        assert_eq!(&rows[0][1], "Success");
        assert_eq!(&rows[1][1], "Failed");
    }

    #[test]
    fn test_html_is_complete_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.html");

        write_html(&sample_report(), &path).unwrap();

        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("vol-01"));
        assert!(html.contains("success rate: 50.0%"));
        assert!(html.contains("</html>"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }
}
