//! Markdown report generation
//!
//! Renders a [`SessionSummary`], optionally with live [`ScrapingMetrics`],
//! as a human-readable report.

use crate::output::metrics::ScrapingMetrics;
use crate::output::summary::SessionSummary;
use crate::output::OutputResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Failed URLs listed before the report truncates
const MAX_LISTED_FAILURES: usize = 20;

/// Domains listed in the metrics section
const MAX_LISTED_DOMAINS: usize = 10;

/// Writes a markdown report to `output_path`
///
/// # Arguments
///
/// * `summary` - The session summary
/// * `metrics` - Metrics collected while scraping, if any
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(OutputError)` - Failed to write the report
pub fn write_markdown_report(
    summary: &SessionSummary,
    metrics: Option<&ScrapingMetrics>,
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_markdown_report(summary, metrics);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a session summary as markdown
pub fn format_markdown_report(summary: &SessionSummary, metrics: Option<&ScrapingMetrics>) -> String {
    let mut md = String::new();

    md.push_str("# Trawler Scrape Report\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", summary.started_at.to_rfc3339()));
    if let Some(finished) = &summary.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
    }
    if let Some(duration) = summary.duration_seconds {
        md.push_str(&format!("- **Duration**: {:.2} seconds\n", duration));
    }
    md.push_str(&format!("- **State**: {:?}\n\n", summary.state));

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Total URLs**: {}\n", summary.urls_total));
    md.push_str(&format!("- **Succeeded**: {}\n", summary.urls_succeeded));
    md.push_str(&format!("- **Failed**: {}\n", summary.urls_failed));
    md.push_str(&format!("- **Records**: {}\n", summary.records));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n",
        summary.success_rate()
    ));
    md.push_str(&format!("- **Error Rate**: {:.2}%\n\n", summary.error_rate()));

    // Error summary
    if !summary.errors_by_kind.is_empty() {
        md.push_str("## Error Summary\n\n");
        md.push_str("| Error Kind | Count |\n");
        md.push_str("|------------|-------|\n");

        let mut kinds: Vec<_> = summary.errors_by_kind.iter().collect();
        kinds.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (kind, count) in kinds {
            md.push_str(&format!("| {} | {} |\n", kind, count));
        }
        md.push('\n');
    }

    // Failed URLs
    if !summary.failed_urls.is_empty() {
        md.push_str("## Failed URLs\n\n");
        md.push_str("| URL | Reason |\n");
        md.push_str("|-----|--------|\n");

        for failure in summary.failed_urls.iter().take(MAX_LISTED_FAILURES) {
            md.push_str(&format!("| {} | {} |\n", failure.url, failure.message));
        }
        if summary.failed_urls.len() > MAX_LISTED_FAILURES {
            md.push_str(&format!(
                "\n... and {} more\n",
                summary.failed_urls.len() - MAX_LISTED_FAILURES
            ));
        }
        md.push('\n');
    }

    if let Some(metrics) = metrics {
        md.push_str("## Performance\n\n");
        md.push_str(&format!(
            "- **Bytes Downloaded**: {}\n",
            metrics.total_bytes_downloaded
        ));
        md.push_str(&format!(
            "- **Average Response Time**: {:.3} seconds\n",
            metrics.average_response_time_secs
        ));
        md.push_str(&format!(
            "- **Requests per Second**: {:.2}\n\n",
            metrics.requests_per_second
        ));

        if !metrics.status_codes.is_empty() {
            md.push_str("### Status Codes\n\n");
            md.push_str("| Status | Count |\n");
            md.push_str("|--------|-------|\n");
            for (status, count) in &metrics.status_codes {
                md.push_str(&format!("| {} | {} |\n", status, count));
            }
            md.push('\n');
        }

        if !metrics.domain_stats.is_empty() {
            md.push_str("### Top Domains\n\n");
            let mut domains: Vec<_> = metrics.domain_stats.iter().collect();
            domains.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            for (domain, count) in domains.into_iter().take(MAX_LISTED_DOMAINS) {
                md.push_str(&format!("- {} ({})\n", domain, count));
            }
            md.push('\n');
        }

        if !metrics.alerts.is_empty() {
            md.push_str("## Alerts\n\n");
            for alert in &metrics.alerts {
                md.push_str(&format!("- {}\n", alert));
            }
            md.push('\n');
        }
    }

    md
}
