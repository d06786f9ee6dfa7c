use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use batch_core::{format_duration, BatchReport, BatchRun, ItemProgress, WorkItem};
use batch_engine::{run_async, MetadataFetcher, RejectListStore, StoryRequest};
use batch_logging::{batch_info, batch_warn};
use chrono::{DateTime, Local};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::rejects;
use crate::settings::AppSettings;

#[derive(Debug, Serialize)]
struct CheckReport {
    generated_at: String,
    state: String,
    total: usize,
    processed: usize,
    skipped: usize,
    errors: usize,
    elapsed_secs: f64,
    items: Vec<ReportItem>,
}

#[derive(Debug, Serialize)]
struct ReportItem {
    url: String,
    good: bool,
    status: Option<String>,
    comment: String,
    title: Option<String>,
    final_url: Option<String>,
}

/// Fetches metadata for every URL in `urls_file`. Ctrl-C stops the run
/// after the item in flight.
pub async fn run(
    urls_file: &Path,
    report_path: Option<&Path>,
    settings: &AppSettings,
    store: &RejectListStore,
) -> Result<()> {
    let text = fs::read_to_string(urls_file)
        .with_context(|| format!("reading {}", urls_file.display()))?;
    let items: Vec<_> = read_urls(&text)
        .into_iter()
        .map(|url| WorkItem::new(StoryRequest::new(url)))
        .collect();

    let fetcher = MetadataFetcher::new(settings.fetch(), rejects::load(store)?)?;
    let run = BatchRun::new(items.len(), settings.runner());

    let cancel = run.cancel_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            batch_info!("Interrupted, stopping after the current item");
            cancel.cancel();
        }
    });

    let bar = progress_bar(items.len());
    let sink = {
        let bar = bar.clone();
        move |progress: &ItemProgress| {
            bar.set_position(progress.processed as u64);
            bar.set_message(progress.label());
        }
    };
    let report = run_async(items, &fetcher, run, &sink).await;
    interrupt.abort();
    bar.finish_and_clear();

    for line in summary_lines(&report) {
        println!("{line}");
    }

    if let Some(path) = report_path {
        let json = serde_json::to_string_pretty(&build_report(&report, Local::now()))?;
        fs::write(path, json).with_context(|| format!("writing report {}", path.display()))?;
        batch_info!("Wrote report to {:?}", path);
    }
    Ok(())
}

/// Non-blank lines that are not `#` comments.
fn read_urls(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn progress_bar(total: usize) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:30} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

fn summary_lines(report: &BatchReport<StoryRequest>) -> Vec<String> {
    let mut lines = Vec::new();
    for item in report.items.iter().filter(|item| item.show_error) {
        lines.push(format!(
            "{}: {} - {}",
            item.data.url,
            item.status.as_deref().unwrap_or_default(),
            item.comment
        ));
    }
    let total = report.items.len();
    let mut summary = format!(
        "{} / {} processed, {} skipped, {} failed in {}",
        report.processed(),
        total,
        report.skipped_count(),
        report.error_count(),
        format_duration(report.elapsed)
    );
    if report.is_cancelled() {
        batch_warn!("Run cancelled after {} of {} items", report.processed(), total);
        summary.push_str(" (cancelled)");
    }
    lines.push(summary);
    lines
}

fn build_report(report: &BatchReport<StoryRequest>, generated_at: DateTime<Local>) -> CheckReport {
    CheckReport {
        generated_at: generated_at.to_rfc3339(),
        state: format!("{:?}", report.state).to_lowercase(),
        total: report.items.len(),
        processed: report.processed(),
        skipped: report.skipped_count(),
        errors: report.error_count(),
        elapsed_secs: report.elapsed.as_secs_f64(),
        items: report
            .items
            .iter()
            .map(|item| ReportItem {
                url: item.data.url.clone(),
                good: item.good,
                status: item.status.clone(),
                comment: item.comment.clone(),
                title: item.data.title.clone(),
                final_url: item.data.final_url.clone(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batch_core::{ItemOutcome, RunState};
    use pretty_assertions::assert_eq;

    fn report(state: RunState) -> BatchReport<StoryRequest> {
        let mut fetched = WorkItem::new(StoryRequest {
            title: Some("Story".to_string()),
            ..StoryRequest::new("https://example.com/s/1")
        });
        fetched.mark_good("Fetched");
        let mut failed = WorkItem::new(StoryRequest::new("https://example.com/s/2"));
        failed.status = Some("Error".to_string());
        failed.comment = "http status 404: 404 Not Found".to_string();
        failed.show_error = true;
        BatchReport {
            items: vec![
                fetched,
                failed,
                WorkItem::new(StoryRequest::new("https://example.com/s/3")),
            ],
            state,
            outcomes: vec![
                ItemOutcome::Success,
                ItemOutcome::Error {
                    message: "http status 404: 404 Not Found".to_string(),
                },
            ],
            elapsed: Duration::from_secs(90),
        }
    }

    #[test]
    fn url_file_skips_blanks_and_comments() {
        let text = "# wishlist\nhttps://example.com/s/1\n\n   \n  example.com/s/2  \n";
        assert_eq!(
            read_urls(text),
            vec!["https://example.com/s/1", "example.com/s/2"]
        );
    }

    #[test]
    fn summary_lists_failures_then_totals() {
        assert_eq!(
            summary_lines(&report(RunState::Cancelled)),
            vec![
                "https://example.com/s/2: Error - http status 404: 404 Not Found",
                "2 / 3 processed, 0 skipped, 1 failed in 1 minute, 30 seconds (cancelled)",
            ]
        );
    }

    #[test]
    fn report_covers_unprocessed_items() {
        let built = build_report(&report(RunState::Cancelled), Local::now());
        assert_eq!(built.state, "cancelled");
        assert_eq!((built.total, built.processed, built.errors), (3, 2, 1));
        assert_eq!(built.items[0].title.as_deref(), Some("Story"));
        assert_eq!(built.items[2].status, None);
        assert!(DateTime::parse_from_rfc3339(&built.generated_at).is_ok());
    }

    #[tokio::test]
    async fn invalid_urls_are_reported_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let urls = dir.path().join("urls.txt");
        fs::write(&urls, "not a url\nftp://example.com/x\n").unwrap();
        let report_path = dir.path().join("report.json");
        let store = RejectListStore::new(dir.path().join("rejects.txt"));

        run(&urls, Some(&report_path), &AppSettings::default(), &store)
            .await
            .unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(json["state"], "completed");
        assert_eq!(json["errors"], 2);
        assert_eq!(json["items"][1]["status"], "Error");
    }
}
