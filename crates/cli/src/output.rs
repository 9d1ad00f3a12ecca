//! Output formatting for run events

use anyhow::{anyhow, Result};
use std::io::Write;
use std::str::FromStr;
use std::time::Duration;
use loginswarm_common::{ProbeResult, RunEvent, RunSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable progress lines and a final table
    Text,
    /// One wire payload per line
    JsonLines,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" | "t" | "" => Ok(OutputFormat::Text),
            "jsonl" | "json" | "j" => Ok(OutputFormat::JsonLines),
            other => Err(anyhow!("Unknown output format '{}'", other)),
        }
    }
}

/// Print one event as soon as it arrives.
pub fn print_event(event: &RunEvent, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::JsonLines => println!("{}", event.to_json()?),
        OutputFormat::Text => print!("{}", render_text(event)),
    }
    std::io::stdout().flush()?;
    Ok(())
}

fn render_text(event: &RunEvent) -> String {
    match event {
        RunEvent::Start {
            num_logins,
            timestamp,
        } => format!("Starting {} login(s) at {}\n", num_logins, timestamp),
        RunEvent::Progress { result } => format!("{}\n", render_progress(result)),
        RunEvent::Complete(summary) => render_summary(summary),
    }
}

fn render_progress(result: &ProbeResult) -> String {
    let mark = if result.is_success() { "✓" } else { "✗" };
    format!(
        "  {} login #{:<4} {:<8} {:>7.2}s  {}",
        mark,
        result.id,
        result.status,
        result.elapsed_seconds,
        result.message
    )
}

/// Results table (already sorted by id) followed by the summary block.
fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n{:-<90}\n", ""));
    out.push_str(&format!(
        "{:<6} {:<8} {:<9} {:<24} {:<40}\n",
        "ID", "STATUS", "TIME", "TOKEN", "MESSAGE"
    ));
    out.push_str(&format!("{:-<90}\n", ""));

    for result in &summary.results {
        out.push_str(&format!(
            "{:<6} {:<8} {:<9} {:<24} {:<40}\n",
            result.id,
            result.status,
            format_duration(Duration::from_secs_f64(result.elapsed_seconds)),
            result.token.as_deref().unwrap_or("N/A"),
            truncate(&result.message, 40)
        ));
    }

    out.push_str(&format!("{:-<90}\n", ""));
    out.push_str("\nSummary:\n");
    out.push_str(&format!("  Total logins: {}\n", summary.results.len()));
    out.push_str(&format!("  ✓ Succeeded: {}\n", summary.success_count));
    out.push_str(&format!("  ✗ Failed: {}\n", summary.fail_count));
    out.push_str(&format!("  Success rate: {:.1}%\n", summary.success_rate));
    out.push_str(&format!(
        "  Total time: {}\n",
        format_duration(Duration::from_secs_f64(summary.total_time))
    ));
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max - 3).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}

/// Format duration in a human-readable way
fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs == 0 {
        format!("{}ms", millis)
    } else if total_secs < 60 {
        if millis > 0 {
            format!("{}.{:03}s", total_secs, millis)
        } else {
            format!("{}s", total_secs)
        }
    } else {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        if secs > 0 {
            format!("{}m {}s", mins, secs)
        } else {
            format!("{}m", mins)
        }
    }
}
