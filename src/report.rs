use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::dashboard::Dashboard;
use crate::error::ReportError;
use crate::models::Campaign;

pub fn format_percent(value: f64) -> String {
    format!("{value:.2}%")
}

fn tile_row(output: &mut String, tiles: &[(String, String)]) {
    let _ = writeln!(
        output,
        "| {} |",
        tiles
            .iter()
            .map(|(title, _)| title.as_str())
            .collect::<Vec<_>>()
            .join(" | ")
    );
    let _ = writeln!(output, "|{}", "---|".repeat(tiles.len()));
    let _ = writeln!(
        output,
        "| {} |",
        tiles
            .iter()
            .map(|(_, value)| value.as_str())
            .collect::<Vec<_>>()
            .join(" | ")
    );
    let _ = writeln!(output);
}

fn per_campaign(label: &str, value: impl Fn(Campaign) -> String) -> Vec<(String, String)> {
    Campaign::ALL
        .iter()
        .map(|campaign| (format!("{label} {}", campaign.label()), value(*campaign)))
        .collect()
}

pub fn build_report(dashboard: &Dashboard, generated_at: DateTime<Utc>) -> String {
    let report = &dashboard.report;
    let mut output = String::new();

    let _ = writeln!(output, "# J7 Network Expansion");
    let _ = writeln!(
        output,
        "Generated {} for {} ({} records)",
        generated_at.format("%Y-%m-%d %H:%M UTC"),
        dashboard.selected,
        report.record_count
    );
    let periods: Vec<String> = dashboard.periods.iter().map(ToString::to_string).collect();
    let _ = writeln!(output, "Available periods: {}", periods.join(", "));
    let _ = writeln!(output);

    let _ = writeln!(output, "## How are the emails performing?");
    tile_row(
        &mut output,
        &per_campaign("Emails sent", |c| report.campaign(c).sent.to_string()),
    );
    tile_row(
        &mut output,
        &per_campaign("Open rate", |c| format_percent(report.campaign(c).open_rate)),
    );
    tile_row(
        &mut output,
        &per_campaign("Click rate", |c| format_percent(report.campaign(c).click_rate)),
    );

    tile_row(
        &mut output,
        &[
            ("Outbound".to_string(), report.outbound.to_string()),
            (
                "Opportunities created".to_string(),
                report.opportunities.to_string(),
            ),
        ],
    );

    let _ = writeln!(output, "## How are the goals behaving?");
    tile_row(
        &mut output,
        &[
            ("Total goals".to_string(), report.goals.to_string()),
            ("C2C".to_string(), report.goals_c2c.to_string()),
        ],
    );
    tile_row(
        &mut output,
        &[
            ("Proposal".to_string(), report.goals_c2c_proposal.to_string()),
            (
                "Global conversion rate".to_string(),
                report
                    .global_conversion_rate
                    .map(format_percent)
                    .unwrap_or_else(|| "n/a".to_string()),
            ),
        ],
    );

    output
}

/// Either the full report or a single error line, never both.
pub fn render_outcome(outcome: &Result<Dashboard, ReportError>, generated_at: DateTime<Utc>) -> String {
    match outcome {
        Ok(dashboard) => build_report(dashboard, generated_at),
        Err(err) => format!(
            "Error loading data: {err}. Check that the API configuration is correct and that \
             the Data Extension exists and is accessible.\n"
        ),
    }
}
