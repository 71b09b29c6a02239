use crate::jira::JiraTicket;
use crate::models::{CommitsReport, ContributionsReport, TicketsReport};
use chrono::Datelike;
use std::fmt::Write;

pub fn commits_text(report: &CommitsReport, date_label: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Commits by {} in {} on {} (all branches)",
        report.author, report.repo, date_label
    );

    if report.commits.is_empty() {
        out.push_str("- no commits found\n");
    }
    for commit in &report.commits {
        let _ = writeln!(out, "- {} {}", commit.sha, commit.message);
        for file in commit.files_changed.iter().flatten() {
            let _ = writeln!(out, "    {}", file);
        }
    }

    if report.failed_requests > 0 {
        let _ = writeln!(
            out,
            "({} GitHub request(s) failed; results may be incomplete)",
            report.failed_requests
        );
    }

    if let Some(tickets) = &report.tickets {
        out.push_str("\nIn progress:\n");
        ticket_lines(&mut out, tickets);
    }
    out
}

pub fn tickets_text(report: &TicketsReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "In-progress tickets in {} assigned to {}",
        report.project, report.assignee
    );
    ticket_lines(&mut out, &report.tickets);
    out
}

fn ticket_lines(out: &mut String, tickets: &[JiraTicket]) {
    if tickets.is_empty() {
        out.push_str("- no tickets in progress\n");
    }
    for ticket in tickets {
        let _ = write!(out, "- {} [{}] {}", ticket.key, ticket.kind, ticket.summary);
        if let Some(priority) = &ticket.priority {
            let _ = write!(out, " ({})", priority);
        }
        out.push('\n');
    }
}

const SHADES: [char; 5] = ['.', '░', '▒', '▓', '█'];

fn shade(count: u32, max: u32) -> char {
    if count == 0 || max == 0 {
        return SHADES[0];
    }
    let level = ((count as f64 / max as f64) * 4.0).ceil() as usize;
    SHADES[level.clamp(1, 4)]
}

/// Weekday rows by week columns, GitHub style. The first column is padded so
/// rows line up on Monday.
pub fn contributions_text(report: &ContributionsReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} commits by {} in {} over the last {} week(s)",
        report.total_commits, report.author, report.repo, report.weeks
    );

    let Some(first) = report.contributions.first() else {
        return out;
    };
    let max = report.contributions.iter().map(|d| d.count).max().unwrap_or(0);
    let offset = first.date.weekday().num_days_from_monday() as usize;

    let mut rows: [String; 7] = Default::default();
    for row in rows.iter_mut().take(offset) {
        row.push(' ');
    }
    for (i, day) in report.contributions.iter().enumerate() {
        rows[(i + offset) % 7].push(shade(day.count, max));
    }

    for (label, row) in ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"].iter().zip(rows) {
        let _ = writeln!(out, "{} {}", label, row);
    }

    if report.failed_requests > 0 {
        let _ = writeln!(
            out,
            "({} GitHub request(s) failed; counts may be incomplete)",
            report.failed_requests
        );
    }
    out
}
