//! Plain-text views. Every function returns the text instead of printing so
//! the layouts can be checked without a terminal.

use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use std::fmt::Write;
use support_core::analysis::AnalysisReport;
use support_core::display::{time_ago, truncate};
use support_core::model::{CategoryDistribution, PriorityDistribution, TicketStats};
use support_core::{AgentStatus, References, Ticket, TicketPriority, TicketStatus};

const SUBJECT_WIDTH: usize = 44;
const BAR_WIDTH: usize = 24;

pub fn priority_badge(priority: TicketPriority) -> String {
    let label = format!("{:<6}", priority.label());
    match priority {
        TicketPriority::High => label.red().to_string(),
        TicketPriority::Medium => label.yellow().to_string(),
        TicketPriority::Low => label.green().to_string(),
    }
}

pub fn status_badge(status: TicketStatus) -> String {
    let label = format!("{:<11}", status.label());
    match status {
        TicketStatus::Open => label.blue().to_string(),
        TicketStatus::InProgress => label.yellow().to_string(),
        TicketStatus::Resolved => label.green().to_string(),
        TicketStatus::Closed => label.dimmed().to_string(),
    }
}

pub fn status_line(agent: &AgentStatus, now: DateTime<Utc>) -> String {
    let mut line = if agent.connected {
        format!("{} AI agent connected", "●".green())
    } else {
        format!("{} AI agent disconnected", "●".red())
    };
    let _ = write!(line, " | model {}", agent.model);
    if let Some(ms) = agent.response_time {
        let _ = write!(line, " | {ms} ms");
    }
    if let Some(error) = agent.error.as_deref() {
        let _ = write!(line, " | {}", error.yellow());
    }
    let _ = write!(line, " | checked {}", time_ago(agent.last_checked, now));
    line
}

pub fn ticket_table(tickets: &[&Ticket], now: DateTime<Utc>) -> String {
    if tickets.is_empty() {
        return "No tickets found".to_string();
    }
    let mut out = format!(
        "{:<10} {:<6} {:<11} {:<10} {:<w$} {:<18} {}\n",
        "ID",
        "PRIO",
        "STATUS",
        "CATEGORY",
        "SUBJECT",
        "CUSTOMER",
        "CREATED",
        w = SUBJECT_WIDTH + 3
    );
    for ticket in tickets {
        let _ = writeln!(
            out,
            "{:<10} {} {} {:<10} {:<w$} {:<18} {}",
            ticket.id,
            priority_badge(ticket.priority),
            status_badge(ticket.status),
            ticket.category.label(),
            truncate(&ticket.subject, SUBJECT_WIDTH),
            truncate(&ticket.customer_name, 15),
            time_ago(ticket.created_at, now),
            w = SUBJECT_WIDTH + 3
        );
    }
    let _ = write!(out, "{} ticket(s)", tickets.len());
    out
}

pub fn ticket_detail(ticket: &Ticket, now: DateTime<Utc>) -> String {
    let mut out = format!("#{} {}\n", ticket.id, ticket.subject.bold());
    let _ = writeln!(
        out,
        "{} {} {}",
        priority_badge(ticket.priority),
        status_badge(ticket.status),
        ticket.category.label()
    );
    let _ = writeln!(out, "customer   {}", ticket.customer_name);
    let _ = writeln!(out, "created    {}", time_ago(ticket.created_at, now));
    let _ = writeln!(out, "updated    {}", time_ago(ticket.updated_at, now));
    if let Some(agent) = ticket.assigned_to.as_deref() {
        let _ = writeln!(out, "assigned   {agent}");
    }
    if let Some(score) = ticket.satisfaction_score {
        let _ = writeln!(out, "rating     {score}/5");
    }
    let _ = write!(out, "\n{}", ticket.description);
    if let Some(resolution) = ticket.resolution.as_deref().filter(|r| !r.is_empty()) {
        let _ = write!(out, "\n\nresolution: {resolution}");
    }
    out
}

pub fn stats_panel(stats: &TicketStats) -> String {
    format!(
        "total {}  open {}  in progress {}  resolved {}  closed {}\navg resolution {}",
        stats.total.bold(),
        stats.open,
        stats.in_progress,
        stats.resolved,
        stats.closed,
        stats.average_resolution_time
    )
}

/// Error state shown in place of the dashboard panels.
pub fn dashboard_unavailable(
    agent: &AgentStatus,
    error: &dyn std::fmt::Display,
    now: DateTime<Utc>,
) -> String {
    format!(
        "{}\n\n{}\n  {error}",
        status_line(agent, now),
        "Tickets unavailable".red().bold()
    )
}

fn bar_chart(title: &str, rows: &[(&str, usize)]) -> String {
    let mut out = format!("{}\n", title.bold());
    let max = rows.iter().map(|(_, n)| *n).max().unwrap_or(0);
    if max == 0 {
        out.push_str("  (no tickets)");
        return out;
    }
    for (label, count) in rows {
        let width = (count * BAR_WIDTH).div_ceil(max);
        let _ = writeln!(out, "  {label:<10} {} {count}", "█".repeat(width).cyan());
    }
    out.truncate(out.trim_end().len());
    out
}

pub fn category_chart(dist: &[CategoryDistribution]) -> String {
    let rows: Vec<(&str, usize)> = dist.iter().map(|d| (d.category.label(), d.count)).collect();
    bar_chart("By category", &rows)
}

pub fn priority_chart(dist: &[PriorityDistribution]) -> String {
    let rows: Vec<(&str, usize)> = dist.iter().map(|d| (d.priority.label(), d.count)).collect();
    bar_chart("By priority", &rows)
}

fn references(refs: &References) -> String {
    match refs {
        References::Derived(ids) if !ids.is_empty() => ids.join(", "),
        _ => "not available".dimmed().to_string(),
    }
}

pub fn analysis_report(report: &AnalysisReport) -> String {
    let analysis = &report.analysis;
    let solution = &report.solution;
    let mut out = format!("{}\n", "Analysis".bold());
    let _ = writeln!(out, "  sentiment    {:.0}%", analysis.sentiment_score * 100.0);
    let _ = writeln!(out, "  estimate     {}", analysis.estimated_time);
    let _ = writeln!(out, "  expertise    {}", analysis.required_expertise.join(", "));
    if !analysis.keywords.is_empty() {
        let _ = writeln!(out, "  keywords     {}", analysis.keywords.join(", "));
    }
    let _ = writeln!(out, "  similar      {}", references(&analysis.similar_tickets));

    let _ = writeln!(out, "\n{}", "Solution".bold());
    for (i, action) in solution.recommended_actions.iter().enumerate() {
        let _ = writeln!(out, "  {}. {action}", i + 1);
    }
    let _ = writeln!(out, "  response     {}", solution.suggested_response);
    let _ = writeln!(out, "  knowledge    {}", references(&solution.related_knowledge_base));
    let _ = write!(out, "  confidence   {:.0}%", solution.confidence * 100.0);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use support_core::model::{TicketAnalysis, TicketSolution};
    use support_core::{TicketCategory, TicketPriority};

    fn ticket(id: &str) -> Ticket {
        let now = Utc::now();
        Ticket {
            id: id.into(),
            customer_name: "Diana Evans".into(),
            category: TicketCategory::Technical,
            priority: TicketPriority::High,
            status: TicketStatus::Open,
            subject: "Device Compatibility Error on every launch of the Android application".into(),
            description: "The app crashes immediately after launching.".into(),
            created_at: now - Duration::minutes(5),
            updated_at: now - Duration::minutes(5),
            assigned_to: None,
            resolution: None,
            satisfaction_score: None,
        }
    }

    #[test]
    fn empty_table_says_so() {
        assert_eq!(ticket_table(&[], Utc::now()), "No tickets found");
    }

    #[test]
    fn table_truncates_long_subjects() {
        let t = ticket("T008");
        let table = ticket_table(&[&t], Utc::now());
        assert!(table.contains("T008"));
        assert!(table.contains("Device Compatibility Error on every launch o..."));
        assert!(!table.contains("Android"));
        assert!(table.contains("5 minutes ago"));
        assert!(table.ends_with("1 ticket(s)"));
    }

    #[test]
    fn disconnected_status_shows_error() {
        let now = Utc::now();
        let agent = AgentStatus {
            error: Some("connection refused".into()),
            ..AgentStatus::unknown("llama3:8b", now)
        };
        let line = status_line(&agent, now);
        assert!(line.contains("AI agent disconnected"));
        assert!(line.contains("model llama3:8b"));
        assert!(line.contains("connection refused"));
        assert!(line.contains("checked 0 seconds ago"));
    }

    #[test]
    fn unavailable_references_are_labelled() {
        let report = AnalysisReport {
            analysis: TicketAnalysis {
                sentiment_score: 0.2,
                estimated_time: "45 minutes".into(),
                required_expertise: vec!["Billing".into()],
                keywords: vec![],
                similar_tickets: References::Unavailable,
            },
            solution: TicketSolution {
                recommended_actions: vec!["Verify the gateway".into()],
                suggested_response: "We are on it.".into(),
                related_knowledge_base: References::Derived(vec!["KB002".into()]),
                confidence: 0.75,
            },
        };
        let text = analysis_report(&report);
        assert!(text.contains("sentiment    20%"));
        assert!(text.contains("not available"));
        assert!(text.contains("1. Verify the gateway"));
        assert!(text.contains("KB002"));
        assert!(text.contains("confidence   75%"));
    }

    #[test]
    fn charts_scale_to_largest_bucket() {
        let dist = vec![
            CategoryDistribution { category: TicketCategory::Billing, count: 4 },
            CategoryDistribution { category: TicketCategory::Feature, count: 1 },
        ];
        let chart = category_chart(&dist);
        assert!(chart.contains(&"█".repeat(BAR_WIDTH)));
        assert!(chart.contains("Feature"));
        assert_eq!(priority_chart(&[]), format!("{}\n  (no tickets)", "By priority".bold()));
    }
}
