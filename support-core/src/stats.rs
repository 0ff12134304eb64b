use crate::model::{
    CategoryDistribution, PriorityDistribution, Ticket, TicketCategory, TicketPriority,
    TicketStats, TicketStatus,
};

pub const RECENT_TICKET_LIMIT: usize = 5;

pub fn ticket_stats(tickets: &[Ticket]) -> TicketStats {
    let count = |status: TicketStatus| tickets.iter().filter(|t| t.status == status).count();
    TicketStats {
        total: tickets.len(),
        open: count(TicketStatus::Open),
        in_progress: count(TicketStatus::InProgress),
        resolved: count(TicketStatus::Resolved),
        closed: count(TicketStatus::Closed),
        average_resolution_time: average_resolution_time(tickets),
    }
}

/// Mean created→updated span over finished tickets, as `"<h>h <m>m"`.
pub fn average_resolution_time(tickets: &[Ticket]) -> String {
    let spans: Vec<i64> = tickets
        .iter()
        .filter(|t| t.status.is_finished())
        .map(|t| (t.updated_at - t.created_at).num_minutes())
        .filter(|m| *m >= 0)
        .collect();
    if spans.is_empty() {
        return "0h".to_string();
    }
    let mean = spans.iter().sum::<i64>() / spans.len() as i64;
    format!("{}h {}m", mean / 60, mean % 60)
}

/// Enumeration order, empty buckets omitted.
pub fn category_distribution(tickets: &[Ticket]) -> Vec<CategoryDistribution> {
    TicketCategory::ALL
        .into_iter()
        .map(|category| CategoryDistribution {
            category,
            count: tickets.iter().filter(|t| t.category == category).count(),
        })
        .filter(|d| d.count > 0)
        .collect()
}

pub fn priority_distribution(tickets: &[Ticket]) -> Vec<PriorityDistribution> {
    TicketPriority::ALL
        .into_iter()
        .map(|priority| PriorityDistribution {
            priority,
            count: tickets.iter().filter(|t| t.priority == priority).count(),
        })
        .filter(|d| d.count > 0)
        .collect()
}

/// Newest first, at most `limit`.
pub fn recent_tickets(tickets: &[Ticket], limit: usize) -> Vec<&Ticket> {
    let mut sorted: Vec<&Ticket> = tickets.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted.truncate(limit);
    sorted
}
