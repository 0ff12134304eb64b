use crate::model::{Ticket, TicketCategory, TicketPriority, TicketStatus};
use std::collections::BTreeSet;

/// Search box plus three multi-select dimensions. An empty selection matches
/// everything for that dimension; all predicates are ANDed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TicketFilter {
    pub query: String,
    pub categories: BTreeSet<TicketCategory>,
    pub priorities: BTreeSet<TicketPriority>,
    pub statuses: BTreeSet<TicketStatus>,
}

impl TicketFilter {
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn toggle_category(&mut self, category: TicketCategory) {
        if !self.categories.remove(&category) {
            self.categories.insert(category);
        }
    }

    pub fn toggle_priority(&mut self, priority: TicketPriority) {
        if !self.priorities.remove(&priority) {
            self.priorities.insert(priority);
        }
    }

    pub fn toggle_status(&mut self, status: TicketStatus) {
        if !self.statuses.remove(&status) {
            self.statuses.insert(status);
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_active(&self) -> bool {
        !self.query.trim().is_empty()
            || !self.categories.is_empty()
            || !self.priorities.is_empty()
            || !self.statuses.is_empty()
    }

    pub fn matches(&self, ticket: &Ticket) -> bool {
        self.matches_query(ticket)
            && (self.categories.is_empty() || self.categories.contains(&ticket.category))
            && (self.priorities.is_empty() || self.priorities.contains(&ticket.priority))
            && (self.statuses.is_empty() || self.statuses.contains(&ticket.status))
    }

    fn matches_query(&self, ticket: &Ticket) -> bool {
        let needle = self.query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [
            &ticket.subject,
            &ticket.description,
            &ticket.customer_name,
            &ticket.id,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }

    pub fn apply<'a>(&self, tickets: &'a [Ticket]) -> Vec<&'a Ticket> {
        tickets.iter().filter(|t| self.matches(t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn ticket(id: &str, subject: &str, category: TicketCategory, priority: TicketPriority, status: TicketStatus) -> Ticket {
        let now = Utc::now();
        Ticket {
            id: id.into(),
            customer_name: "Carlos Garcia".into(),
            category,
            priority,
            status,
            subject: subject.into(),
            description: "Requesting support for multiple languages".into(),
            created_at: now,
            updated_at: now,
            assigned_to: None,
            resolution: None,
            satisfaction_score: None,
        }
    }

    fn sample() -> Vec<Ticket> {
        vec![
            ticket("T006", "Payment Gateway Failure", TicketCategory::Billing, TicketPriority::High, TicketStatus::Open),
            ticket("T007", "Multi-language support", TicketCategory::Feature, TicketPriority::Medium, TicketStatus::Open),
            ticket("T008", "Device Compatibility Error", TicketCategory::Technical, TicketPriority::High, TicketStatus::Resolved),
        ]
    }

    #[test]
    fn empty_collection_stays_empty() {
        let none: Vec<Ticket> = Vec::new();
        assert!(TicketFilter::default().apply(&none).is_empty());

        let mut active = TicketFilter::default().with_query("payment");
        active.toggle_status(TicketStatus::Open);
        assert!(active.apply(&none).is_empty());
    }

    #[test]
    fn inactive_filter_matches_all() {
        let tickets = sample();
        let filter = TicketFilter::default();
        assert!(!filter.is_active());
        assert_eq!(filter.apply(&tickets).len(), 3);
    }

    #[test]
    fn query_is_case_insensitive_over_all_text_fields() {
        let tickets = sample();
        let ids = |q: &str| -> Vec<String> {
            TicketFilter::default()
                .with_query(q)
                .apply(&tickets)
                .into_iter()
                .map(|t| t.id.clone())
                .collect()
        };
        assert_eq!(ids("GATEWAY"), vec!["T006"]);
        assert_eq!(ids("t008"), vec!["T008"]);
        assert_eq!(ids("carlos").len(), 3);
        assert_eq!(ids("languages").len(), 3);
        assert!(ids("refund").is_empty());
    }

    #[test]
    fn dimensions_are_anded() {
        let tickets = sample();
        let mut filter = TicketFilter::default();
        filter.toggle_priority(TicketPriority::High);
        assert_eq!(filter.apply(&tickets).len(), 2);

        filter.toggle_status(TicketStatus::Open);
        let hits = filter.apply(&tickets);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "T006");

        filter.toggle_category(TicketCategory::Feature);
        assert!(filter.apply(&tickets).is_empty());
    }

    #[test]
    fn toggling_twice_removes_selection() {
        let mut filter = TicketFilter::default();
        filter.toggle_category(TicketCategory::Account);
        assert!(filter.is_active());
        filter.toggle_category(TicketCategory::Account);
        assert!(!filter.is_active());

        filter.query = "x".into();
        filter.clear();
        assert_eq!(filter, TicketFilter::default());
    }
}
