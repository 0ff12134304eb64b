//! Canonical ticket vocabulary shared by the client and the backend.
//!
//! Categories, priorities and statuses are closed sets; anything outside them
//! is rejected at parse time instead of being carried around as a string.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

pub const MIN_SUBJECT_LEN: usize = 5;
pub const MIN_DESCRIPTION_LEN: usize = 10;
pub const MIN_CUSTOMER_NAME_LEN: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketCategory {
    Technical,
    Billing,
    Feature,
    General,
    Account,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketPriority {
    Low,
    Medium,
    High,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl TicketCategory {
    pub const ALL: [TicketCategory; 5] = [
        TicketCategory::Technical,
        TicketCategory::Billing,
        TicketCategory::Feature,
        TicketCategory::General,
        TicketCategory::Account,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TicketCategory::Technical => "technical",
            TicketCategory::Billing => "billing",
            TicketCategory::Feature => "feature",
            TicketCategory::General => "general",
            TicketCategory::Account => "account",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TicketCategory::Technical => "Technical",
            TicketCategory::Billing => "Billing",
            TicketCategory::Feature => "Feature",
            TicketCategory::General => "General",
            TicketCategory::Account => "Account",
        }
    }
}

impl TicketPriority {
    pub const ALL: [TicketPriority; 3] = [
        TicketPriority::Low,
        TicketPriority::Medium,
        TicketPriority::High,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TicketPriority::Low => "low",
            TicketPriority::Medium => "medium",
            TicketPriority::High => "high",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TicketPriority::Low => "Low",
            TicketPriority::Medium => "Medium",
            TicketPriority::High => "High",
        }
    }
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 4] = [
        TicketStatus::Open,
        TicketStatus::InProgress,
        TicketStatus::Resolved,
        TicketStatus::Closed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in-progress",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TicketStatus::Open => "Open",
            TicketStatus::InProgress => "In Progress",
            TicketStatus::Resolved => "Resolved",
            TicketStatus::Closed => "Closed",
        }
    }

    /// Resolved and closed tickets count as finished work.
    pub fn is_finished(self) -> bool {
        matches!(self, TicketStatus::Resolved | TicketStatus::Closed)
    }
}

macro_rules! closed_set {
    ($ty:ty, $kind:literal) => {
        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim();
                <$ty>::ALL
                    .into_iter()
                    .find(|v| v.as_str().eq_ignore_ascii_case(needle))
                    .ok_or_else(|| UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

closed_set!(TicketCategory, "category");
closed_set!(TicketPriority, "priority");
closed_set!(TicketStatus, "status");

/// Fields submitted by the create-ticket form. Serialized in the backend's
/// camelCase shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTicket {
    pub subject: String,
    pub description: String,
    pub customer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    pub category: TicketCategory,
    pub priority: TicketPriority,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every failing field of a form, in form order.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{}", join_errors(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|e| e.field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl NewTicket {
    /// Trims text fields and turns a blank email into `None`.
    pub fn normalized(mut self) -> Self {
        self.subject = self.subject.trim().to_string();
        self.description = self.description.trim().to_string();
        self.customer_name = self.customer_name.trim().to_string();
        self.customer_email = self
            .customer_email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        self
    }
}

pub fn validate_new_ticket(ticket: &NewTicket) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();

    if ticket.subject.trim().chars().count() < MIN_SUBJECT_LEN {
        errors.push(FieldError {
            field: "subject",
            message: format!("Subject must be at least {MIN_SUBJECT_LEN} characters"),
        });
    }
    if ticket.description.trim().chars().count() < MIN_DESCRIPTION_LEN {
        errors.push(FieldError {
            field: "description",
            message: format!("Description must be at least {MIN_DESCRIPTION_LEN} characters"),
        });
    }
    if ticket.customer_name.trim().chars().count() < MIN_CUSTOMER_NAME_LEN {
        errors.push(FieldError {
            field: "customerName",
            message: format!("Name must be at least {MIN_CUSTOMER_NAME_LEN} characters"),
        });
    }
    if let Some(email) = ticket.customer_email.as_deref() {
        let email = email.trim();
        if !email.is_empty() && !is_valid_email(email) {
            errors.push(FieldError {
                field: "customerEmail",
                message: "Please enter a valid email address".into(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

pub fn is_valid_email(value: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| {
            Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").expect("email pattern compiles")
        })
        .is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> NewTicket {
        NewTicket {
            subject: "Login fails".into(),
            description: "Cannot sign in since the update".into(),
            customer_name: "Jo".into(),
            customer_email: None,
            category: TicketCategory::Account,
            priority: TicketPriority::High,
        }
    }

    #[test]
    fn accepts_valid_form_without_email() {
        assert!(validate_new_ticket(&form()).is_ok());
    }

    #[test]
    fn accepts_valid_email() {
        let mut f = form();
        f.customer_email = Some("jo@example.com".into());
        assert!(validate_new_ticket(&f).is_ok());
    }

    #[test]
    fn rejects_nine_character_description() {
        let mut f = form();
        f.description = "too short".into();
        assert_eq!(f.description.chars().count(), 9);
        let err = validate_new_ticket(&f).expect_err("short description");
        assert!(err.contains("description"));
        assert_eq!(err.0.len(), 1);
    }

    #[test]
    fn reports_every_failing_field() {
        let f = NewTicket {
            subject: "hey".into(),
            description: "short".into(),
            customer_name: "J".into(),
            customer_email: Some("not-an-email".into()),
            category: TicketCategory::General,
            priority: TicketPriority::Low,
        };
        let err = validate_new_ticket(&f).expect_err("invalid");
        let fields: Vec<_> = err.fields().collect();
        assert_eq!(
            fields,
            vec!["subject", "description", "customerName", "customerEmail"]
        );
        assert!(err.to_string().contains("Subject must be at least 5 characters"));
    }

    #[test]
    fn blank_email_counts_as_absent() {
        let mut f = form();
        f.customer_email = Some("   ".into());
        assert!(validate_new_ticket(&f).is_ok());
        assert_eq!(f.normalized().customer_email, None);
    }

    #[test]
    fn parses_closed_sets() {
        assert_eq!("Billing".parse::<TicketCategory>(), Ok(TicketCategory::Billing));
        assert_eq!("in-progress".parse::<TicketStatus>(), Ok(TicketStatus::InProgress));
        assert!("urgent".parse::<TicketPriority>().is_err());
        assert_eq!(TicketStatus::InProgress.label(), "In Progress");
    }

    #[test]
    fn serializes_backend_shape() {
        let mut f = form();
        f.customer_email = Some("jo@example.com".into());
        let v = serde_json::to_value(&f).expect("json");
        assert_eq!(v["customerName"], "Jo");
        assert_eq!(v["category"], "account");
        assert_eq!(v["priority"], "high");
        assert_eq!(
            serde_json::to_value(TicketStatus::InProgress).expect("json"),
            "in-progress"
        );
    }
}
