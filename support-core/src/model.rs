use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use ticket_registry::{TicketCategory, TicketPriority, TicketStatus};

pub const DEFAULT_MODEL: &str = "llama3:8b";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    pub customer_name: String,
    pub category: TicketCategory,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub subject: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub satisfaction_score: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStatus {
    pub connected: bool,
    pub model: String,
    pub last_checked: DateTime<Utc>,
    /// Milliseconds, as reported by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentStatus {
    /// Disconnected placeholder used before the first poll completes.
    pub fn unknown(model: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            connected: false,
            model: model.into(),
            last_checked: now,
            response_time: None,
            error: None,
        }
    }
}

/// Identifiers that only exist when the backend actually produced them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "ids", rename_all = "camelCase")]
pub enum References {
    #[default]
    Unavailable,
    Derived(Vec<String>),
}

impl References {
    pub fn from_ids(ids: Vec<String>) -> Self {
        if ids.is_empty() {
            References::Unavailable
        } else {
            References::Derived(ids)
        }
    }

    pub fn ids(&self) -> &[String] {
        match self {
            References::Unavailable => &[],
            References::Derived(ids) => ids,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketAnalysis {
    pub sentiment_score: f64,
    pub estimated_time: String,
    pub required_expertise: Vec<String>,
    pub keywords: Vec<String>,
    pub similar_tickets: References,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketSolution {
    pub recommended_actions: Vec<String>,
    pub suggested_response: String,
    pub related_knowledge_base: References,
    pub confidence: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketStats {
    pub total: usize,
    pub open: usize,
    pub in_progress: usize,
    pub resolved: usize,
    pub closed: usize,
    pub average_resolution_time: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDistribution {
    pub category: TicketCategory,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityDistribution {
    pub priority: TicketPriority,
    pub count: usize,
}
