use chrono::{DateTime, Utc};
use serde_json::Value;
use support_core::wire::RawTicket;
use tokio::sync::RwLock;

/// Keys a create request must carry. Presence is checked, not content.
pub const REQUIRED_FIELDS: [&str; 5] = ["subject", "description", "customerName", "category", "priority"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateError {
    Empty,
    MissingFields(Vec<&'static str>),
}

impl CreateError {
    pub fn message(&self) -> String {
        match self {
            CreateError::Empty => "No ticket data provided".into(),
            CreateError::MissingFields(fields) => {
                format!("Missing required fields: {}", fields.join(", "))
            }
        }
    }
}

/// In-memory ticket list. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct TicketStore {
    tickets: RwLock<Vec<RawTicket>>,
}

impl TicketStore {
    pub fn new(tickets: Vec<RawTicket>) -> Self {
        Self {
            tickets: RwLock::new(tickets),
        }
    }

    pub fn seeded(now: DateTime<Utc>) -> Self {
        Self::new(seed_tickets(now))
    }

    pub async fn list(&self) -> Vec<RawTicket> {
        self.tickets.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<RawTicket> {
        self.tickets
            .read()
            .await
            .iter()
            .find(|t| t.id.as_deref() == Some(id))
            .cloned()
    }

    pub async fn create(&self, payload: &Value, now: DateTime<Utc>) -> Result<RawTicket, CreateError> {
        let ticket = build_ticket(payload, new_ticket_id(), now)?;
        self.tickets.write().await.push(ticket.clone());
        tracing::info!(ticket_id = ticket.id.as_deref().unwrap_or_default(), "ticket stored");
        Ok(ticket)
    }
}

pub fn missing_fields(payload: &Value) -> Vec<&'static str> {
    REQUIRED_FIELDS
        .into_iter()
        .filter(|field| payload.get(field).map_or(true, Value::is_null))
        .collect()
}

/// `T` followed by the first eight hex digits of a random uuid.
pub fn new_ticket_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("T{}", &uuid[..8])
}

fn build_ticket(payload: &Value, id: String, now: DateTime<Utc>) -> Result<RawTicket, CreateError> {
    let Some(fields) = payload.as_object().filter(|o| !o.is_empty()) else {
        return Err(CreateError::Empty);
    };
    let missing = missing_fields(payload);
    if !missing.is_empty() {
        return Err(CreateError::MissingFields(missing));
    }

    let text = |key: &str| -> Option<String> {
        fields.get(key).and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
    };
    let stamp = now.to_rfc3339();
    Ok(RawTicket {
        id: Some(id),
        subject: text("subject"),
        description: text("description"),
        customer_name: text("customerName"),
        customer_email: text("customerEmail"),
        category: text("category"),
        priority: text("priority"),
        status: text("status").or_else(|| Some("open".into())),
        created_at: Some(stamp.clone()),
        updated_at: Some(stamp),
        assigned_to: text("assignedTo"),
        ..RawTicket::default()
    })
}

fn seed_tickets(now: DateTime<Utc>) -> Vec<RawTicket> {
    let stamp = now.to_rfc3339();
    let seed = |id: &str,
                subject: &str,
                description: &str,
                customer: (&str, &str),
                category: &str,
                priority: &str,
                sentiment: &str| RawTicket {
        id: Some(id.into()),
        subject: Some(subject.into()),
        description: Some(description.into()),
        customer_name: Some(customer.0.into()),
        customer_email: Some(customer.1.into()),
        category: Some(category.into()),
        priority: Some(priority.into()),
        status: Some("open".into()),
        created_at: Some(stamp.clone()),
        sentiment: Some(sentiment.into()),
        ..RawTicket::default()
    };

    vec![
        seed(
            "T006",
            "Payment Gateway Integration Failure",
            "Unable to process payment for the subscription. The payment gateway returns an error code 403.",
            ("Alice Brown", "alice.brown@example.com"),
            "billing",
            "high",
            "urgent",
        ),
        seed(
            "T007",
            "Feature request: Multi-language support",
            "Requesting support for multiple languages in the app. Our company is expanding to international markets.",
            ("Carlos Garcia", "carlos.garcia@example.com"),
            "feature",
            "medium",
            "neutral",
        ),
        seed(
            "T008",
            "Device Compatibility Error",
            "The app crashes immediately after launching on Android devices. Using Samsung Galaxy S21.",
            ("Diana Evans", "diana.evans@example.com"),
            "technical",
            "high",
            "annoyed",
        ),
    ]
}
