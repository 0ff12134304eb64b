//! Typed shapes of the backend's JSON payloads.
//!
//! The analysis backend is an LLM pipeline and its output is only loosely
//! structured, so every field is optional and the scalar/list readers below
//! tolerate numbers sent as strings and stray entries of the wrong type.

use crate::error::SupportError;
use crate::model::{Ticket, TicketCategory, TicketPriority, TicketStatus};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    #[serde(default)]
    pub name: String,
}

/// Body of `GET /status`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusPayload {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub ollama_connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<ModelInfo>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(
        default,
        rename = "responseTime",
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub response_time: Option<f64>,
}

impl StatusPayload {
    pub const STATUS_OK: &'static str = "ok";
    pub const STATUS_WARNING: &'static str = "warning";
    pub const STATUS_ERROR: &'static str = "error";

    /// Stand-in reported when the status endpoint itself cannot be reached.
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self {
            status: Self::STATUS_ERROR.into(),
            ollama_connected: false,
            models: None,
            message: Some(message.into()),
            response_time: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == Self::STATUS_ERROR
    }

    pub fn first_model(&self) -> Option<&str> {
        self.models
            .as_ref()?
            .iter()
            .map(|m| m.name.as_str())
            .find(|name| !name.is_empty())
    }
}

/// A ticket record as the backend stores it. Historical imports leave most
/// fields blank, so nothing but the id is trusted until [`RawTicket::into_ticket`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTicket {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub satisfaction_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<String>,
}

pub const FALLBACK_CATEGORY: TicketCategory = TicketCategory::Technical;
pub const FALLBACK_PRIORITY: TicketPriority = TicketPriority::Medium;
pub const FALLBACK_STATUS: TicketStatus = TicketStatus::Open;

impl RawTicket {
    /// Converts a backend record into the closed-set domain model. Missing or
    /// unknown enum values fall back to technical/medium/open; missing or
    /// unreadable timestamps fall back to `now`.
    pub fn into_ticket(self, now: DateTime<Utc>) -> Result<Ticket, SupportError> {
        let id = self
            .id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SupportError::Backend("ticket record without id".into()))?;

        let category = parse_or(&id, "category", self.category.as_deref(), FALLBACK_CATEGORY);
        let priority = parse_or(&id, "priority", self.priority.as_deref(), FALLBACK_PRIORITY);
        let status = parse_or(&id, "status", self.status.as_deref(), FALLBACK_STATUS);

        let created_at = match self.created_at.as_deref().and_then(parse_timestamp) {
            Some(ts) => ts,
            None => {
                tracing::debug!(ticket_id = %id, raw = ?self.created_at, "unreadable createdAt, using now");
                now
            }
        };
        let updated_at = self
            .updated_at
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(created_at);

        Ok(Ticket {
            id,
            customer_name: self.customer_name.unwrap_or_default(),
            category,
            priority,
            status,
            subject: self.subject.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            created_at,
            updated_at,
            assigned_to: self.assigned_to.filter(|s| !s.trim().is_empty()),
            resolution: self.resolution.filter(|s| !s.trim().is_empty()),
            satisfaction_score: self.satisfaction_score,
        })
    }
}

fn parse_or<T>(id: &str, field: &str, raw: Option<&str>, fallback: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match raw {
        None => fallback,
        Some(value) => value.parse().unwrap_or_else(|_| {
            tracing::warn!(ticket_id = %id, field, value, "value outside closed set, using fallback");
            fallback
        }),
    }
}

/// Accepts RFC 3339, naive ISO-8601 (read as UTC) and bare dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[derive(Clone, Debug, Serialize)]
pub struct ProcessTicketRequest<'a> {
    pub ticket: &'a Ticket,
    pub model: &'a str,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default, deserialize_with = "lenient_string")]
    pub error: Option<String>,
}

/// Body of `POST /process-ticket`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisPayload {
    #[serde(
        default,
        deserialize_with = "error_message",
        skip_serializing_if = "Option::is_none"
    )]
    pub error: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_section",
        skip_serializing_if = "Option::is_none"
    )]
    pub sentiment: Option<SentimentSection>,
    #[serde(
        default,
        deserialize_with = "lenient_section",
        skip_serializing_if = "Option::is_none"
    )]
    pub summary: Option<SummarySection>,
    #[serde(
        default,
        deserialize_with = "lenient_section",
        skip_serializing_if = "Option::is_none"
    )]
    pub actions: Option<ActionsSection>,
    #[serde(
        default,
        deserialize_with = "lenient_section",
        skip_serializing_if = "Option::is_none"
    )]
    pub routing: Option<RoutingSection>,
    #[serde(
        default,
        deserialize_with = "lenient_section",
        skip_serializing_if = "Option::is_none"
    )]
    pub time_estimation: Option<TimeEstimationSection>,
    #[serde(
        default,
        deserialize_with = "lenient_section",
        skip_serializing_if = "Option::is_none"
    )]
    pub recommendations: Option<RecommendationsSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentSection {
    #[serde(
        default,
        alias = "overall_sentiment",
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub overall_sentiment: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub intensity: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarySection {
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub key_points: Vec<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub similar_tickets: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionsSection {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub actions: Vec<ActionItem>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingSection {
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub recommended_team: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEstimationSection {
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedResolution {
    #[serde(default, deserialize_with = "lenient_strings")]
    pub steps: Vec<String>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsSection {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub suggested_resolutions: Vec<SuggestedResolution>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub knowledge_base: Vec<String>,
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Anything the backend would treat as a raised error: every value except
/// `null`, `false`, `0` and `""`. Objects contribute their `message`, other
/// shapes their JSON text.
fn error_message<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) | Some(Value::Bool(false)) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Object(fields)) => {
            let message = fields
                .get("message")
                .and_then(Value::as_str)
                .filter(|m| !m.trim().is_empty())
                .map(str::to_string);
            Some(message.unwrap_or_else(|| Value::Object(fields).to_string()))
        }
        Some(other) => Some(other.to_string()),
    })
}

/// A section that is not an object, such as a bare error string in its
/// place, reads as absent.
fn lenient_section<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(section @ Value::Object(_)) => serde_json::from_value(section).ok(),
        _ => None,
    })
}

fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => vec![s],
        _ => Vec::new(),
    })
}

/// Keeps the array entries that decode as `T` and drops the rest.
fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single().expect("valid")
    }

    #[test]
    fn status_payload_reads_models_and_response_time() {
        let raw = r#"{"status":"ok","ollama_connected":true,
            "models":[{"name":"gemma3:4b","size":1}],"responseTime":"120"}"#;
        let p: StatusPayload = serde_json::from_str(raw).expect("parse");
        assert!(p.ollama_connected);
        assert_eq!(p.first_model(), Some("gemma3:4b"));
        assert_eq!(p.response_time, Some(120.0));
    }

    #[test]
    fn raw_ticket_falls_back_for_unknown_values() {
        let raw: RawTicket = serde_json::from_str(
            r#"{"id":"TK-1","subject":"Sync","status":"pending","priority":"urgent",
                "createdAt":"2024-03-02T10:15:00.123456"}"#,
        )
        .expect("parse");
        let t = raw.into_ticket(now()).expect("ticket");
        assert_eq!(t.status, TicketStatus::Open);
        assert_eq!(t.priority, TicketPriority::Medium);
        assert_eq!(t.category, TicketCategory::Technical);
        assert_eq!(t.created_at.to_rfc3339(), "2024-03-02T10:15:00.123456+00:00");
        assert_eq!(t.updated_at, t.created_at);
    }

    #[test]
    fn raw_ticket_keeps_known_values() {
        let raw: RawTicket = serde_json::from_str(
            r#"{"id":"T006","category":"billing","priority":"high","status":"in-progress",
                "customerName":"Alice Brown","assignedTo":null,"createdAt":"2024-01-05"}"#,
        )
        .expect("parse");
        let t = raw.into_ticket(now()).expect("ticket");
        assert_eq!(t.category, TicketCategory::Billing);
        assert_eq!(t.priority, TicketPriority::High);
        assert_eq!(t.status, TicketStatus::InProgress);
        assert_eq!(t.customer_name, "Alice Brown");
        assert_eq!(t.assigned_to, None);
        assert_eq!(t.created_at.to_rfc3339(), "2024-01-05T00:00:00+00:00");
    }

    #[test]
    fn raw_ticket_without_id_is_rejected() {
        let raw = RawTicket {
            subject: Some("orphan".into()),
            ..RawTicket::default()
        };
        assert!(matches!(raw.into_ticket(now()), Err(SupportError::Backend(_))));
    }

    #[test]
    fn unreadable_created_at_uses_now() {
        let raw = RawTicket {
            id: Some("T1".into()),
            created_at: Some("last tuesday".into()),
            ..RawTicket::default()
        };
        assert_eq!(raw.into_ticket(now()).expect("ticket").created_at, now());
    }

    #[test]
    fn analysis_payload_tolerates_loose_shapes() {
        let raw = r#"{
            "sentiment": {"overall_sentiment": "negative", "emotions": {"anger": 0.4}},
            "summary": {"keyPoints": ["crash on launch", 3]},
            "actions": {"actions": [{"description": "Reproduce"}, "bogus"]},
            "timeEstimation": {"estimatedMinutes": "45"},
            "recommendations": {"suggestedResolutions": [{"steps": "Reinstall", "confidence": 0.9}]}
        }"#;
        let p: AnalysisPayload = serde_json::from_str(raw).expect("parse");
        let sentiment = p.sentiment.expect("sentiment");
        assert_eq!(sentiment.overall_sentiment.as_deref(), Some("negative"));
        assert_eq!(p.summary.expect("summary").key_points, vec!["crash on launch"]);
        assert_eq!(p.actions.expect("actions").actions.len(), 1);
        assert_eq!(
            p.time_estimation.expect("time").estimated_minutes,
            Some(45.0)
        );
        let rec = p.recommendations.expect("recommendations");
        assert_eq!(rec.suggested_resolutions[0].steps, vec!["Reinstall"]);
    }

    #[test]
    fn falsy_error_is_not_an_error() {
        for raw in [r#"{"error": null}"#, r#"{"error": false}"#, r#"{"error": ""}"#] {
            let p: AnalysisPayload = serde_json::from_str(raw).expect("parse");
            assert_eq!(p.error, None, "{raw}");
        }
    }

    #[test]
    fn structured_error_keeps_its_message() {
        let p: AnalysisPayload =
            serde_json::from_str(r#"{"error": {"message": "model not found", "code": 404}}"#)
                .expect("parse");
        assert_eq!(p.error.as_deref(), Some("model not found"));

        let p: AnalysisPayload =
            serde_json::from_str(r#"{"error": ["quota exceeded"]}"#).expect("parse");
        assert_eq!(p.error.as_deref(), Some(r#"["quota exceeded"]"#));
    }

    #[test]
    fn non_object_sections_read_as_absent() {
        let p: AnalysisPayload = serde_json::from_str(
            r#"{"summary": "Error generating summary", "routing": ["billing"],
                "sentiment": {"overallSentiment": "negative"}}"#,
        )
        .expect("parse");
        assert_eq!(p.summary, None);
        assert_eq!(p.routing, None);
        assert!(p.sentiment.is_some());
    }
}
