use crate::client::SupportApi;
use crate::error::SupportError;
use crate::model::{AgentStatus, References, Ticket, TicketAnalysis, TicketSolution};
use crate::wire::AnalysisPayload;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const POSITIVE_SENTIMENT_SCORE: f64 = 0.8;
pub const NEGATIVE_SENTIMENT_SCORE: f64 = 0.2;
pub const NEUTRAL_SENTIMENT_SCORE: f64 = 0.5;
pub const UNKNOWN_ESTIMATE: &str = "Unknown";
pub const DEFAULT_EXPERTISE: &str = "Technical Support";
pub const PENDING_RESPONSE: &str =
    "We're analyzing your issue and will get back to you shortly.";
pub const DEFAULT_CONFIDENCE: f64 = 0.75;
/// Largest whole estimate printed through an integer cast.
const MAX_WHOLE_MINUTES: f64 = 1e15;

/// The two records shown on a ticket's detail view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub analysis: TicketAnalysis,
    pub solution: TicketSolution,
}

pub struct TicketAnalyzer<A: ?Sized> {
    api: Arc<A>,
}

impl<A> TicketAnalyzer<A>
where
    A: SupportApi + ?Sized,
{
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    /// Sends `ticket` to `model` and maps the reply. Refuses without touching
    /// the network while the agent is disconnected.
    pub async fn analyze(
        &self,
        ticket: &Ticket,
        agent: &AgentStatus,
        model: &str,
    ) -> Result<AnalysisReport, SupportError> {
        if !agent.connected {
            tracing::warn!(ticket_id = %ticket.id, "analysis refused, agent disconnected");
            return Err(SupportError::AgentDisconnected);
        }

        tracing::info!(ticket_id = %ticket.id, model, "analyzing ticket");
        let payload = self.api.process_ticket(ticket, model).await?;
        let report = map_analysis(payload).inspect_err(|e| {
            tracing::warn!(ticket_id = %ticket.id, error = %e, "analysis rejected by backend");
        })?;
        tracing::info!(
            ticket_id = %ticket.id,
            sentiment = report.analysis.sentiment_score,
            actions = report.solution.recommended_actions.len(),
            "analysis complete"
        );
        Ok(report)
    }
}

/// Maps the backend's analysis payload onto the fixed-shape records. An
/// `error` in the payload fails the whole analysis, whatever else it carries.
pub fn map_analysis(payload: AnalysisPayload) -> Result<AnalysisReport, SupportError> {
    if let Some(message) = payload.error.filter(|m| !m.is_empty()) {
        return Err(SupportError::Backend(message));
    }

    let sentiment = payload.sentiment.unwrap_or_default();
    let summary = payload.summary.unwrap_or_default();
    let actions = payload.actions.unwrap_or_default();
    let routing = payload.routing.unwrap_or_default();
    let timing = payload.time_estimation.unwrap_or_default();
    let recommendations = payload.recommendations.unwrap_or_default();

    let required_expertise = vec![routing
        .recommended_team
        .filter(|team| !team.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_EXPERTISE.to_string())];

    let analysis = TicketAnalysis {
        sentiment_score: sentiment_score(sentiment.overall_sentiment.as_deref()),
        estimated_time: estimated_time(timing.estimated_minutes),
        required_expertise,
        keywords: summary.key_points,
        similar_tickets: References::from_ids(summary.similar_tickets),
    };

    let first = recommendations.suggested_resolutions.into_iter().next();
    let suggested_response = first
        .as_ref()
        .map(|r| r.steps.join(" "))
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| PENDING_RESPONSE.to_string());
    let confidence = first
        .and_then(|r| r.confidence)
        .filter(|c| c.is_finite())
        .map_or(DEFAULT_CONFIDENCE, |c| c.clamp(0.0, 1.0));

    let solution = TicketSolution {
        recommended_actions: actions
            .actions
            .into_iter()
            .filter_map(|a| a.description)
            .collect(),
        suggested_response,
        related_knowledge_base: References::from_ids(recommendations.knowledge_base),
        confidence,
    };

    Ok(AnalysisReport { analysis, solution })
}

/// Three buckets, not a continuous score.
pub fn sentiment_score(label: Option<&str>) -> f64 {
    match label.map(str::trim) {
        Some(l) if l.eq_ignore_ascii_case("positive") => POSITIVE_SENTIMENT_SCORE,
        Some(l) if l.eq_ignore_ascii_case("negative") => NEGATIVE_SENTIMENT_SCORE,
        _ => NEUTRAL_SENTIMENT_SCORE,
    }
}

pub fn estimated_time(minutes: Option<f64>) -> String {
    match minutes.filter(|m| m.is_finite() && *m > 0.0) {
        Some(m) if m.fract() == 0.0 && m <= MAX_WHOLE_MINUTES => format!("{} minutes", m as u64),
        Some(m) => format!("{m} minutes"),
        None => UNKNOWN_ESTIMATE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TicketCategory, TicketPriority, TicketStatus};
    use crate::wire::{RawTicket, StatusPayload};
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use ticket_registry::NewTicket;

    struct CannedAnalysis {
        reply: serde_json::Value,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SupportApi for CannedAnalysis {
        async fn fetch_status(&self) -> StatusPayload {
            StatusPayload::default()
        }

        async fn fetch_tickets(&self) -> Result<Vec<RawTicket>, SupportError> {
            Ok(Vec::new())
        }

        async fn fetch_ticket(&self, id: &str) -> Result<RawTicket, SupportError> {
            Err(SupportError::NotFound(id.to_string()))
        }

        async fn create_ticket(&self, _ticket: &NewTicket) -> Result<RawTicket, SupportError> {
            Err(SupportError::Backend("unused".into()))
        }

        async fn process_ticket(
            &self,
            _ticket: &Ticket,
            _model: &str,
        ) -> Result<AnalysisPayload, SupportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(serde_json::from_value(self.reply.clone())?)
        }
    }

    fn ticket() -> Ticket {
        let now = Utc::now();
        Ticket {
            id: "T008".into(),
            customer_name: "Diana Evans".into(),
            category: TicketCategory::Technical,
            priority: TicketPriority::High,
            status: TicketStatus::Open,
            subject: "Device Compatibility Error".into(),
            description: "The app crashes immediately after launching.".into(),
            created_at: now,
            updated_at: now,
            assigned_to: None,
            resolution: None,
            satisfaction_score: None,
        }
    }

    fn agent(connected: bool) -> AgentStatus {
        let mut status = AgentStatus::unknown("llama3:8b", Utc::now());
        status.connected = connected;
        status
    }

    fn payload(v: serde_json::Value) -> AnalysisPayload {
        serde_json::from_value(v).expect("payload")
    }

    #[test]
    fn sentiment_buckets() {
        assert_eq!(sentiment_score(Some("positive")), 0.8);
        assert_eq!(sentiment_score(Some("negative")), 0.2);
        assert_eq!(sentiment_score(Some("neutral")), 0.5);
        assert_eq!(sentiment_score(Some("urgent")), 0.5);
        assert_eq!(sentiment_score(None), 0.5);
    }

    #[test]
    fn estimated_time_formats_minutes() {
        assert_eq!(estimated_time(Some(45.0)), "45 minutes");
        assert_eq!(estimated_time(Some(7.5)), "7.5 minutes");
        assert_eq!(estimated_time(None), "Unknown");
        assert_eq!(estimated_time(Some(0.0)), "Unknown");
        assert_eq!(
            estimated_time(Some(1e25)),
            "10000000000000000000000000 minutes"
        );
    }

    #[test]
    fn error_field_wins_over_content() {
        let err = map_analysis(payload(json!({
            "error": "model llama3 not found",
            "sentiment": {"overallSentiment": "positive"},
            "timeEstimation": {"estimatedMinutes": 30}
        })))
        .expect_err("embedded error");
        match err {
            SupportError::Backend(msg) => assert_eq!(msg, "model llama3 not found"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn error_survives_malformed_sections() {
        let payload: AnalysisPayload = serde_json::from_str(
            r#"{"error": "Ollama timed out", "summary": "Error generating summary"}"#,
        )
        .expect("payload");
        let err = map_analysis(payload).expect_err("embedded error");
        assert!(matches!(err, SupportError::Backend(ref m) if m == "Ollama timed out"));
    }

    #[test]
    fn structured_error_fails_analysis() {
        let err = map_analysis(payload(json!({
            "error": {"message": "model not found"},
            "sentiment": {"overallSentiment": "positive"}
        })))
        .expect_err("embedded error");
        assert!(matches!(err, SupportError::Backend(ref m) if m == "model not found"));
    }

    #[test]
    fn false_error_is_ignored() {
        let report = map_analysis(payload(json!({
            "error": false,
            "sentiment": {"overallSentiment": "positive"}
        })))
        .expect("report");
        assert_eq!(report.analysis.sentiment_score, 0.8);
    }

    #[test]
    fn malformed_section_falls_back_to_defaults() {
        let report = map_analysis(payload(json!({
            "summary": "App crashes on launch",
            "timeEstimation": {"estimatedMinutes": 20}
        })))
        .expect("report");
        assert!(report.analysis.keywords.is_empty());
        assert_eq!(report.analysis.similar_tickets, References::Unavailable);
        assert_eq!(report.analysis.estimated_time, "20 minutes");
    }

    #[test]
    fn empty_payload_uses_defaults() {
        let report = map_analysis(AnalysisPayload::default()).expect("report");
        assert_eq!(report.analysis.sentiment_score, 0.5);
        assert_eq!(report.analysis.estimated_time, "Unknown");
        assert_eq!(report.analysis.required_expertise, vec!["Technical Support"]);
        assert!(report.analysis.keywords.is_empty());
        assert_eq!(report.analysis.similar_tickets, References::Unavailable);
        assert!(report.solution.recommended_actions.is_empty());
        assert_eq!(report.solution.suggested_response, PENDING_RESPONSE);
        assert_eq!(report.solution.related_knowledge_base, References::Unavailable);
        assert_eq!(report.solution.confidence, 0.75);
    }

    #[test]
    fn full_payload_maps_every_section() {
        let report = map_analysis(payload(json!({
            "sentiment": {"overallSentiment": "negative", "score": 0.1},
            "summary": {"keyPoints": ["crash on launch", "Galaxy S21"], "similarTickets": ["T003"]},
            "actions": {"actions": [{"description": "Collect crash logs"}, {"description": "Escalate to mobile"}]},
            "routing": {"recommendedTeam": "mobile-engineering"},
            "timeEstimation": {"estimatedMinutes": 45},
            "recommendations": {
                "suggestedResolutions": [
                    {"steps": ["Clear the app cache.", "Reinstall the app."], "confidence": 0.9},
                    {"steps": ["Ignore me."], "confidence": 0.1}
                ]
            }
        })))
        .expect("report");

        assert_eq!(report.analysis.sentiment_score, 0.2);
        assert_eq!(report.analysis.estimated_time, "45 minutes");
        assert_eq!(report.analysis.required_expertise, vec!["mobile-engineering"]);
        assert_eq!(report.analysis.keywords, vec!["crash on launch", "Galaxy S21"]);
        assert_eq!(
            report.analysis.similar_tickets,
            References::Derived(vec!["T003".into()])
        );
        assert_eq!(
            report.solution.recommended_actions,
            vec!["Collect crash logs", "Escalate to mobile"]
        );
        assert_eq!(
            report.solution.suggested_response,
            "Clear the app cache. Reinstall the app."
        );
        assert_eq!(report.solution.confidence, 0.9);
    }

    #[test]
    fn blank_team_and_steps_count_as_missing() {
        let report = map_analysis(payload(json!({
            "routing": {"recommendedTeam": "  "},
            "recommendations": {"suggestedResolutions": [{"steps": []}]}
        })))
        .expect("report");
        assert_eq!(report.analysis.required_expertise, vec!["Technical Support"]);
        assert_eq!(report.solution.suggested_response, PENDING_RESPONSE);
        assert_eq!(report.solution.confidence, DEFAULT_CONFIDENCE);
    }

    #[tokio::test]
    async fn disconnected_agent_makes_no_request() {
        let api = Arc::new(CannedAnalysis {
            reply: json!({}),
            calls: AtomicUsize::new(0),
        });
        let analyzer = TicketAnalyzer::new(Arc::clone(&api));
        let err = analyzer
            .analyze(&ticket(), &agent(false), "llama3:8b")
            .await
            .expect_err("disconnected");
        assert!(matches!(err, SupportError::AgentDisconnected));
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn connected_agent_gets_report() {
        let api = Arc::new(CannedAnalysis {
            reply: json!({"sentiment": {"overallSentiment": "positive"}}),
            calls: AtomicUsize::new(0),
        });
        let analyzer = TicketAnalyzer::new(Arc::clone(&api));
        let report = analyzer
            .analyze(&ticket(), &agent(true), "gemma3:4b")
            .await
            .expect("report");
        assert_eq!(report.analysis.sentiment_score, 0.8);
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn embedded_error_surfaces_exact_message() {
        let api = Arc::new(CannedAnalysis {
            reply: json!({"error": "Ollama timed out", "summary": "Error generating summary"}),
            calls: AtomicUsize::new(0),
        });
        let err = TicketAnalyzer::new(api)
            .analyze(&ticket(), &agent(true), "llama3:8b")
            .await
            .expect_err("error");
        assert_eq!(err.to_string(), "Ollama timed out");
    }
}
