use crate::knowledge::articles_for;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::str::FromStr;
use std::time::Duration;
use support_core::wire::{
    ActionItem, ActionsSection, AnalysisPayload, RawTicket, RecommendationsSection, RoutingSection,
    SentimentSection, SuggestedResolution, SummarySection, TimeEstimationSection, FALLBACK_CATEGORY,
    FALLBACK_PRIORITY,
};
use ticket_registry::{TicketCategory, TicketPriority};

/// Produces the `/process-ticket` payload for one ticket. `history` is the
/// rest of the store, used to point at similar tickets.
#[async_trait]
pub trait Analyzer: Send + Sync + 'static {
    async fn analyze(
        &self,
        ticket: &RawTicket,
        history: &[RawTicket],
        model: &str,
    ) -> Result<AnalysisPayload, String>;
}

/// Keyword heuristics standing in for the language model.
pub struct KeywordAnalyzer;

const POSITIVE_TERMS: &[&str] = &[
    "love", "great", "excellent", "good", "best", "awesome", "fantastic", "wonderful", "helpful",
    "works", "solved", "fixed", "resolved", "thanks", "thank you", "appreciate",
];
const NEGATIVE_TERMS: &[&str] = &[
    "bad", "terrible", "awful", "horrible", "useless", "problem", "issue", "error", "bug",
    "glitch", "doesn't work", "failed", "failure", "poor", "disappointed", "waste", "broken",
    "crash", "not working",
];
const NEUTRAL_TERMS: &[&str] = &[
    "how", "what", "when", "where", "who", "which", "question", "information", "help", "assist",
    "details", "instructions", "guidance", "explain", "tell", "show",
];
const URGENCY_TERMS: &[&str] = &[
    "urgent", "immediately", "asap", "critical", "emergency", "crucial", "deadline",
];
const STOP_WORDS: &[&str] = &[
    "with", "from", "that", "this", "have", "after", "request", "unable", "using", "when",
];
const MAX_KEY_POINTS: usize = 5;
const MAX_SIMILAR: usize = 3;

struct Playbook {
    team: &'static str,
    actions: &'static [&'static str],
    reply: &'static [&'static str],
}

fn playbook(category: TicketCategory) -> Playbook {
    match category {
        TicketCategory::Billing => Playbook {
            team: "Billing",
            actions: &[
                "Verify the payment gateway connection",
                "Check transaction logs for gateway error codes",
            ],
            reply: &[
                "Thanks for flagging the payment problem.",
                "We are checking the gateway and will confirm once the charge goes through.",
            ],
        },
        TicketCategory::Technical => Playbook {
            team: "Technical Support",
            actions: &[
                "Reproduce the issue on the reported device and OS version",
                "Collect application logs from the customer",
            ],
            reply: &[
                "Sorry for the trouble with the app.",
                "Please make sure you are on the latest version while we reproduce the issue.",
            ],
        },
        TicketCategory::Account => Playbook {
            team: "Account Management",
            actions: &[
                "Confirm the customer's identity",
                "Check the authentication service status",
            ],
            reply: &[
                "We are looking into your account access.",
                "Please try resetting your password in the meantime.",
            ],
        },
        TicketCategory::Feature => Playbook {
            team: "Product",
            actions: &["Log the request in the product backlog"],
            reply: &["Thanks for the suggestion, we have shared it with the product team."],
        },
        TicketCategory::General => Playbook {
            team: "Customer Success",
            actions: &["Review ticket manually"],
            reply: &["Thanks for reaching out, an agent will follow up shortly."],
        },
    }
}

#[async_trait]
impl Analyzer for KeywordAnalyzer {
    async fn analyze(
        &self,
        ticket: &RawTicket,
        history: &[RawTicket],
        model: &str,
    ) -> Result<AnalysisPayload, String> {
        self.payload(ticket, history, model)
    }
}

impl KeywordAnalyzer {
    pub fn payload(
        &self,
        ticket: &RawTicket,
        history: &[RawTicket],
        model: &str,
    ) -> Result<AnalysisPayload, String> {
        let started = std::time::Instant::now();
        let subject = ticket.subject.as_deref().unwrap_or_default().trim();
        let description = ticket.description.as_deref().unwrap_or_default().trim();
        if subject.is_empty() && description.is_empty() {
            return Err("ticket has neither subject nor description".into());
        }
        let raw_text = format!("{subject} {description}");
        let text = raw_text.to_lowercase();

        let parsed_category = ticket
            .category
            .as_deref()
            .and_then(|c| TicketCategory::from_str(c).ok());
        let category = parsed_category.unwrap_or(FALLBACK_CATEGORY);
        let priority = ticket
            .priority
            .as_deref()
            .and_then(|p| TicketPriority::from_str(p).ok())
            .unwrap_or(FALLBACK_PRIORITY);
        let plan = playbook(category);

        let (label, score) = classify_sentiment(&text);
        let payload = AnalysisPayload {
            error: None,
            sentiment: Some(SentimentSection {
                overall_sentiment: Some(label.into()),
                score: Some(score),
                intensity: Some(intensity(&raw_text)),
            }),
            summary: Some(SummarySection {
                summary: Some(first_sentence(description).unwrap_or(subject).to_string()),
                key_points: key_points(subject),
                similar_tickets: similar_tickets(ticket, category, history),
            }),
            actions: Some(ActionsSection {
                actions: plan
                    .actions
                    .iter()
                    .map(|a| ActionItem {
                        description: Some((*a).to_string()),
                    })
                    .collect(),
            }),
            routing: Some(RoutingSection {
                recommended_team: Some(plan.team.into()),
                confidence: Some(if parsed_category.is_some() { 0.8 } else { 0.5 }),
            }),
            time_estimation: Some(TimeEstimationSection {
                estimated_minutes: Some(estimated_minutes(priority)),
                confidence: Some(0.6),
            }),
            recommendations: Some(RecommendationsSection {
                suggested_resolutions: vec![SuggestedResolution {
                    steps: plan.reply.iter().map(|s| (*s).to_string()).collect(),
                    confidence: Some(0.7),
                }],
                knowledge_base: articles_for(category).map(|a| a.id.to_string()).collect(),
            }),
            metadata: Some(json!({
                "processing_time": started.elapsed().as_secs_f64(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "model_used": model,
            })),
        };
        Ok(payload)
    }
}

const ESTIMATE_SYSTEM: &str = "You are a support resolution time estimator. \
Analyze the ticket and estimate how long it will take to resolve, considering \
complexity and clarity of the issue. Respond with JSON only: \
{\"estimatedMinutes\": 45, \"confidence\": 0.7}";

const RESOLUTION_SYSTEM: &str = "You are a support resolution planner. \
Suggest the steps an agent should take to resolve the ticket. Respond with JSON only: \
{\"suggestedResolutions\": [{\"steps\": [\"...\"], \"confidence\": 0.8}]}";

pub const GENERATE_TIMEOUT: Duration = Duration::from_secs(120);

/// Keyword analysis refined by a local Ollama model. The time estimate and
/// the suggested resolution come from the model when it answers with usable
/// JSON; each falls back to the keyword result on its own.
pub struct OllamaAnalyzer {
    http: reqwest::Client,
    ollama_url: String,
}

impl OllamaAnalyzer {
    pub fn new(http: reqwest::Client, ollama_url: impl Into<String>) -> Self {
        Self {
            http,
            ollama_url: ollama_url.into(),
        }
    }

    /// One non-streaming `/api/generate` call whose reply must be a JSON object.
    async fn generate(&self, model: &str, system: &str, prompt: &str) -> Result<Value, String> {
        #[derive(Deserialize)]
        struct Generated {
            #[serde(default)]
            response: String,
        }

        let url = format!("{}/api/generate", self.ollama_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .timeout(GENERATE_TIMEOUT)
            .json(&json!({
                "model": model,
                "system": system,
                "prompt": prompt,
                "stream": false,
                "format": "json",
            }))
            .send()
            .await
            .map_err(|e| format!("Error calling Ollama: {e}"))?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("Ollama API returned status code {}", status.as_u16()));
        }
        let generated: Generated = response
            .json()
            .await
            .map_err(|e| format!("unreadable Ollama reply: {e}"))?;
        match serde_json::from_str::<Value>(generated.response.trim()) {
            Ok(reply @ Value::Object(_)) => Ok(reply),
            Ok(_) => Err("model reply is not a JSON object".into()),
            Err(e) => Err(format!("model reply is not JSON: {e}")),
        }
    }
}

fn ticket_prompt(ticket: &RawTicket, similar: &[String]) -> String {
    let field = |v: &Option<String>| v.as_deref().unwrap_or_default().trim().to_string();
    let context = if similar.is_empty() {
        "No historical context available".to_string()
    } else {
        format!("Similar tickets: {}", similar.join(", "))
    };
    format!(
        "Ticket #{}\nSubject: {}\nDescription: {}\nFrom: {}\n\nHistorical Context:\n{context}",
        field(&ticket.id),
        field(&ticket.subject),
        field(&ticket.description),
        field(&ticket.customer_name),
    )
}

#[async_trait]
impl Analyzer for OllamaAnalyzer {
    async fn analyze(
        &self,
        ticket: &RawTicket,
        history: &[RawTicket],
        model: &str,
    ) -> Result<AnalysisPayload, String> {
        let mut payload = KeywordAnalyzer.payload(ticket, history, model)?;
        let similar = payload
            .summary
            .as_ref()
            .map(|s| s.similar_tickets.clone())
            .unwrap_or_default();
        let prompt = ticket_prompt(ticket, &similar);
        let ticket_id = ticket.id.clone().unwrap_or_default();

        let (estimate, resolution) = tokio::join!(
            self.generate(model, ESTIMATE_SYSTEM, &prompt),
            self.generate(model, RESOLUTION_SYSTEM, &prompt)
        );

        match estimate.and_then(|v| {
            serde_json::from_value::<TimeEstimationSection>(v).map_err(|e| e.to_string())
        }) {
            Ok(section) if section.estimated_minutes.is_some_and(|m| m > 0.0) => {
                payload.time_estimation = Some(section);
            }
            Ok(_) => tracing::warn!(ticket_id = %ticket_id, "model gave no estimate, keeping keyword estimate"),
            Err(e) => tracing::warn!(ticket_id = %ticket_id, error = %e, "time estimate failed, keeping keyword estimate"),
        }

        match resolution.and_then(|v| {
            serde_json::from_value::<RecommendationsSection>(v).map_err(|e| e.to_string())
        }) {
            Ok(section) if section.suggested_resolutions.iter().any(|r| !r.steps.is_empty()) => {
                if let Some(recommendations) = payload.recommendations.as_mut() {
                    recommendations.suggested_resolutions = section.suggested_resolutions;
                }
            }
            Ok(_) => tracing::warn!(ticket_id = %ticket_id, "model gave no resolution steps, keeping playbook"),
            Err(e) => tracing::warn!(ticket_id = %ticket_id, error = %e, "resolution plan failed, keeping playbook"),
        }

        tracing::debug!(ticket_id = %ticket_id, model, "ollama analysis finished");
        Ok(payload)
    }
}

/// Share of indicator hits per label; weak signals fall back to neutral.
/// Ties go to the earlier label in positive, negative, neutral order.
pub fn classify_sentiment(text: &str) -> (&'static str, f64) {
    let hits = |terms: &[&str]| terms.iter().filter(|t| text.contains(**t)).count() as f64;
    let mut scores = [
        ("positive", hits(POSITIVE_TERMS)),
        ("negative", hits(NEGATIVE_TERMS)),
        ("neutral", hits(NEUTRAL_TERMS)),
    ];
    let total: f64 = scores.iter().map(|(_, s)| s).sum();
    if total > 0.0 {
        for entry in &mut scores {
            entry.1 /= total;
        }
    }
    if scores.iter().all(|(_, s)| *s < 0.4) {
        scores[2].1 = scores[2].1.max(0.5);
    }
    scores
        .into_iter()
        .fold(("neutral", f64::MIN), |best, cur| if cur.1 > best.1 { cur } else { best })
}

/// Exclamation marks, shouted words and urgency terms, capped at 1.
pub fn intensity(text: &str) -> f64 {
    let exclamations = text.matches('!').count() as f64;
    let shouted = text
        .split_whitespace()
        .filter(|w| w.len() > 3 && w.chars().all(|c| c.is_ascii_uppercase()))
        .count() as f64;
    let lower = text.to_lowercase();
    let urgent = URGENCY_TERMS.iter().filter(|t| lower.contains(**t)).count() as f64;
    ((exclamations * 0.1).min(0.3) + (shouted * 0.05).min(0.3) + (urgent * 0.2).min(0.4)).min(1.0)
}

fn estimated_minutes(priority: TicketPriority) -> f64 {
    match priority {
        TicketPriority::High => 120.0,
        TicketPriority::Medium => 60.0,
        TicketPriority::Low => 30.0,
    }
}

fn first_sentence(text: &str) -> Option<&str> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .find(|s| !s.is_empty())
}

fn key_points(subject: &str) -> Vec<String> {
    let mut points: Vec<String> = Vec::new();
    for word in subject
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| w.len() >= 4 && !STOP_WORDS.contains(&w.as_str()))
    {
        if !points.contains(&word) {
            points.push(word);
        }
        if points.len() == MAX_KEY_POINTS {
            break;
        }
    }
    points
}

fn similar_tickets(ticket: &RawTicket, category: TicketCategory, history: &[RawTicket]) -> Vec<String> {
    history
        .iter()
        .filter(|other| other.id.is_some() && other.id != ticket.id)
        .filter(|other| {
            other
                .category
                .as_deref()
                .and_then(|c| TicketCategory::from_str(c).ok())
                == Some(category)
        })
        .filter_map(|other| other.id.clone())
        .take(MAX_SIMILAR)
        .collect()
}
