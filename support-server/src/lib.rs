//! Development backend for the support desk: in-memory tickets, a static
//! knowledge base, an Ollama reachability probe and keyword-based analysis,
//! optionally refined by the Ollama model.

pub mod analyzer;
pub mod knowledge;
pub mod routes;
pub mod store;

use std::sync::Arc;

pub use routes::{router, AppState};

pub const DEFAULT_BIND: &str = "0.0.0.0:5000";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: String,
    pub ollama_url: String,
    pub model: String,
    /// Ask Ollama for estimates and resolution steps instead of keywords only.
    pub ollama_analysis: bool,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        Self {
            bind: var("SUPPORT_BIND", DEFAULT_BIND),
            ollama_url: var("OLLAMA_URL", DEFAULT_OLLAMA_URL),
            model: var("OLLAMA_MODEL", DEFAULT_OLLAMA_MODEL),
            ollama_analysis: lookup("SUPPORT_ANALYZER")
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("ollama")),
        }
    }

    /// Seeded store and the configured analyzer.
    pub fn into_state(self) -> AppState {
        let http = reqwest::Client::new();
        let analyzer: Arc<dyn analyzer::Analyzer> = if self.ollama_analysis {
            Arc::new(analyzer::OllamaAnalyzer::new(http.clone(), self.ollama_url.clone()))
        } else {
            Arc::new(analyzer::KeywordAnalyzer)
        };
        AppState {
            store: Arc::new(store::TicketStore::seeded(chrono::Utc::now())),
            analyzer,
            http,
            ollama_url: self.ollama_url,
            model: self.model,
        }
    }
}
