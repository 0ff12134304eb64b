use crate::config::DashboardConfig;
use crate::error::SupportError;
use crate::model::Ticket;
use crate::wire::{AnalysisPayload, ErrorBody, ProcessTicketRequest, RawTicket, StatusPayload};
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use ticket_registry::NewTicket;
use tokio_util::sync::CancellationToken;

/// The backend operations the dashboard consumes.
#[async_trait]
pub trait SupportApi: Send + Sync {
    /// Never fails: an unreachable backend is reported as an `error` payload.
    async fn fetch_status(&self) -> StatusPayload;

    async fn fetch_tickets(&self) -> Result<Vec<RawTicket>, SupportError>;

    async fn fetch_ticket(&self, id: &str) -> Result<RawTicket, SupportError>;

    async fn create_ticket(&self, ticket: &NewTicket) -> Result<RawTicket, SupportError>;

    async fn process_ticket(
        &self,
        ticket: &Ticket,
        model: &str,
    ) -> Result<AnalysisPayload, SupportError>;
}

/// reqwest-backed client. Every request races the client's cancellation
/// token; [`HttpSupportApi::scoped`] hands a view its own child token so
/// tearing the view down aborts only that view's requests.
#[derive(Clone, Debug)]
pub struct HttpSupportApi {
    http: reqwest::Client,
    base_url: String,
    cancel: CancellationToken,
}

impl HttpSupportApi {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, SupportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            cancel: CancellationToken::new(),
        })
    }

    pub fn from_config(config: &DashboardConfig) -> Result<Self, SupportError> {
        Self::new(&config.api_base_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Same connection pool, child cancellation scope.
    pub fn scoped(&self) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            cancel: self.cancel.child_token(),
        }
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Aborts every in-flight and future request of this scope.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn guarded<T, F>(&self, request: F) -> Result<T, SupportError>
    where
        F: Future<Output = Result<T, SupportError>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(SupportError::Cancelled),
            result = request => result,
        }
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, SupportError> {
    let status = response.status();
    if !status.is_success() {
        return Err(http_error(status, response).await);
    }
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Prefers the server's `{"error": ...}` text over a bare status line.
async fn http_error(status: StatusCode, response: Response) -> SupportError {
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("HTTP error, status {}", status.as_u16()));
    SupportError::Http {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl SupportApi for HttpSupportApi {
    async fn fetch_status(&self) -> StatusPayload {
        let result = self
            .guarded(async {
                let response = self.http.get(self.url("/status")).send().await?;
                let status = response.status();
                let body = response.bytes().await?;
                match serde_json::from_slice::<StatusPayload>(&body) {
                    Ok(payload) => Ok(payload),
                    Err(_) if !status.is_success() => Ok(StatusPayload::unreachable(format!(
                        "HTTP error, status {}",
                        status.as_u16()
                    ))),
                    Err(e) => Err(SupportError::Decode(e)),
                }
            })
            .await;

        result.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "status check failed");
            StatusPayload::unreachable(e.to_string())
        })
    }

    async fn fetch_tickets(&self) -> Result<Vec<RawTicket>, SupportError> {
        self.guarded(async {
            let response = self.http.get(self.url("/tickets")).send().await?;
            read_json(response).await
        })
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "fetching tickets failed"))
    }

    async fn fetch_ticket(&self, id: &str) -> Result<RawTicket, SupportError> {
        self.guarded(async {
            let response = self
                .http
                .get(self.url(&format!("/tickets/{id}")))
                .send()
                .await?;
            if response.status() == StatusCode::NOT_FOUND {
                return Err(SupportError::NotFound(id.to_string()));
            }
            read_json(response).await
        })
        .await
    }

    async fn create_ticket(&self, ticket: &NewTicket) -> Result<RawTicket, SupportError> {
        self.guarded(async {
            let response = self
                .http
                .post(self.url("/tickets"))
                .json(ticket)
                .send()
                .await?;
            read_json(response).await
        })
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "creating ticket failed"))
    }

    async fn process_ticket(
        &self,
        ticket: &Ticket,
        model: &str,
    ) -> Result<AnalysisPayload, SupportError> {
        tracing::debug!(ticket_id = %ticket.id, model, "submitting ticket for analysis");
        self.guarded(async {
            let response = self
                .http
                .post(self.url("/process-ticket"))
                .json(&ProcessTicketRequest { ticket, model })
                .send()
                .await?;
            read_json(response).await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash() {
        let api = HttpSupportApi::new("http://localhost:5000/", None).expect("client");
        assert_eq!(api.base_url(), "http://localhost:5000");
        assert_eq!(api.url("/status"), "http://localhost:5000/status");
    }

    #[test]
    fn scoped_clients_cancel_independently() {
        let root = HttpSupportApi::new("http://localhost:5000", None).expect("client");
        let view_a = root.scoped();
        let view_b = root.scoped();
        view_a.cancel();
        assert!(view_a.cancel_token().is_cancelled());
        assert!(!view_b.cancel_token().is_cancelled());
        root.cancel();
        assert!(view_b.cancel_token().is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_scope_fails_fast() {
        let api = HttpSupportApi::new("http://127.0.0.1:9", None).expect("client");
        api.cancel();
        let err = api.fetch_tickets().await.expect_err("cancelled");
        assert!(matches!(err, SupportError::Cancelled));
    }

    #[tokio::test]
    async fn unreachable_status_is_reported_not_raised() {
        // Port 9 (discard) is closed on test hosts; the connect fails immediately.
        let api = HttpSupportApi::new("http://127.0.0.1:9", Some(Duration::from_secs(2)))
            .expect("client");
        let payload = api.fetch_status().await;
        assert!(payload.is_error());
        assert!(!payload.ollama_connected);
        assert!(payload.message.is_some_and(|m| !m.is_empty()));
    }
}
