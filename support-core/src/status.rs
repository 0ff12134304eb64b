use crate::client::SupportApi;
use crate::model::AgentStatus;
use crate::wire::StatusPayload;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Derives the next agent status from one status payload. The previous value
/// only contributes its model name, and only when the backend lists none.
pub fn derive_status(
    payload: &StatusPayload,
    previous: &AgentStatus,
    default_model: &str,
    now: DateTime<Utc>,
) -> AgentStatus {
    let model = match payload.first_model() {
        Some(name) => name.to_string(),
        None if payload.is_error() => previous.model.clone(),
        None => default_model.to_string(),
    };

    let error = if payload.ollama_connected && !payload.is_error() {
        None
    } else {
        Some(
            payload
                .message
                .clone()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "AI agent is not reachable".to_string()),
        )
    };

    AgentStatus {
        connected: payload.ollama_connected && !payload.is_error(),
        model,
        last_checked: now,
        response_time: payload
            .response_time
            .filter(|ms| ms.is_finite() && *ms >= 0.0)
            .map(|ms| ms.round() as u64),
        error,
    }
}

/// Owns the single current [`AgentStatus`]. Readers subscribe to a watch
/// channel; refreshes never overlap and stop once the monitor is shut down.
pub struct StatusMonitor<A: ?Sized> {
    api: Arc<A>,
    default_model: String,
    state: watch::Sender<AgentStatus>,
    in_flight: AtomicBool,
    cancel: CancellationToken,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<A> StatusMonitor<A>
where
    A: SupportApi + ?Sized + 'static,
{
    pub fn new(api: Arc<A>, default_model: impl Into<String>) -> Self {
        let default_model = default_model.into();
        let (state, _) = watch::channel(AgentStatus::unknown(default_model.clone(), Utc::now()));
        Self {
            api,
            default_model,
            state,
            in_flight: AtomicBool::new(false),
            cancel: CancellationToken::new(),
        }
    }

    pub fn current(&self) -> AgentStatus {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AgentStatus> {
        self.state.subscribe()
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Polls once. Returns `None` when another refresh is already running or
    /// the monitor has been shut down; the current status is left untouched.
    pub async fn refresh(&self) -> Option<AgentStatus> {
        if self.cancel.is_cancelled() {
            return None;
        }
        if self.in_flight.swap(true, Ordering::AcqRel) {
            tracing::debug!("status refresh already in flight, skipping");
            return None;
        }
        let _guard = InFlight(&self.in_flight);

        let payload = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return None,
            payload = self.api.fetch_status() => payload,
        };

        let next = derive_status(&payload, &self.state.borrow(), &self.default_model, Utc::now());
        if next.connected {
            tracing::debug!(model = %next.model, "agent connected");
        } else {
            tracing::warn!(error = ?next.error, "agent disconnected");
        }
        self.state.send_replace(next.clone());
        Some(next)
    }

    /// Refreshes now and then every `interval` until [`StatusMonitor::shutdown`].
    pub fn spawn_polling(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = monitor.cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        monitor.refresh().await;
                    }
                }
            }
            tracing::debug!("status polling stopped");
        })
    }

    /// Stops polling and aborts an in-flight refresh; its result is discarded.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}
