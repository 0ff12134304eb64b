use crate::client::SupportApi;
use crate::error::SupportError;
use crate::model::Ticket;
use chrono::Utc;
use ticket_registry::{validate_new_ticket, NewTicket};

/// Lists tickets, dropping records the backend sent without an id.
pub async fn load_tickets<A>(api: &A) -> Result<Vec<Ticket>, SupportError>
where
    A: SupportApi + ?Sized,
{
    let raw = api.fetch_tickets().await?;
    let now = Utc::now();
    let total = raw.len();
    let tickets: Vec<Ticket> = raw
        .into_iter()
        .filter_map(|r| match r.into_ticket(now) {
            Ok(t) => Some(t),
            Err(e) => {
                tracing::warn!(error = %e, "skipping ticket record");
                None
            }
        })
        .collect();
    tracing::debug!(loaded = tickets.len(), total, "tickets loaded");
    Ok(tickets)
}

pub async fn find_ticket<A>(api: &A, id: &str) -> Result<Ticket, SupportError>
where
    A: SupportApi + ?Sized,
{
    api.fetch_ticket(id).await?.into_ticket(Utc::now())
}

/// Validates the form locally; nothing is sent unless every field passes.
pub async fn submit_ticket<A>(api: &A, form: NewTicket) -> Result<Ticket, SupportError>
where
    A: SupportApi + ?Sized,
{
    let form = form.normalized();
    validate_new_ticket(&form)?;
    let created = api.create_ticket(&form).await?.into_ticket(Utc::now())?;
    tracing::info!(ticket_id = %created.id, "ticket created");
    Ok(created)
}
