use crate::cli::{Cli, Command, CreateArgs, ListArgs};
use crate::notify::Notifier;
use crate::render;
use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use support_core::stats::{
    category_distribution, priority_distribution, recent_tickets, ticket_stats, RECENT_TICKET_LIMIT,
};
use support_core::tickets::{find_ticket, load_tickets, submit_ticket};
use support_core::{
    AgentStatus, DashboardConfig, HttpSupportApi, StatusMonitor, SupportError, Ticket,
    TicketAnalyzer,
};

pub struct Context {
    pub config: DashboardConfig,
    pub api: Arc<HttpSupportApi>,
    pub notifier: Notifier,
}

impl Context {
    pub fn new(config: DashboardConfig) -> Result<Self> {
        let api = Arc::new(HttpSupportApi::from_config(&config)?);
        Ok(Self {
            notifier: Notifier::new(config.notifications),
            config,
            api,
        })
    }

    fn monitor(&self, api: Arc<HttpSupportApi>) -> Arc<StatusMonitor<HttpSupportApi>> {
        Arc::new(StatusMonitor::new(api, self.config.default_model.clone()))
    }
}

/// One refresh; falls back to the monitor's current value when skipped.
async fn check_agent(monitor: &StatusMonitor<HttpSupportApi>) -> AgentStatus {
    match monitor.refresh().await {
        Some(status) => status,
        None => monitor.current(),
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = cli.load_config()?;
    tracing::debug!(api = %config.api_base_url, "configuration loaded");
    let ctx = Context::new(config)?;

    match cli.command {
        Command::Status => status(&ctx).await,
        Command::Watch { interval } => watch(&ctx, interval).await,
        Command::Dashboard { follow } => dashboard(&ctx, follow).await,
        Command::List(args) => list(&ctx, &args).await,
        Command::Show { id, json } => show(&ctx, &id, json).await,
        Command::Create(args) => create(&ctx, args).await,
        Command::Analyze { id, model, json } => analyze(&ctx, &id, model, json).await,
    }
}

pub async fn status(ctx: &Context) -> Result<()> {
    let monitor = ctx.monitor(ctx.api.clone());
    let agent = check_agent(&monitor).await;
    println!("{}", render::status_line(&agent, Utc::now()));
    Ok(())
}

pub async fn watch(ctx: &Context, interval: Option<u64>) -> Result<()> {
    let interval = interval.map_or_else(|| ctx.config.poll_interval(), Duration::from_secs);
    if interval.is_zero() {
        bail!("interval must be at least one second");
    }

    let monitor = ctx.monitor(ctx.api.clone());
    let mut updates = monitor.subscribe();
    let poller = monitor.spawn_polling(interval);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut was_connected: Option<bool> = None;
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let agent = updates.borrow_and_update().clone();
                println!("{}", render::status_line(&agent, Utc::now()));
                match was_connected {
                    Some(false) if agent.connected => ctx.notifier.success("AI agent reconnected"),
                    Some(true) if !agent.connected => ctx.notifier.error("AI agent is disconnected"),
                    _ => {}
                }
                was_connected = Some(agent.connected);
            }
            _ = &mut ctrl_c => break,
        }
    }

    monitor.shutdown();
    let _ = poller.await;
    Ok(())
}

pub async fn dashboard(ctx: &Context, follow: bool) -> Result<()> {
    let follow = follow || ctx.config.auto_refresh;
    let monitor = ctx.monitor(ctx.api.clone());
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let (tickets, agent) = tokio::join!(load_tickets(ctx.api.as_ref()), check_agent(&monitor));
        let frame = dashboard_frame(tickets, &agent, Utc::now(), follow, &ctx.notifier)?;
        println!("{frame}");

        if !follow {
            return Ok(());
        }
        tokio::select! {
            _ = tokio::time::sleep(ctx.config.poll_interval()) => println!(),
            _ = &mut ctrl_c => return Ok(()),
        }
    }
}

/// One screen of the dashboard. While following, a failed ticket load is
/// shown as an error state and the next interval tries again; a one-shot
/// run returns the error.
fn dashboard_frame(
    tickets: Result<Vec<Ticket>, SupportError>,
    agent: &AgentStatus,
    now: DateTime<Utc>,
    follow: bool,
    notifier: &Notifier,
) -> Result<String, SupportError> {
    let tickets = match tickets {
        Ok(tickets) => tickets,
        Err(e) if follow => {
            tracing::warn!(error = %e, "dashboard refresh failed");
            notifier.error(&format!("Failed to load tickets: {e}"));
            return Ok(render::dashboard_unavailable(agent, &e, now));
        }
        Err(e) => return Err(e),
    };

    Ok(format!(
        "{}\n\n{}\n\n{}\n\n{}\n\nRecent tickets\n{}",
        render::status_line(agent, now),
        render::stats_panel(&ticket_stats(&tickets)),
        render::category_chart(&category_distribution(&tickets)),
        render::priority_chart(&priority_distribution(&tickets)),
        render::ticket_table(&recent_tickets(&tickets, RECENT_TICKET_LIMIT), now)
    ))
}

pub async fn list(ctx: &Context, args: &ListArgs) -> Result<()> {
    let tickets = load_tickets(ctx.api.as_ref()).await?;
    let filter = args.filter();
    let hits = filter.apply(&tickets);
    tracing::debug!(shown = hits.len(), total = tickets.len(), "tickets filtered");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
    } else {
        println!("{}", render::ticket_table(&hits, Utc::now()));
    }
    Ok(())
}

pub async fn show(ctx: &Context, id: &str, json: bool) -> Result<()> {
    let ticket = find_ticket(ctx.api.as_ref(), id).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&ticket)?);
    } else {
        println!("{}", render::ticket_detail(&ticket, Utc::now()));
    }
    Ok(())
}

pub async fn create(ctx: &Context, args: CreateArgs) -> Result<()> {
    match submit_ticket(ctx.api.as_ref(), args.into_form()).await {
        Ok(ticket) => {
            ctx.notifier
                .success(&format!("Ticket #{} has been created", ticket.id));
            list(ctx, &ListArgs::default()).await
        }
        Err(SupportError::Validation(errors)) => {
            for e in &errors.0 {
                eprintln!("  {}: {}", e.field, e.message);
            }
            bail!("ticket not created, {} field(s) invalid", errors.0.len())
        }
        Err(e) => {
            ctx.notifier.error(&format!("Failed to create ticket: {e}"));
            Err(e.into())
        }
    }
}

pub async fn analyze(ctx: &Context, id: &str, model: Option<String>, json: bool) -> Result<()> {
    let scope = Arc::new(ctx.api.scoped());
    let ticket = find_ticket(scope.as_ref(), id).await?;
    let agent = check_agent(&ctx.monitor(scope.clone())).await;
    let model = model
        .or_else(|| ctx.config.analysis_model.clone())
        .unwrap_or_else(|| agent.model.clone());

    ctx.notifier
        .info(&format!("Analyzing ticket #{} with {model}", ticket.id));
    let analyzer = TicketAnalyzer::new(scope.clone());
    let result = tokio::select! {
        r = analyzer.analyze(&ticket, &agent, &model) => r,
        _ = tokio::signal::ctrl_c() => {
            scope.cancel();
            Err(SupportError::Cancelled)
        }
    };

    match result {
        Ok(report) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", render::analysis_report(&report));
            }
            Ok(())
        }
        Err(SupportError::AgentDisconnected) => {
            ctx.notifier
                .error("AI agent is disconnected. Cannot analyze ticket.");
            Err(SupportError::AgentDisconnected.into())
        }
        Err(e) => {
            ctx.notifier.error(&format!("Analysis failed: {e}"));
            Err(e.into())
        }
    }
}
