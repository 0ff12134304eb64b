use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use support_core::{DashboardConfig, NewTicket, TicketCategory, TicketFilter, TicketPriority, TicketStatus};

#[derive(Parser, Debug)]
#[command(name = "supportctl")]
#[command(about = "Support desk dashboard for the terminal", long_about = None)]
#[command(version)]
pub struct Cli {
    /// TOML settings file
    #[arg(long, global = true, env = "SUPPORT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Backend base URL, overrides the settings file
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Log at info level instead of warn
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check the AI agent once
    Status,

    /// Keep polling the AI agent until interrupted
    Watch {
        /// Seconds between checks, defaults to the configured poll interval
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Ticket statistics, distributions and the most recent tickets
    Dashboard {
        /// Re-render on every poll interval
        #[arg(long)]
        follow: bool,
    },

    /// List tickets, optionally filtered
    List(ListArgs),

    /// Show one ticket
    Show {
        id: String,
        #[arg(long)]
        json: bool,
    },

    /// Open a new ticket
    Create(CreateArgs),

    /// Run AI analysis on a ticket
    Analyze {
        id: String,

        /// Model to analyze with, defaults to the one the agent reports
        #[arg(long)]
        model: Option<String>,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Case-insensitive text matched against subject, description, customer and id
    #[arg(short, long, default_value = "")]
    pub search: String,

    #[arg(long = "category", value_name = "CATEGORY")]
    pub categories: Vec<TicketCategory>,

    #[arg(long = "priority", value_name = "PRIORITY")]
    pub priorities: Vec<TicketPriority>,

    #[arg(long = "status", value_name = "STATUS")]
    pub statuses: Vec<TicketStatus>,

    #[arg(long)]
    pub json: bool,
}

impl ListArgs {
    pub fn filter(&self) -> TicketFilter {
        TicketFilter {
            query: self.search.clone(),
            categories: self.categories.iter().copied().collect(),
            priorities: self.priorities.iter().copied().collect(),
            statuses: self.statuses.iter().copied().collect(),
        }
    }
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[arg(long)]
    pub subject: String,

    #[arg(long)]
    pub description: String,

    /// Customer name
    #[arg(long = "name")]
    pub customer_name: String,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long, default_value = "general")]
    pub category: TicketCategory,

    #[arg(long, default_value = "medium")]
    pub priority: TicketPriority,
}

impl CreateArgs {
    pub fn into_form(self) -> NewTicket {
        NewTicket {
            subject: self.subject,
            description: self.description,
            customer_name: self.customer_name,
            customer_email: self.email,
            category: self.category,
            priority: self.priority,
        }
    }
}

impl Cli {
    /// Settings file and `SUPPORT_*` variables, then `--api-url`.
    pub fn load_config(&self) -> Result<DashboardConfig> {
        let mut config = DashboardConfig::load(self.config.as_deref())?;
        if let Some(url) = &self.api_url {
            config.api_base_url = url.clone();
            config.validate()?;
        }
        Ok(config)
    }
}
