//! Client side of the support desk: typed backend access, agent health
//! tracking, ticket analysis and the list/statistics views' data shaping.

pub mod analysis;
pub mod client;
pub mod config;
pub mod display;
pub mod error;
pub mod filter;
pub mod model;
pub mod stats;
pub mod status;
pub mod tickets;
pub mod wire;

pub use analysis::{AnalysisReport, TicketAnalyzer};
pub use client::{HttpSupportApi, SupportApi};
pub use config::DashboardConfig;
pub use error::SupportError;
pub use filter::TicketFilter;
pub use model::{AgentStatus, References, Ticket, TicketAnalysis, TicketSolution};
pub use status::StatusMonitor;
pub use ticket_registry::{NewTicket, TicketCategory, TicketPriority, TicketStatus};
