use serde::Serialize;
use ticket_registry::TicketCategory;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KnowledgeArticle {
    pub id: &'static str,
    pub title: &'static str,
    pub category: &'static str,
    pub content: &'static str,
}

pub const ARTICLES: [KnowledgeArticle; 3] = [
    KnowledgeArticle {
        id: "KB001",
        title: "Common Login Issues",
        category: "authentication",
        content: "If users are having trouble logging in, check their credentials and ensure the authentication service is running.",
    },
    KnowledgeArticle {
        id: "KB002",
        title: "Payment Processing",
        category: "billing",
        content: "For payment processing issues, verify the payment gateway connection and check for any error codes in the logs.",
    },
    KnowledgeArticle {
        id: "KB003",
        title: "Mobile App Troubleshooting",
        category: "technical",
        content: "For mobile app issues, check the device compatibility, OS version, and ensure the app is up to date.",
    },
];

/// Articles filed under the knowledge-base category a ticket category maps to.
/// Account problems are indexed as authentication.
pub fn articles_for(category: TicketCategory) -> impl Iterator<Item = &'static KnowledgeArticle> {
    let wanted = match category {
        TicketCategory::Account => "authentication",
        other => other.as_str(),
    };
    ARTICLES.iter().filter(move |a| a.category == wanted)
}
