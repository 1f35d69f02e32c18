//! Quote domain types
//!
//! Project categories and pricing tiers are closed sets with an explicit
//! `Other` arm. Unknown values are kept verbatim so they round-trip through
//! the API and the database, while pricing falls back to default rates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Renovation work category offered on the website
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProjectType {
    Isolatiewerken,
    Renovatiewerken,
    Dakwerken,
    Gevelwerken,
    Schilderwerken,
    /// Unrecognized category; priced with the default rate
    Other(String),
}

impl ProjectType {
    pub const KNOWN: [ProjectType; 5] = [
        ProjectType::Isolatiewerken,
        ProjectType::Renovatiewerken,
        ProjectType::Dakwerken,
        ProjectType::Gevelwerken,
        ProjectType::Schilderwerken,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Isolatiewerken => "isolatiewerken",
            Self::Renovatiewerken => "renovatiewerken",
            Self::Dakwerken => "dakwerken",
            Self::Gevelwerken => "gevelwerken",
            Self::Schilderwerken => "schilderwerken",
            Self::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for ProjectType {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "isolatiewerken" => Self::Isolatiewerken,
            "renovatiewerken" => Self::Renovatiewerken,
            "dakwerken" => Self::Dakwerken,
            "gevelwerken" => Self::Gevelwerken,
            "schilderwerken" => Self::Schilderwerken,
            _ => Self::Other(raw),
        }
    }
}

impl From<ProjectType> for String {
    fn from(t: ProjectType) -> Self {
        match t {
            ProjectType::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse labor difficulty bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum Complexity {
    #[default]
    Simple,
    Medium,
    Complex,
    Other(String),
}

impl Complexity {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Simple => "simple",
            Self::Medium => "medium",
            Self::Complex => "complex",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for Complexity {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "simple" => Self::Simple,
            "medium" => Self::Medium,
            "complex" => Self::Complex,
            _ => Self::Other(raw),
        }
    }
}

impl From<Complexity> for String {
    fn from(c: Complexity) -> Self {
        match c {
            Complexity::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rush pricing bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum Urgency {
    #[default]
    Normal,
    Urgent,
    Asap,
    Other(String),
}

impl Urgency {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Normal => "normal",
            Self::Urgent => "urgent",
            Self::Asap => "asap",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for Urgency {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "normal" => Self::Normal,
            "urgent" => Self::Urgent,
            "asap" => Self::Asap,
            _ => Self::Other(raw),
        }
    }
}

impl From<Urgency> for String {
    fn from(u: Urgency) -> Self {
        match u {
            Urgency::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Project description submitted by a visitor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRequest {
    pub project_type: ProjectType,
    /// Surface in m²
    pub size: f64,
    #[serde(default)]
    pub complexity: Complexity,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub urgency: Urgency,
}

/// One line of the materials allocation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BreakdownItem {
    pub item: String,
    pub cost: i64,
}

/// Calculated price estimate. Monetary values are whole euros.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResult {
    pub project_type: ProjectType,
    pub size: f64,
    pub complexity: Complexity,
    pub location: String,
    pub urgency: Urgency,
    pub total_cost: i64,
    pub materials_cost: i64,
    pub labor_cost: i64,
    /// Working days
    pub duration: u32,
    pub breakdown: Vec<BreakdownItem>,
    pub valid_until: DateTime<Utc>,
}

/// Response for `POST /api/ai-tools/generate-quote`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuoteResponse {
    pub success: bool,
    pub quote: QuoteResult,
    pub generated_at: DateTime<Utc>,
}

/// Follow-up state of a stored quote request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    #[default]
    New,
    Contacted,
    Accepted,
    Rejected,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuoteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "contacted" => Ok(Self::Contacted),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown quote status '{}'", other)),
        }
    }
}

/// Contact details attached to a quote request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContactDetails {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Request DTO for `POST /api/quotes`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuoteRequest {
    #[serde(flatten)]
    pub project: ProjectRequest,
    #[serde(flatten)]
    pub contact: ContactDetails,
}

/// Persisted quote request as shown in the back-office
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredQuote {
    pub id: Uuid,
    #[serde(flatten)]
    pub quote: QuoteResult,
    pub contact: ContactDetails,
    pub status: QuoteStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for `PATCH /api/admin/quotes/:id/status`
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateQuoteStatusRequest {
    pub status: QuoteStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn project_type_parses_case_insensitively() {
        assert_eq!(
            ProjectType::from(" Isolatiewerken ".to_string()),
            ProjectType::Isolatiewerken
        );
        assert_eq!(
            ProjectType::from("DAKWERKEN".to_string()),
            ProjectType::Dakwerken
        );
    }

    #[test]
    fn unknown_values_are_kept_verbatim() {
        let t = ProjectType::from("Tuinaanleg".to_string());
        assert_eq!(t, ProjectType::Other("Tuinaanleg".to_string()));
        assert!(!t.is_known());
        assert_eq!(String::from(t), "Tuinaanleg");

        let u = Urgency::from("gisteren".to_string());
        assert_eq!(u.as_str(), "gisteren");
    }

    #[test]
    fn project_request_defaults_optional_tiers() {
        let req: ProjectRequest =
            serde_json::from_str(r#"{"projectType":"gevelwerken","size":80}"#).unwrap();

        assert_eq!(req.project_type, ProjectType::Gevelwerken);
        assert_eq!(req.complexity, Complexity::Simple);
        assert_eq!(req.urgency, Urgency::Normal);
        assert_eq!(req.location, "");
    }

    #[test]
    fn create_quote_request_flattens_project_and_contact() {
        let req: CreateQuoteRequest = serde_json::from_str(
            r#"{
                "projectType": "dakwerken",
                "size": 120,
                "complexity": "medium",
                "urgency": "urgent",
                "location": "Gent",
                "name": "An Peeters",
                "email": "an@example.be"
            }"#,
        )
        .unwrap();

        assert_eq!(req.project.project_type, ProjectType::Dakwerken);
        assert_eq!(req.project.complexity, Complexity::Medium);
        assert_eq!(req.contact.name, "An Peeters");
        assert_eq!(req.contact.phone, None);
    }

    #[test]
    fn quote_status_round_trips_through_text() {
        for status in [
            QuoteStatus::New,
            QuoteStatus::Contacted,
            QuoteStatus::Accepted,
            QuoteStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<QuoteStatus>(), Ok(status));
        }
        assert!("archived".parse::<QuoteStatus>().is_err());
    }
}
