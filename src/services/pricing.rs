//! Quote calculation.
//!
//! Pure functions over constant rate tables. Every caller (the public quote
//! tool, stored quote requests, chatbot hints) goes through
//! [`calculate_quote`] so there is one source of truth for prices.

use chrono::{DateTime, Duration, Utc};

use crate::domain::quotes::{
    BreakdownItem, Complexity, ProjectRequest, ProjectType, QuoteResult, Urgency,
};

/// Share of the total attributed to materials; the rest is labor.
pub const MATERIALS_SHARE: f64 = 0.4;
pub const LABOR_SHARE: f64 = 0.6;

pub const QUOTE_VALIDITY_DAYS: i64 = 30;

/// Surface (m²) above which duration starts scaling linearly
const DURATION_SIZE_UNIT: f64 = 100.0;

const DEFAULT_BASE_RATE: f64 = 50.0;
const DEFAULT_BASE_DURATION_DAYS: f64 = 2.0;

const GENERIC_BREAKDOWN: &[(&str, f64)] = &[("Materialen", 0.7), ("Overige kosten", 0.3)];

/// Base rate in euro per m²
pub fn base_rate(project_type: &ProjectType) -> f64 {
    match project_type {
        ProjectType::Isolatiewerken => 45.0,
        ProjectType::Renovatiewerken => 60.0,
        ProjectType::Dakwerken => 55.0,
        ProjectType::Gevelwerken => 40.0,
        ProjectType::Schilderwerken => 25.0,
        ProjectType::Other(_) => DEFAULT_BASE_RATE,
    }
}

/// Working days for a job of up to 100 m² at simple complexity
pub fn base_duration_days(project_type: &ProjectType) -> f64 {
    match project_type {
        ProjectType::Isolatiewerken => 1.0,
        ProjectType::Renovatiewerken => 4.0,
        ProjectType::Dakwerken => 3.0,
        ProjectType::Gevelwerken => 2.0,
        ProjectType::Schilderwerken => 1.0,
        ProjectType::Other(_) => DEFAULT_BASE_DURATION_DAYS,
    }
}

pub fn complexity_cost_multiplier(complexity: &Complexity) -> f64 {
    match complexity {
        Complexity::Simple => 1.0,
        Complexity::Medium => 1.3,
        Complexity::Complex => 1.6,
        Complexity::Other(_) => 1.0,
    }
}

pub fn complexity_duration_multiplier(complexity: &Complexity) -> f64 {
    match complexity {
        Complexity::Simple => 1.0,
        Complexity::Medium => 1.5,
        Complexity::Complex => 2.0,
        Complexity::Other(_) => 1.0,
    }
}

pub fn urgency_multiplier(urgency: &Urgency) -> f64 {
    match urgency {
        Urgency::Normal => 1.0,
        Urgency::Urgent => 1.2,
        Urgency::Asap => 1.5,
        Urgency::Other(_) => 1.0,
    }
}

/// Materials line items with their share of the materials cost.
/// Shares sum to 1.0 for every category.
pub fn breakdown_split(project_type: &ProjectType) -> &'static [(&'static str, f64)] {
    match project_type {
        ProjectType::Isolatiewerken => &[
            ("Isolatiemateriaal", 0.7),
            ("Bevestigingsmateriaal", 0.2),
            ("Afwerking", 0.1),
        ],
        ProjectType::Renovatiewerken => &[
            ("Bouwmaterialen", 0.5),
            ("Afwerkingsmaterialen", 0.3),
            ("Sanitair en elektra", 0.2),
        ],
        ProjectType::Dakwerken => &[
            ("Dakbedekking", 0.6),
            ("Dakisolatie", 0.25),
            ("Goten en afvoer", 0.15),
        ],
        ProjectType::Gevelwerken => &[
            ("Gevelmateriaal", 0.65),
            ("Voegwerk", 0.2),
            ("Reiniging en impregnatie", 0.15),
        ],
        ProjectType::Schilderwerken => &[
            ("Verf en lakken", 0.6),
            ("Voorbereiding ondergrond", 0.4),
        ],
        ProjectType::Other(_) => GENERIC_BREAKDOWN,
    }
}

/// Price per m² after complexity and urgency surcharges
pub fn rate_per_area(project_type: &ProjectType, complexity: &Complexity, urgency: &Urgency) -> f64 {
    base_rate(project_type) * complexity_cost_multiplier(complexity) * urgency_multiplier(urgency)
}

/// Estimated working days, rounded up.
///
/// Sizes up to 100 m² take the base duration; larger jobs scale linearly.
pub fn calculate_duration(project_type: &ProjectType, size: f64, complexity: &Complexity) -> u32 {
    let size_multiplier = (size / DURATION_SIZE_UNIT).max(1.0);
    let days = base_duration_days(project_type)
        * complexity_duration_multiplier(complexity)
        * size_multiplier;

    days.ceil() as u32
}

/// Allocate the materials cost over the category line items.
///
/// Each line is rounded on its own, so the sum can differ from
/// `materials_cost` by a few euros.
pub fn generate_breakdown(project_type: &ProjectType, materials_cost: i64) -> Vec<BreakdownItem> {
    breakdown_split(project_type)
        .iter()
        .map(|(item, share)| BreakdownItem {
            item: (*item).to_string(),
            cost: (materials_cost as f64 * share).round() as i64,
        })
        .collect()
}

/// Calculate a complete quote for a project issued at `issued_at`.
///
/// Never fails: unknown categories and tiers are priced with the defaults.
pub fn calculate_quote(request: &ProjectRequest, issued_at: DateTime<Utc>) -> QuoteResult {
    let rate = rate_per_area(&request.project_type, &request.complexity, &request.urgency);

    let materials_cost = (request.size * rate * MATERIALS_SHARE).round() as i64;
    let labor_cost = (request.size * rate * LABOR_SHARE).round() as i64;
    let total_cost = materials_cost + labor_cost;

    QuoteResult {
        project_type: request.project_type.clone(),
        size: request.size,
        complexity: request.complexity.clone(),
        location: request.location.clone(),
        urgency: request.urgency.clone(),
        total_cost,
        materials_cost,
        labor_cost,
        duration: calculate_duration(&request.project_type, request.size, &request.complexity),
        breakdown: generate_breakdown(&request.project_type, materials_cost),
        valid_until: issued_at + Duration::days(QUOTE_VALIDITY_DAYS),
    }
}
