//! Quote endpoints
//!
//! Public:
//! - `POST /api/ai-tools/generate-quote`: instant estimate, nothing stored
//! - `POST /api/quotes`: quote request form, stored for follow-up
//!
//! Back-office:
//! - `GET /api/admin/quotes`, `GET /api/admin/quotes/:id`
//! - `PATCH /api/admin/quotes/:id/status`

use axum::{extract::State, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{
    Created, DataResponse, Paginated, PaginationParams, ValidJson, ValidPath, ValidQuery,
};
use crate::app::AppState;
use crate::auth::RequireAdmin;
use crate::domain::quotes::{
    BreakdownItem, ContactDetails, CreateQuoteRequest, GenerateQuoteResponse, ProjectRequest,
    QuoteResult, QuoteStatus, StoredQuote, UpdateQuoteStatusRequest,
};
use crate::error::{ApiError, ApiResult};
use crate::services::pricing;

/// Largest surface accepted from the public forms (m²)
const MAX_SIZE_M2: f64 = 100_000.0;

const QUOTE_COLUMNS: &str = r#"
    id, project_type, size, complexity, urgency, location,
    total_cost, materials_cost, labor_cost, duration_days, breakdown, valid_until,
    contact_name, contact_email, contact_phone, message, status, created_at, updated_at
"#;

/// Database row for a stored quote
#[derive(Debug, sqlx::FromRow)]
struct QuoteRow {
    id: Uuid,
    project_type: String,
    size: f64,
    complexity: String,
    urgency: String,
    location: String,
    total_cost: i64,
    materials_cost: i64,
    labor_cost: i64,
    duration_days: i32,
    breakdown: sqlx::types::Json<Vec<BreakdownItem>>,
    valid_until: DateTime<Utc>,
    contact_name: String,
    contact_email: String,
    contact_phone: Option<String>,
    message: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<QuoteRow> for StoredQuote {
    type Error = ApiError;

    fn try_from(row: QuoteRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<QuoteStatus>()
            .map_err(|e| ApiError::internal(format!("Corrupt quote row {}: {}", row.id, e)))?;

        Ok(Self {
            id: row.id,
            quote: QuoteResult {
                project_type: row.project_type.into(),
                size: row.size,
                complexity: row.complexity.into(),
                location: row.location,
                urgency: row.urgency.into(),
                total_cost: row.total_cost,
                materials_cost: row.materials_cost,
                labor_cost: row.labor_cost,
                duration: row.duration_days.max(0) as u32,
                breakdown: row.breakdown.0,
                valid_until: row.valid_until,
            },
            contact: ContactDetails {
                name: row.contact_name,
                email: row.contact_email,
                phone: row.contact_phone,
                message: row.message,
            },
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Reject inputs the calculator would turn into degenerate quotes.
fn validate_project(req: &ProjectRequest) -> ApiResult<()> {
    if req.project_type.as_str().trim().is_empty() {
        return Err(ApiError::BadRequest("projectType is required".to_string()));
    }
    if !req.size.is_finite() || req.size <= 0.0 {
        return Err(ApiError::BadRequest("size must be a number greater than 0".to_string()));
    }
    if req.size > MAX_SIZE_M2 {
        return Err(ApiError::BadRequest(format!(
            "size must be at most {} m²",
            MAX_SIZE_M2
        )));
    }
    Ok(())
}

fn validate_contact(contact: &ContactDetails) -> ApiResult<()> {
    if contact.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name is required".to_string()));
    }
    let email = contact.email.trim();
    let valid_email = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid_email {
        return Err(ApiError::BadRequest("a valid email is required".to_string()));
    }
    Ok(())
}

fn quote_for(req: &ProjectRequest, issued_at: DateTime<Utc>) -> QuoteResult {
    if !req.project_type.is_known() {
        tracing::warn!(
            project_type = %req.project_type,
            "Unknown project type, pricing with default rates"
        );
    }
    pricing::calculate_quote(req, issued_at)
}

/// POST /api/ai-tools/generate-quote
///
/// Instant price estimate for the website quote tool.
pub async fn generate_quote(
    ValidJson(req): ValidJson<ProjectRequest>,
) -> ApiResult<Json<GenerateQuoteResponse>> {
    validate_project(&req)?;

    let generated_at = Utc::now();
    let quote = quote_for(&req, generated_at);

    tracing::info!(
        project_type = %quote.project_type,
        size = quote.size,
        total_cost = quote.total_cost,
        duration = quote.duration,
        "Quote generated"
    );

    Ok(Json(GenerateQuoteResponse {
        success: true,
        quote,
        generated_at,
    }))
}

/// POST /api/quotes
///
/// Store a quote request with contact details for the sales team.
pub async fn create_quote(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<CreateQuoteRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_project(&req.project)?;
    validate_contact(&req.contact)?;

    let now = Utc::now();
    let quote = quote_for(&req.project, now);

    let row = sqlx::query_as::<_, QuoteRow>(&format!(
        r#"
        INSERT INTO quotes (
            id, project_type, size, complexity, urgency, location,
            total_cost, materials_cost, labor_cost, duration_days, breakdown, valid_until,
            contact_name, contact_email, contact_phone, message, status, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $18)
        RETURNING {}
        "#,
        QUOTE_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(quote.project_type.as_str())
    .bind(quote.size)
    .bind(quote.complexity.as_str())
    .bind(quote.urgency.as_str())
    .bind(&quote.location)
    .bind(quote.total_cost)
    .bind(quote.materials_cost)
    .bind(quote.labor_cost)
    .bind(quote.duration as i32)
    .bind(sqlx::types::Json(&quote.breakdown))
    .bind(quote.valid_until)
    .bind(req.contact.name.trim())
    .bind(req.contact.email.trim())
    .bind(req.contact.phone.as_deref())
    .bind(req.contact.message.as_deref())
    .bind(QuoteStatus::New.as_str())
    .bind(now)
    .fetch_one(&state.db)
    .await?;

    let stored = StoredQuote::try_from(row)?;

    tracing::info!(
        quote_id = %stored.id,
        project_type = %stored.quote.project_type,
        total_cost = stored.quote.total_cost,
        "Quote request stored"
    );

    Ok(Created(DataResponse::new(stored)))
}

/// Query parameters for the back-office quote list
#[derive(Debug, Deserialize, Default)]
pub struct QuoteListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<QuoteStatus>,
}

impl QuoteListQuery {
    fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

/// GET /api/admin/quotes
pub async fn list_quotes(
    admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    ValidQuery(query): ValidQuery<QuoteListQuery>,
) -> ApiResult<impl IntoResponse> {
    let pagination = query.pagination();
    let status = query.status.map(|s| s.as_str());

    tracing::debug!(
        user_id = %admin.user_id,
        page = pagination.page(),
        status = ?status,
        "Listing quotes"
    );

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM quotes WHERE ($1::text IS NULL OR status = $1)",
    )
    .bind(status)
    .fetch_one(&state.db)
    .await?;

    let rows = sqlx::query_as::<_, QuoteRow>(&format!(
        r#"
        SELECT {}
        FROM quotes
        WHERE ($1::text IS NULL OR status = $1)
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
        QUOTE_COLUMNS
    ))
    .bind(status)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(&state.db)
    .await?;

    let quotes = rows
        .into_iter()
        .map(StoredQuote::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Paginated::new(quotes, &pagination, total.max(0) as u64))
}

/// GET /api/admin/quotes/:id
pub async fn get_quote(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    ValidPath(quote_id): ValidPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let row = sqlx::query_as::<_, QuoteRow>(&format!(
        "SELECT {} FROM quotes WHERE id = $1",
        QUOTE_COLUMNS
    ))
    .bind(quote_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("Quote {} not found", quote_id)))?;

    Ok(DataResponse::new(StoredQuote::try_from(row)?))
}

/// PATCH /api/admin/quotes/:id/status
pub async fn update_quote_status(
    admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    ValidPath(quote_id): ValidPath<Uuid>,
    ValidJson(req): ValidJson<UpdateQuoteStatusRequest>,
) -> ApiResult<impl IntoResponse> {
    let row = sqlx::query_as::<_, QuoteRow>(&format!(
        r#"
        UPDATE quotes SET status = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        QUOTE_COLUMNS
    ))
    .bind(quote_id)
    .bind(req.status.as_str())
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("Quote {} not found", quote_id)))?;

    tracing::info!(
        user_id = %admin.user_id,
        quote_id = %quote_id,
        status = %req.status,
        "Quote status updated"
    );

    Ok(DataResponse::new(StoredQuote::try_from(row)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::{bearer_token, test_app};
    use crate::domain::quotes::ProjectType;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    async fn post_json(uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let resp = test_app().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn generate_quote_returns_calculated_quote() {
        let (status, body) = post_json(
            "/api/ai-tools/generate-quote",
            r#"{"projectType":"isolatiewerken","size":100,"complexity":"simple","location":"Brugge","urgency":"normal"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["quote"]["totalCost"], 4500);
        assert_eq!(body["quote"]["materialsCost"], 1800);
        assert_eq!(body["quote"]["laborCost"], 2700);
        assert_eq!(body["quote"]["duration"], 1);
        assert_eq!(body["quote"]["location"], "Brugge");
        assert_eq!(body["quote"]["breakdown"][0]["item"], "Isolatiemateriaal");
        assert!(body["generatedAt"].is_string());

        let generated: DateTime<Utc> = body["generatedAt"].as_str().unwrap().parse().unwrap();
        let valid_until: DateTime<Utc> = body["quote"]["validUntil"].as_str().unwrap().parse().unwrap();
        assert_eq!(valid_until - generated, chrono::Duration::days(30));
    }

    #[tokio::test]
    async fn generate_quote_accepts_unknown_category() {
        let (status, body) = post_json(
            "/api/ai-tools/generate-quote",
            r#"{"projectType":"unknown-category","size":100,"complexity":"simple","location":"","urgency":"normal"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["quote"]["projectType"], "unknown-category");
        assert_eq!(body["quote"]["totalCost"], 5000);
        assert_eq!(body["quote"]["breakdown"][1]["item"], "Overige kosten");
    }

    #[tokio::test]
    async fn generate_quote_rejects_non_positive_size() {
        let (status, body) = post_json(
            "/api/ai-tools/generate-quote",
            r#"{"projectType":"dakwerken","size":0}"#,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("size"));
    }

    #[tokio::test]
    async fn generate_quote_rejects_malformed_body() {
        let (status, body) =
            post_json("/api/ai-tools/generate-quote", r#"{"size":"groot"}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn create_quote_validates_contact_before_storing() {
        let (status, body) = post_json(
            "/api/quotes",
            r#"{"projectType":"gevelwerken","size":50,"name":"Jan","email":"geen-email"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("email"));
    }

    #[tokio::test]
    async fn oversized_body_gets_json_error() {
        let location = "B".repeat(70 * 1024);
        let body = format!(
            r#"{{"projectType":"isolatiewerken","size":100,"location":"{}"}}"#,
            location
        );
        let (status, body) = post_json("/api/ai-tools/generate-quote", &body).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
    }

    async fn admin_get(uri: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .uri(uri)
            .header(
                header::AUTHORIZATION,
                bearer_token("5f0c3a8e-2b1d-4c6e-9a7f-1e2d3c4b5a69", Some("admin")),
            )
            .body(Body::empty())
            .unwrap();

        let resp = test_app().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn non_uuid_quote_id_gets_json_error() {
        let (status, body) = admin_get("/api/admin/quotes/offerte-12").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn unknown_status_filter_gets_json_error() {
        let (status, body) = admin_get("/api/admin/quotes?status=archived").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn admin_quote_list_requires_token() {
        let req = Request::builder()
            .uri("/api/admin/quotes")
            .body(Body::empty())
            .unwrap();

        let resp = test_app().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn validate_project_rejects_blank_type_and_huge_size() {
        let mut req = ProjectRequest {
            project_type: ProjectType::Other("  ".to_string()),
            size: 10.0,
            complexity: Default::default(),
            location: String::new(),
            urgency: Default::default(),
        };
        assert!(validate_project(&req).is_err());

        req.project_type = ProjectType::Dakwerken;
        req.size = f64::NAN;
        assert!(validate_project(&req).is_err());

        req.size = MAX_SIZE_M2 + 1.0;
        assert!(validate_project(&req).is_err());

        req.size = 85.5;
        assert!(validate_project(&req).is_ok());
    }

    #[test]
    fn row_with_unknown_status_is_an_error() {
        let row = QuoteRow {
            id: Uuid::new_v4(),
            project_type: "dakwerken".into(),
            size: 10.0,
            complexity: "simple".into(),
            urgency: "normal".into(),
            location: String::new(),
            total_cost: 550,
            materials_cost: 220,
            labor_cost: 330,
            duration_days: 3,
            breakdown: sqlx::types::Json(vec![]),
            valid_until: Utc::now(),
            contact_name: "Jan".into(),
            contact_email: "jan@example.be".into(),
            contact_phone: None,
            message: None,
            status: "archived".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(StoredQuote::try_from(row).is_err());
    }
}
