//! Admin dashboard routes
//!
//! Aggregates stored quotes and chat activity into chart-ready series.

use axum::{extract::State, response::IntoResponse};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::api::DataResponse;
use crate::app::AppState;
use crate::auth::RequireAdmin;
use crate::domain::admin::{CategoryStat, DashboardStats, MonthlyStat, StatusStat};
use crate::error::ApiResult;

/// Months shown in the monthly chart, current month included
const MONTHS_IN_CHART: i32 = 12;

/// `SUM(bigint)` comes back as NUMERIC.
fn euros(sum: Decimal) -> i64 {
    sum.round().to_i64().unwrap_or(i64::MAX)
}

fn average(total: i64, count: i64) -> i64 {
    if count <= 0 {
        0
    } else {
        (total as f64 / count as f64).round() as i64
    }
}

/// GET /api/admin/stats
pub async fn get_stats(
    admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> ApiResult<impl IntoResponse> {
    let db = &state.db;

    let totals = sqlx::query_as::<_, (i64, Decimal)>(
        "SELECT COUNT(*), COALESCE(SUM(total_cost), 0) FROM quotes",
    )
    .fetch_one(db);

    let by_category = sqlx::query_as::<_, (String, i64, Decimal)>(
        r#"
        SELECT project_type, COUNT(*), COALESCE(SUM(total_cost), 0)
        FROM quotes
        GROUP BY project_type
        ORDER BY COUNT(*) DESC, project_type
        "#,
    )
    .fetch_all(db);

    let by_status = sqlx::query_as::<_, (String, i64)>(
        "SELECT status, COUNT(*) FROM quotes GROUP BY status ORDER BY status",
    )
    .fetch_all(db);

    let by_month = sqlx::query_as::<_, (String, i64, Decimal)>(
        r#"
        SELECT to_char(date_trunc('month', created_at), 'YYYY-MM') AS month,
               COUNT(*), COALESCE(SUM(total_cost), 0)
        FROM quotes
        WHERE created_at >= date_trunc('month', NOW()) - make_interval(months => $1 - 1)
        GROUP BY month
        ORDER BY month
        "#,
    )
    .bind(MONTHS_IN_CHART)
    .fetch_all(db);

    let chat = sqlx::query_as::<_, (i64, i64)>(
        "SELECT COUNT(DISTINCT session_id), COUNT(*) FROM chat_messages",
    )
    .fetch_one(db);

    let ((quote_count, total), by_category, by_status, by_month, (chat_sessions, chat_messages)) =
        tokio::try_join!(totals, by_category, by_status, by_month, chat)?;

    let total_quoted_value = euros(total);

    tracing::debug!(user_id = %admin.user_id, quote_count, "Dashboard stats computed");

    Ok(DataResponse::new(DashboardStats {
        quote_count,
        total_quoted_value,
        average_quote_value: average(total_quoted_value, quote_count),
        by_category: by_category
            .into_iter()
            .map(|(project_type, quote_count, total)| CategoryStat {
                project_type,
                quote_count,
                total_value: euros(total),
            })
            .collect(),
        by_status: by_status
            .into_iter()
            .map(|(status, quote_count)| StatusStat { status, quote_count })
            .collect(),
        by_month: by_month
            .into_iter()
            .map(|(month, quote_count, total)| MonthlyStat {
                month,
                quote_count,
                total_value: euros(total),
            })
            .collect(),
        chat_sessions,
        chat_messages,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn numeric_sums_round_to_whole_euros() {
        assert_eq!(euros(Decimal::from_str("28800").unwrap()), 28800);
        assert_eq!(euros(Decimal::from_str("1234.5").unwrap()), 1234);
        assert_eq!(euros(Decimal::from_str("1235.5").unwrap()), 1236);
    }

    #[test]
    fn average_of_nothing_is_zero() {
        assert_eq!(average(0, 0), 0);
        assert_eq!(average(10_000, 3), 3333);
    }
}
