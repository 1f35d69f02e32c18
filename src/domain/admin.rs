//! Back-office dashboard types

use serde::Serialize;

/// Quote volume per work category
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStat {
    pub project_type: String,
    pub quote_count: i64,
    pub total_value: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusStat {
    pub status: String,
    pub quote_count: i64,
}

/// Quote requests per calendar month (`YYYY-MM`)
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStat {
    pub month: String,
    pub quote_count: i64,
    pub total_value: i64,
}

/// Chart data for the admin dashboard
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub quote_count: i64,
    pub total_quoted_value: i64,
    pub average_quote_value: i64,
    pub by_category: Vec<CategoryStat>,
    pub by_status: Vec<StatusStat>,
    pub by_month: Vec<MonthlyStat>,
    pub chat_sessions: i64,
    pub chat_messages: i64,
}
