//! Pre-aggregated analytics. Every number is computed server-side and
//! rendered as delivered.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use super::branches::BranchRef;
use crate::api::ApiClient;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportType {
    Overview,
    Orders,
    Payments,
    Detailed,
    DayEnd,
}

impl ReportType {
    pub fn path(self) -> &'static str {
        match self {
            ReportType::Overview => "/reports/overview",
            ReportType::Orders => "/reports/orders",
            ReportType::Payments => "/reports/payments",
            ReportType::Detailed => "/reports/detailed",
            ReportType::DayEnd => "/reports/day-end",
        }
    }
}

/// A fully resolved report request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReportQuery {
    pub report: ReportType,
    /// `None` means all restaurants.
    pub restaurant_id: Option<String>,
    /// `None` means all branches.
    pub branch: Option<BranchRef>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ReportQuery {
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(5);
        if let Some(restaurant_id) = &self.restaurant_id {
            params.push(("restaurantId", restaurant_id.clone()));
        }
        if let Some(branch) = &self.branch {
            params.push(("branchId", branch.id.clone()));
            params.push(("branchName", branch.name.clone()));
        }
        params.push(("startDate", self.start_date.format("%Y-%m-%d").to_string()));
        params.push(("endDate", self.end_date.format("%Y-%m-%d").to_string()));
        params
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DailyRevenue {
    pub date: String,
    pub revenue: f64,
    pub orders: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TopItem {
    pub name: String,
    pub quantity: u64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverviewReport {
    pub total_revenue: f64,
    pub total_orders: u64,
    pub average_order_value: f64,
    pub total_customers: u64,
    pub revenue_by_day: Vec<DailyRevenue>,
    pub top_items: Vec<TopItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HourlyOrders {
    pub hour: u8,
    pub orders: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrdersReport {
    pub total_orders: u64,
    pub completed: u64,
    pub pending: u64,
    pub cancelled: u64,
    pub orders_by_hour: Vec<HourlyOrders>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentBreakdown {
    pub method: String,
    pub count: u64,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentsReport {
    pub total_collected: f64,
    pub refunds: f64,
    pub by_method: Vec<PaymentBreakdown>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetailedRow {
    pub date: String,
    pub order_number: String,
    pub branch_name: String,
    pub items: u64,
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
    pub payment_method: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetailedReport {
    pub rows: Vec<DetailedRow>,
}

/// End-of-day close-out summary for one branch.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DayEndReport {
    pub date: String,
    pub gross_sales: f64,
    pub discounts: f64,
    pub net_sales: f64,
    pub tax_collected: f64,
    pub cash_total: f64,
    pub card_total: f64,
    pub orders_count: u64,
    pub voided_count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportData {
    Overview(OverviewReport),
    Orders(OrdersReport),
    Payments(PaymentsReport),
    Detailed(DetailedReport),
    DayEnd(DayEndReport),
}

impl ReportData {
    pub fn report_type(&self) -> ReportType {
        match self {
            ReportData::Overview(_) => ReportType::Overview,
            ReportData::Orders(_) => ReportType::Orders,
            ReportData::Payments(_) => ReportType::Payments,
            ReportData::Detailed(_) => ReportType::Detailed,
            ReportData::DayEnd(_) => ReportType::DayEnd,
        }
    }
}

#[async_trait]
pub trait ReportSource: Send + Sync {
    async fn fetch_report(&self, query: &ReportQuery) -> Result<ReportData, ApiError>;
}

#[derive(Clone)]
pub struct ReportsApi {
    client: ApiClient,
}

impl ReportsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    async fn fetch<T>(&self, query: &ReportQuery) -> Result<T, ApiError>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        let data: Option<T> = self
            .client
            .get_one(query.report.path(), &query.params())
            .await?;
        Ok(data.unwrap_or_default())
    }
}

#[async_trait]
impl ReportSource for ReportsApi {
    async fn fetch_report(&self, query: &ReportQuery) -> Result<ReportData, ApiError> {
        Ok(match query.report {
            ReportType::Overview => ReportData::Overview(self.fetch(query).await?),
            ReportType::Orders => ReportData::Orders(self.fetch(query).await?),
            ReportType::Payments => ReportData::Payments(self.fetch(query).await?),
            ReportType::Detailed => ReportData::Detailed(self.fetch(query).await?),
            ReportType::DayEnd => ReportData::DayEnd(self.fetch(query).await?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("date")
    }

    #[test]
    fn all_scopes_are_left_out_of_the_query() {
        let query = ReportQuery {
            report: ReportType::Overview,
            restaurant_id: None,
            branch: None,
            start_date: date("2026-03-01"),
            end_date: date("2026-03-31"),
        };
        assert_eq!(
            query.params(),
            vec![
                ("startDate", "2026-03-01".to_string()),
                ("endDate", "2026-03-31".to_string())
            ]
        );
    }

    #[test]
    fn branch_scope_sends_id_and_name() {
        let query = ReportQuery {
            report: ReportType::DayEnd,
            restaurant_id: Some("r1".into()),
            branch: Some(BranchRef {
                id: "b1".into(),
                name: "Harbor".into(),
            }),
            start_date: date("2026-03-01"),
            end_date: date("2026-03-01"),
        };
        let params = query.params();
        assert!(params.contains(&("restaurantId", "r1".to_string())));
        assert!(params.contains(&("branchId", "b1".to_string())));
        assert!(params.contains(&("branchName", "Harbor".to_string())));
        assert_eq!(query.report.path(), "/reports/day-end");
    }

    #[test]
    fn partial_overview_defaults_to_zero() {
        let report: OverviewReport =
            serde_json::from_str(r#"{"totalRevenue":1520.5,"topItems":[{"name":"Burger"}]}"#)
                .expect("decode");
        assert_eq!(report.total_orders, 0);
        assert_eq!(report.top_items[0].revenue, 0.0);
        assert!(report.revenue_by_day.is_empty());
    }
}
