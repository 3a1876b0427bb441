//! Order creation for the POS screen.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::ApiClient;
use crate::error::ApiError;

pub const PATH: &str = "/orders";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub menu_item_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub line_total: f64,
}

/// One order-creation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    /// Client-generated so a duplicate submit can be recognised server-side.
    pub client_reference: Uuid,
    pub items: Vec<OrderLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    pub restaurant_id: String,
    pub branch_id: String,
    pub payment_method: PaymentMethod,
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
}

/// The server's echo of a placed order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub status: String,
    pub total: f64,
    pub created_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait OrderApi: Send + Sync {
    async fn create_order(&self, payload: &OrderPayload) -> Result<Option<Order>, ApiError>;
}

#[derive(Clone)]
pub struct OrdersApi {
    client: ApiClient,
}

impl OrdersApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OrderApi for OrdersApi {
    async fn create_order(&self, payload: &OrderPayload) -> Result<Option<Order>, ApiError> {
        self.client.post(PATH, payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::from_wire;

    #[test]
    fn payload_omits_optional_table_and_customer() {
        let payload = OrderPayload {
            client_reference: Uuid::nil(),
            items: vec![],
            table_number: None,
            customer_name: None,
            restaurant_id: "r1".into(),
            branch_id: "b1".into(),
            payment_method: PaymentMethod::Card,
            subtotal: 0.0,
            tax: 0.0,
            total: 0.0,
        };
        let json = serde_json::to_value(&payload).expect("encode");
        assert!(json.get("tableNumber").is_none());
        assert!(json.get("customerName").is_none());
        assert_eq!(json["paymentMethod"], "card");
        assert_eq!(json["branchId"], "b1");
    }

    #[test]
    fn order_echo_tolerates_missing_fields() {
        let order: Order = from_wire(serde_json::json!({
            "_id": "o1",
            "id": "o1",
            "createdAt": "2026-03-01T12:00:00Z"
        }))
        .expect("decode");
        assert_eq!(order.id, "o1");
        assert_eq!(order.total, 0.0);
        assert!(order.created_at.is_some());
    }
}
