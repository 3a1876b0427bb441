//! POS cart: an in-memory order being assembled at the counter.
//!
//! The cart is never persisted. A placed order clears it; a failed one
//! leaves every line untouched so the operator can retry.

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::resources::menu::MenuItem;
use crate::resources::orders::{Order, OrderApi, OrderLine, OrderPayload, PaymentMethod};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CartState {
    Empty,
    Populated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub item: MenuItem,
    /// Always at least 1.
    pub quantity: u32,
}

impl CartLine {
    pub fn line_total(&self) -> f64 {
        round_cents(self.item.price * f64::from(self.quantity))
    }
}

/// Everything an order needs besides the lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderDetails {
    pub restaurant_id: String,
    pub branch_id: String,
    pub table_number: Option<u32>,
    pub customer_name: Option<String>,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Error)]
pub enum CartError {
    #[error("Add at least one item before placing the order")]
    Empty,
    #[error("Select a restaurant before placing the order")]
    MissingRestaurant,
    #[error("Select a branch before placing the order")]
    MissingBranch,
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl CartError {
    pub fn user_message(&self) -> String {
        match self {
            CartError::Api(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cart {
    lines: Vec<CartLine>,
    tax_rate: f64,
}

pub(crate) fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl Cart {
    pub fn new(tax_rate: f64) -> Self {
        Self {
            lines: Vec::new(),
            tax_rate,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.tax_rate)
    }

    pub fn state(&self) -> CartState {
        if self.lines.is_empty() {
            CartState::Empty
        } else {
            CartState::Populated
        }
    }

    /// One more of `item`; a new line starts at quantity 1.
    pub fn add_to_cart(&mut self, item: &MenuItem) {
        match self.lines.iter_mut().find(|l| l.item.id == item.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(1),
            None => self.lines.push(CartLine {
                item: item.clone(),
                quantity: 1,
            }),
        }
    }

    /// Set the quantity of a line. Anything below 1 removes it.
    pub fn update_quantity(&mut self, item_id: &str, quantity: i64) {
        if quantity < 1 {
            self.remove_from_cart(item_id);
            return;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(line) = self.lines.iter_mut().find(|l| l.item.id == item_id) {
            line.quantity = quantity;
        }
    }

    pub fn remove_from_cart(&mut self, item_id: &str) {
        self.lines.retain(|l| l.item.id != item_id);
    }

    pub fn clear_cart(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn subtotal(&self) -> f64 {
        round_cents(self.lines.iter().map(CartLine::line_total).sum())
    }

    pub fn tax(&self) -> f64 {
        round_cents(self.subtotal() * self.tax_rate)
    }

    pub fn total(&self) -> f64 {
        round_cents(self.subtotal() + self.tax())
    }

    /// Sum of quantities, for the cart badge.
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn tax_rate(&self) -> f64 {
        self.tax_rate
    }

    fn payload(&self, details: &OrderDetails) -> Result<OrderPayload, CartError> {
        if self.lines.is_empty() {
            return Err(CartError::Empty);
        }
        let restaurant_id = details.restaurant_id.trim();
        if restaurant_id.is_empty() {
            return Err(CartError::MissingRestaurant);
        }
        let branch_id = details.branch_id.trim();
        if branch_id.is_empty() {
            return Err(CartError::MissingBranch);
        }

        Ok(OrderPayload {
            client_reference: Uuid::new_v4(),
            items: self
                .lines
                .iter()
                .map(|l| OrderLine {
                    menu_item_id: l.item.id.clone(),
                    name: l.item.name.clone(),
                    quantity: l.quantity,
                    unit_price: l.item.price,
                    line_total: l.line_total(),
                })
                .collect(),
            table_number: details.table_number,
            customer_name: details
                .customer_name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(ToString::to_string),
            restaurant_id: restaurant_id.to_string(),
            branch_id: branch_id.to_string(),
            payment_method: details.payment_method,
            subtotal: self.subtotal(),
            tax: self.tax(),
            total: self.total(),
        })
    }

    /// Submit the cart as one order. Cleared only once the server accepted it.
    ///
    /// The `&mut` borrow keeps a second submit out while one is pending. A
    /// cancelled submit leaves the cart exactly as it was.
    pub async fn place_order(
        &mut self,
        api: &dyn OrderApi,
        details: &OrderDetails,
    ) -> Result<Option<Order>, CartError> {
        let payload = self.payload(details)?;

        match api.create_order(&payload).await {
            Ok(order) => {
                info!(
                    reference = %payload.client_reference,
                    branch = %payload.branch_id,
                    lines = payload.items.len(),
                    total = payload.total,
                    "order placed"
                );
                self.clear_cart();
                Ok(order)
            }
            Err(err) => {
                warn!(reference = %payload.client_reference, error = %err, "order failed, cart kept");
                Err(CartError::Api(err))
            }
        }
    }
}
