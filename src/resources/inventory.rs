//! Inventory: categories with owned subcategories, stock items, suppliers
//! and the supplier-product sub-resource.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{default_true, Record, RestResource, SortKey};
use crate::api::{path_segment, ApiClient};
use crate::error::ApiError;
use crate::forms::{hex_colour, optional_email};
use crate::selector::{ChildSource, SelectOption};

pub const CATEGORIES_PATH: &str = "/inventory/categories";
pub const SUBCATEGORIES_PATH: &str = "/inventory/subcategories";
pub const ITEMS_PATH: &str = "/inventory/items";
pub const SUPPLIERS_PATH: &str = "/inventory/suppliers";

// ---------------------------------------------------------------------------
// Categories and subcategories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InventorySubcategory {
    pub id: String,
    pub name: String,
    pub category_id: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InventoryCategory {
    pub id: String,
    pub name: String,
    pub color: String,
    pub description: String,
    pub restaurant_id: String,
    pub subcategories: Vec<InventorySubcategory>,
    /// Server-computed; never sent back.
    pub item_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    #[validate(length(min = 2, max = 100, message = "Name must be 2 to 100 characters"))]
    pub name: String,
    #[validate(custom = "hex_colour")]
    pub color: String,
    pub description: String,
    #[validate(length(min = 1, message = "Restaurant is required"))]
    pub restaurant_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubcategoryInput {
    #[validate(length(min = 2, max = 100, message = "Name must be 2 to 100 characters"))]
    pub name: String,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category_id: String,
    pub description: String,
}

pub type CategoriesApi = RestResource<InventoryCategory, CategoryInput>;
pub type SubcategoriesApi = RestResource<InventorySubcategory, SubcategoryInput>;

pub fn categories(client: ApiClient) -> CategoriesApi {
    RestResource::new(client, CATEGORIES_PATH)
}

pub fn subcategories(client: ApiClient) -> SubcategoriesApi {
    RestResource::new(client, SUBCATEGORIES_PATH)
}

impl Record for InventoryCategory {
    const KIND: &'static str = "category";

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<String> {
        let mut fields = vec![self.name.clone(), self.description.clone()];
        fields.extend(self.subcategories.iter().map(|s| s.name.clone()));
        fields
    }

    fn sort_key(&self, column: &str) -> Option<SortKey> {
        match column {
            "name" => Some(SortKey::text(&self.name)),
            "itemCount" => Some(SortKey::Number(f64::from(self.item_count))),
            "subcategories" => Some(SortKey::Number(self.subcategories.len() as f64)),
            _ => None,
        }
    }

    fn removal_prompt(&self) -> String {
        match self.subcategories.len() {
            0 => format!("Delete category {}? This cannot be undone.", self.name),
            1 => format!(
                "Delete category {}? This will also remove its subcategory.",
                self.name
            ),
            n => format!(
                "Delete category {}? This will also remove all {n} subcategories.",
                self.name
            ),
        }
    }
}

impl Record for InventorySubcategory {
    const KIND: &'static str = "subcategory";

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<String> {
        vec![self.name.clone(), self.description.clone()]
    }

    fn sort_key(&self, column: &str) -> Option<SortKey> {
        match column {
            "name" => Some(SortKey::text(&self.name)),
            _ => None,
        }
    }
}

impl SelectOption for InventoryCategory {
    fn option_id(&self) -> &str {
        &self.id
    }

    fn option_label(&self) -> &str {
        &self.name
    }
}

impl SelectOption for InventorySubcategory {
    fn option_id(&self) -> &str {
        &self.id
    }

    fn option_label(&self) -> &str {
        &self.name
    }
}

/// Subcategory select driven by the chosen category.
#[derive(Clone)]
pub struct SubcategoriesByCategory {
    client: ApiClient,
}

impl SubcategoriesByCategory {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChildSource<String, InventorySubcategory> for SubcategoriesByCategory {
    async fn fetch_children(
        &self,
        category_id: &String,
    ) -> Result<Vec<InventorySubcategory>, ApiError> {
        self.client
            .get_list(SUBCATEGORIES_PATH, &[("categoryId", category_id.clone())])
            .await
    }
}

/// Inventory category select driven by the chosen restaurant.
#[derive(Clone)]
pub struct CategoriesByRestaurant {
    client: ApiClient,
}

impl CategoriesByRestaurant {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChildSource<String, InventoryCategory> for CategoriesByRestaurant {
    async fn fetch_children(
        &self,
        restaurant_id: &String,
    ) -> Result<Vec<InventoryCategory>, ApiError> {
        self.client
            .get_list(CATEGORIES_PATH, &[("restaurantId", restaurant_id.clone())])
            .await
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockStatus {
    pub fn label(self) -> &'static str {
        match self {
            StockStatus::InStock => "In stock",
            StockStatus::LowStock => "Low stock",
            StockStatus::OutOfStock => "Out of stock",
        }
    }

    fn rank(self) -> f64 {
        match self {
            StockStatus::OutOfStock => 0.0,
            StockStatus::LowStock => 1.0,
            StockStatus::InStock => 2.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub cost: f64,
    pub min_stock: f64,
    pub category_id: String,
    pub subcategory_id: String,
    pub restaurant_id: String,
    pub branch_id: String,
}

impl InventoryItem {
    /// Derived from quantity against the minimum stock level.
    pub fn status(&self) -> StockStatus {
        if self.quantity <= 0.0 {
            StockStatus::OutOfStock
        } else if self.quantity <= self.min_stock {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }

    /// On-hand quantity at cost; negative stock counts as none.
    pub fn stock_value(&self) -> f64 {
        self.quantity.max(0.0) * self.cost
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemInput {
    #[validate(length(min = 2, max = 100, message = "Name must be 2 to 100 characters"))]
    pub name: String,
    #[validate(range(min = 0.0, message = "Quantity cannot be negative"))]
    pub quantity: f64,
    #[validate(length(min = 1, message = "Unit is required"))]
    pub unit: String,
    #[validate(range(min = 0.0, message = "Cost cannot be negative"))]
    pub cost: f64,
    #[validate(range(min = 0.0, message = "Minimum stock cannot be negative"))]
    pub min_stock: f64,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory_id: Option<String>,
    #[validate(length(min = 1, message = "Restaurant is required"))]
    pub restaurant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<String>,
}

pub type ItemsApi = RestResource<InventoryItem, InventoryItemInput>;

pub fn items(client: ApiClient) -> ItemsApi {
    RestResource::new(client, ITEMS_PATH)
}

impl Record for InventoryItem {
    const KIND: &'static str = "inventory item";

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            format!("{} {}", self.quantity, self.unit),
            format!("{:.2}", self.cost),
            self.status().label().to_string(),
        ]
    }

    fn sort_key(&self, column: &str) -> Option<SortKey> {
        match column {
            "name" => Some(SortKey::text(&self.name)),
            "quantity" => Some(SortKey::Number(self.quantity)),
            "cost" => Some(SortKey::Number(self.cost)),
            "minStock" => Some(SortKey::Number(self.min_stock)),
            "value" => Some(SortKey::Number(self.stock_value())),
            "status" => Some(SortKey::Number(self.status().rank())),
            _ => None,
        }
    }
}

impl SelectOption for InventoryItem {
    fn option_id(&self) -> &str {
        &self.id
    }

    fn option_label(&self) -> &str {
        &self.name
    }
}

/// Ingredient picker options for one restaurant.
#[derive(Clone)]
pub struct ItemsByRestaurant {
    client: ApiClient,
}

impl ItemsByRestaurant {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChildSource<String, InventoryItem> for ItemsByRestaurant {
    async fn fetch_children(&self, restaurant_id: &String) -> Result<Vec<InventoryItem>, ApiError> {
        self.client
            .get_list(ITEMS_PATH, &[("restaurantId", restaurant_id.clone())])
            .await
    }
}

// ---------------------------------------------------------------------------
// Suppliers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub restaurant_id: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SupplierInput {
    #[validate(length(min = 2, max = 100, message = "Name must be 2 to 100 characters"))]
    pub name: String,
    pub contact_name: String,
    #[validate(custom = "optional_email")]
    pub email: String,
    pub phone: String,
    #[validate(length(min = 1, message = "Restaurant is required"))]
    pub restaurant_id: String,
}

/// An inventory item a supplier can deliver, with its price and lead time.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SupplierProduct {
    pub id: String,
    pub supplier_id: String,
    pub inventory_item_id: String,
    pub name: String,
    pub price: f64,
    pub lead_time_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SupplierProductInput {
    #[validate(length(min = 1, message = "Inventory item is required"))]
    pub inventory_item_id: String,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,
    pub lead_time_days: u32,
}

pub type SuppliersApi = RestResource<Supplier, SupplierInput>;
pub type SupplierProductsApi = RestResource<SupplierProduct, SupplierProductInput>;

pub fn suppliers(client: ApiClient) -> SuppliersApi {
    RestResource::new(client, SUPPLIERS_PATH)
}

/// The nested `/inventory/suppliers/:id/products` collection.
pub fn supplier_products(
    client: ApiClient,
    supplier_id: &str,
) -> Result<SupplierProductsApi, ApiError> {
    let supplier_id = path_segment(supplier_id)?;
    Ok(RestResource::new(
        client,
        format!("{SUPPLIERS_PATH}/{supplier_id}/products"),
    ))
}

impl Record for Supplier {
    const KIND: &'static str = "supplier";

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.contact_name.clone(),
            self.email.clone(),
            self.phone.clone(),
        ]
    }

    fn sort_key(&self, column: &str) -> Option<SortKey> {
        match column {
            "name" => Some(SortKey::text(&self.name)),
            "contactName" => Some(SortKey::text(&self.contact_name)),
            "email" => Some(SortKey::text(&self.email)),
            _ => None,
        }
    }

    fn removal_prompt(&self) -> String {
        format!(
            "Delete supplier {}? Its product price list will be removed too.",
            self.name
        )
    }
}

impl Record for SupplierProduct {
    const KIND: &'static str = "supplier product";

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<String> {
        vec![self.name.clone(), format!("{:.2}", self.price)]
    }

    fn sort_key(&self, column: &str) -> Option<SortKey> {
        match column {
            "name" => Some(SortKey::text(&self.name)),
            "price" => Some(SortKey::Number(self.price)),
            "leadTimeDays" => Some(SortKey::Number(f64::from(self.lead_time_days))),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: f64, min_stock: f64) -> InventoryItem {
        InventoryItem {
            id: "i1".into(),
            name: "Flour".into(),
            quantity,
            min_stock,
            ..InventoryItem::default()
        }
    }

    #[test]
    fn stock_status_is_derived_from_quantity() {
        assert_eq!(item(0.0, 5.0).status(), StockStatus::OutOfStock);
        assert_eq!(item(-2.0, 5.0).status(), StockStatus::OutOfStock);
        assert_eq!(item(5.0, 5.0).status(), StockStatus::LowStock);
        assert_eq!(item(5.5, 5.0).status(), StockStatus::InStock);
    }

    #[test]
    fn stock_value_sorts_by_quantity_at_cost() {
        let flour = InventoryItem {
            cost: 1.5,
            ..item(10.0, 2.0)
        };
        let short = InventoryItem {
            cost: 40.0,
            ..item(-3.0, 2.0)
        };
        assert_eq!(flour.stock_value(), 15.0);
        assert_eq!(short.stock_value(), 0.0);
        assert_eq!(flour.sort_key("value"), Some(SortKey::Number(15.0)));
    }

    #[test]
    fn server_status_field_is_ignored_in_favour_of_derivation() {
        let item: InventoryItem = serde_json::from_str(
            r#"{"id":"i1","name":"Salt","quantity":0,"minStock":1,"status":"IN_STOCK"}"#,
        )
        .expect("decode");
        assert_eq!(item.status(), StockStatus::OutOfStock);
    }

    #[test]
    fn category_payload_never_carries_item_count() {
        let input = CategoryInput {
            name: "Dry goods".into(),
            color: "#AA8800".into(),
            description: String::new(),
            restaurant_id: "r1".into(),
        };
        let json = serde_json::to_value(&input).expect("encode");
        assert!(json.get("itemCount").is_none());
        assert!(json.get("subcategories").is_none());
        assert_eq!(json["restaurantId"], "r1");
    }

    #[test]
    fn category_removal_prompt_mentions_cascade() {
        let category = InventoryCategory {
            name: "Produce".into(),
            subcategories: vec![
                InventorySubcategory::default(),
                InventorySubcategory::default(),
            ],
            ..InventoryCategory::default()
        };
        assert!(category
            .removal_prompt()
            .contains("remove all 2 subcategories"));
    }

    #[test]
    fn supplier_products_path_is_nested_and_validated() {
        let client = ApiClient::new("https://api.example.com", crate::api::DEFAULT_TIMEOUT)
            .expect("client");
        let api = supplier_products(client.clone(), "s-1").expect("valid id");
        assert_eq!(api.path(), "/inventory/suppliers/s-1/products");
        assert!(supplier_products(client, "s/../x").is_err());
    }
}
