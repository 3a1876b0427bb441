//! Menu items, menu categories and modifiers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use validator::Validate;
use std::collections::BTreeSet;

use super::{default_true, ids_or_objects, Record, RestResource, SortKey};
use crate::api::ApiClient;
use crate::error::ApiError;
use crate::selector::{ChildSource, Choice, SelectOption, GLOBAL};

pub const ITEMS_PATH: &str = "/menu/items";
pub const CATEGORIES_PATH: &str = "/menu/categories";
pub const MODIFIERS_PATH: &str = "/menu/modifiers";

/// Which branches a menu record is visible at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum BranchScope {
    /// Every branch of the restaurant.
    #[default]
    Global,
    Branch(String),
}

impl From<Option<String>> for BranchScope {
    fn from(raw: Option<String>) -> Self {
        match raw.as_deref().map(str::trim) {
            None | Some("") => BranchScope::Global,
            Some(v) if v.eq_ignore_ascii_case(GLOBAL) => BranchScope::Global,
            Some(v) => BranchScope::Branch(v.to_string()),
        }
    }
}

impl From<BranchScope> for String {
    fn from(scope: BranchScope) -> Self {
        match scope {
            BranchScope::Global => GLOBAL.to_string(),
            BranchScope::Branch(id) => id,
        }
    }
}

impl From<Choice> for BranchScope {
    fn from(choice: Choice) -> Self {
        match choice {
            Choice::Global => BranchScope::Global,
            Choice::Item(id) => BranchScope::Branch(id),
        }
    }
}

impl BranchScope {
    pub fn to_choice(&self) -> Choice {
        match self {
            BranchScope::Global => Choice::Global,
            BranchScope::Branch(id) => Choice::Item(id.clone()),
        }
    }

    pub fn wire_value(&self) -> &str {
        match self {
            BranchScope::Global => GLOBAL,
            BranchScope::Branch(id) => id,
        }
    }

    /// Whether a record with this scope shows up at `branch_id`.
    pub fn visible_at(&self, branch_id: &str) -> bool {
        match self {
            BranchScope::Global => true,
            BranchScope::Branch(id) => id == branch_id,
        }
    }
}

/// Parent key for selects that depend on both restaurant and branch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BranchKey {
    pub restaurant_id: String,
    pub branch: BranchScope,
}

impl BranchKey {
    fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("restaurantId", self.restaurant_id.clone()),
            ("branchId", self.branch.wire_value().to_string()),
        ]
    }
}

// ---------------------------------------------------------------------------
// Menu categories and modifiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MenuCategory {
    pub id: String,
    pub name: String,
    pub description: String,
    pub restaurant_id: String,
    pub branch_id: BranchScope,
    pub sort_order: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuCategoryInput {
    pub name: String,
    pub description: String,
    pub restaurant_id: String,
    pub branch_id: BranchScope,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Modifier {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub restaurant_id: String,
    pub branch_id: BranchScope,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifierInput {
    pub name: String,
    pub price: f64,
    pub restaurant_id: String,
    pub branch_id: BranchScope,
}

pub type MenuCategoriesApi = RestResource<MenuCategory, MenuCategoryInput>;
pub type ModifiersApi = RestResource<Modifier, ModifierInput>;

pub fn categories(client: ApiClient) -> MenuCategoriesApi {
    RestResource::new(client, CATEGORIES_PATH)
}

pub fn modifiers(client: ApiClient) -> ModifiersApi {
    RestResource::new(client, MODIFIERS_PATH)
}

impl Record for MenuCategory {
    const KIND: &'static str = "menu category";

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<String> {
        vec![self.name.clone(), self.description.clone()]
    }

    fn sort_key(&self, column: &str) -> Option<SortKey> {
        match column {
            "name" => Some(SortKey::text(&self.name)),
            "sortOrder" => Some(SortKey::Number(f64::from(self.sort_order))),
            _ => None,
        }
    }

    fn removal_prompt(&self) -> String {
        format!(
            "Delete menu category {}? Items in it will become uncategorised.",
            self.name
        )
    }
}

impl Record for Modifier {
    const KIND: &'static str = "modifier";

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
            _ => None,
        }
    }
}

impl SelectOption for MenuCategory {
    fn option_id(&self) -> &str {
        &self.id
    }

    fn option_label(&self) -> &str {
        &self.name
    }
}

impl SelectOption for Modifier {
    fn option_id(&self) -> &str {
        &self.id
    }

    fn option_label(&self) -> &str {
        &self.name
    }
}

/// Menu categories visible at a (restaurant, branch) pair.
#[derive(Clone)]
pub struct CategoriesForBranch {
    client: ApiClient,
}

impl CategoriesForBranch {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChildSource<BranchKey, MenuCategory> for CategoriesForBranch {
    async fn fetch_children(&self, key: &BranchKey) -> Result<Vec<MenuCategory>, ApiError> {
        self.client.get_list(CATEGORIES_PATH, &key.query()).await
    }
}

/// Modifiers visible at a (restaurant, branch) pair.
#[derive(Clone)]
pub struct ModifiersForBranch {
    client: ApiClient,
}

impl ModifiersForBranch {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChildSource<BranchKey, Modifier> for ModifiersForBranch {
    async fn fetch_children(&self, key: &BranchKey) -> Result<Vec<Modifier>, ApiError> {
        self.client.get_list(MODIFIERS_PATH, &key.query()).await
    }
}

// ---------------------------------------------------------------------------
// Menu items
// ---------------------------------------------------------------------------

/// Inventory consumed per portion.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Ingredient {
    pub inventory_item_id: String,
    pub quantity: f64,
    pub unit: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub cost: f64,
    pub category_id: String,
    pub restaurant_id: String,
    pub branch_id: BranchScope,
    #[serde(deserialize_with = "ids_or_objects")]
    pub modifiers: Vec<String>,
    pub ingredients: Vec<Ingredient>,
    pub tags: BTreeSet<String>,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

impl MenuItem {
    /// Gross margin as a fraction of price; `None` when the price is zero.
    pub fn margin(&self) -> Option<f64> {
        (self.price > 0.0).then(|| (self.price - self.cost) / self.price)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemInput {
    #[validate(length(min = 2, max = 100, message = "Name must be 2 to 100 characters"))]
    pub name: String,
    pub description: String,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,
    #[validate(range(min = 0.0, message = "Cost cannot be negative"))]
    pub cost: f64,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category_id: String,
    #[validate(length(min = 1, message = "Restaurant is required"))]
    pub restaurant_id: String,
    pub branch_id: BranchScope,
    pub modifiers: Vec<String>,
    pub ingredients: Vec<Ingredient>,
    pub tags: BTreeSet<String>,
    pub is_available: bool,
}

pub type MenuItemsApi = RestResource<MenuItem, MenuItemInput>;

pub fn items(client: ApiClient) -> MenuItemsApi {
    RestResource::new(client, ITEMS_PATH)
}

/// Items sellable at one branch, for the POS screen.
pub async fn items_for_branch(
    client: &ApiClient,
    restaurant_id: &str,
    branch_id: &str,
) -> Result<Vec<MenuItem>, ApiError> {
    let items: Vec<MenuItem> = client
        .get_list(
            ITEMS_PATH,
            &[
                ("restaurantId", restaurant_id.to_string()),
                ("branchId", branch_id.to_string()),
            ],
        )
        .await?;
    Ok(items
        .into_iter()
        .filter(|i| i.is_available && i.branch_id.visible_at(branch_id))
        .collect())
}

impl Record for MenuItem {
    const KIND: &'static str = "menu item";

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<String> {
        let mut fields = vec![
            self.name.clone(),
            self.description.clone(),
            format!("{:.2}", self.price),
            self.branch_id.wire_value().to_string(),
        ];
        fields.extend(self.tags.iter().cloned());
        fields
    }

    fn sort_key(&self, column: &str) -> Option<SortKey> {
        match column {
            "name" => Some(SortKey::text(&self.name)),
            "price" => Some(SortKey::Number(self.price)),
            "cost" => Some(SortKey::Number(self.cost)),
            "margin" => Some(SortKey::Number(self.margin().unwrap_or(0.0))),
            "available" => Some(SortKey::Flag(self.is_available)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::from_wire;

    #[test]
    fn branch_scope_wire_format() {
        let item: MenuItem =
            serde_json::from_str(r#"{"id":"m1","branchId":"global"}"#).expect("decode");
        assert_eq!(item.branch_id, BranchScope::Global);

        let item: MenuItem =
            from_wire(serde_json::json!({"id": "m1", "branchName": "b7"})).expect("decode");
        assert_eq!(item.branch_id, BranchScope::Branch("b7".into()));

        let item: MenuItem = serde_json::from_str(
            r#"{"_id":"m1","id":"m1","branchId":"b1","branchName":"Harbor"}"#,
        )
        .expect("decode");
        assert_eq!(item.branch_id, BranchScope::Branch("b1".into()));

        let item: MenuItem = serde_json::from_str(r#"{"id":"m1"}"#).expect("decode");
        assert_eq!(item.branch_id, BranchScope::Global);

        let json = serde_json::to_value(BranchScope::Global).expect("encode");
        assert_eq!(json, "global");
    }

    #[test]
    fn global_items_are_visible_everywhere() {
        assert!(BranchScope::Global.visible_at("b1"));
        assert!(BranchScope::Branch("b1".into()).visible_at("b1"));
        assert!(!BranchScope::Branch("b1".into()).visible_at("b2"));
    }

    #[test]
    fn modifiers_decode_from_populated_objects() {
        let item: MenuItem = serde_json::from_str(
            r#"{"id":"m1","modifiers":[{"_id":"x1","name":"Cheese"},"x2"],"tags":["vegan","vegan","spicy"]}"#,
        )
        .expect("decode");
        assert_eq!(item.modifiers, vec!["x1", "x2"]);
        assert_eq!(item.tags.len(), 2);
    }

    #[test]
    fn margin_handles_zero_price() {
        let item = MenuItem {
            price: 10.0,
            cost: 4.0,
            ..MenuItem::default()
        };
        assert_eq!(item.margin(), Some(0.6));
        assert_eq!(MenuItem::default().margin(), None);
    }

    #[test]
    fn branch_key_query_sends_global_sentinel() {
        let key = BranchKey {
            restaurant_id: "r1".into(),
            branch: BranchScope::Global,
        };
        assert_eq!(
            key.query(),
            vec![
                ("restaurantId", "r1".to_string()),
                ("branchId", "global".to_string())
            ]
        );
    }
}
