//! Inventory category, subcategory, item and supplier forms, plus the
//! dialogs whose selects cascade: restaurant → category → subcategory for
//! items, and the restaurant's stock list for supplier products.

use std::sync::Arc;
use tracing::debug;

use super::{check_finite, check_payload, optional_id};
use crate::api::ApiClient;
use crate::chain::ScopeChain;
use crate::editor::{Form, RecordEditor, SubmitError, ValidationErrors};
use crate::error::ApiError;
use crate::list::ListController;
use crate::resources::inventory::{
    CategoriesByRestaurant, CategoryInput, InventoryCategory, InventoryItem, InventoryItemInput,
    InventorySubcategory, ItemsByRestaurant, SubcategoriesByCategory, SubcategoryInput, Supplier,
    SupplierInput, SupplierProduct, SupplierProductInput,
};
use crate::resources::restaurants::Restaurant;
use crate::resources::ResourceApi;
use crate::selector::{CascadingSelect, ChildSource, Choice, Refresh, SelectError};

pub const DEFAULT_CATEGORY_COLOR: &str = "#6B7280";

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryForm {
    pub name: String,
    pub color: String,
    pub description: String,
    pub restaurant_id: String,
}

impl Default for CategoryForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: DEFAULT_CATEGORY_COLOR.to_string(),
            description: String::new(),
            restaurant_id: String::new(),
        }
    }
}

impl Form for CategoryForm {
    type Record = InventoryCategory;
    type Input = CategoryInput;

    fn from_record(record: &InventoryCategory) -> Self {
        Self {
            name: record.name.clone(),
            color: if record.color.is_empty() {
                DEFAULT_CATEGORY_COLOR.to_string()
            } else {
                record.color.clone()
            },
            description: record.description.clone(),
            restaurant_id: record.restaurant_id.clone(),
        }
    }

    fn validate(&self) -> Result<CategoryInput, ValidationErrors> {
        let input = CategoryInput {
            name: self.name.trim().to_string(),
            color: self.color.trim().to_ascii_uppercase(),
            description: self.description.trim().to_string(),
            restaurant_id: self.restaurant_id.trim().to_string(),
        };
        check_payload(&input).into_result(input)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubcategoryForm {
    pub name: String,
    pub category_id: String,
    pub description: String,
}

impl Form for SubcategoryForm {
    type Record = InventorySubcategory;
    type Input = SubcategoryInput;

    fn from_record(record: &InventorySubcategory) -> Self {
        Self {
            name: record.name.clone(),
            category_id: record.category_id.clone(),
            description: record.description.clone(),
        }
    }

    fn validate(&self) -> Result<SubcategoryInput, ValidationErrors> {
        let input = SubcategoryInput {
            name: self.name.trim().to_string(),
            category_id: self.category_id.trim().to_string(),
            description: self.description.trim().to_string(),
        };
        check_payload(&input).into_result(input)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryItemForm {
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

impl Form for InventoryItemForm {
    type Record = InventoryItem;
    type Input = InventoryItemInput;

    fn from_record(record: &InventoryItem) -> Self {
        Self {
            name: record.name.clone(),
            quantity: record.quantity,
            unit: record.unit.clone(),
            cost: record.cost,
            min_stock: record.min_stock,
            category_id: record.category_id.clone(),
            subcategory_id: record.subcategory_id.clone(),
            restaurant_id: record.restaurant_id.clone(),
            branch_id: record.branch_id.clone(),
        }
    }

    fn validate(&self) -> Result<InventoryItemInput, ValidationErrors> {
        let input = InventoryItemInput {
            name: self.name.trim().to_string(),
            quantity: self.quantity,
            unit: self.unit.trim().to_string(),
            cost: self.cost,
            min_stock: self.min_stock,
            category_id: self.category_id.trim().to_string(),
            subcategory_id: optional_id(&self.subcategory_id),
            restaurant_id: self.restaurant_id.trim().to_string(),
            branch_id: optional_id(&self.branch_id),
        };
        let mut errors = check_payload(&input);
        check_finite(&mut errors, "quantity", input.quantity);
        check_finite(&mut errors, "cost", input.cost);
        check_finite(&mut errors, "minStock", input.min_stock);
        errors.into_result(input)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupplierForm {
    pub name: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub restaurant_id: String,
}

impl Form for SupplierForm {
    type Record = Supplier;
    type Input = SupplierInput;

    fn from_record(record: &Supplier) -> Self {
        Self {
            name: record.name.clone(),
            contact_name: record.contact_name.clone(),
            email: record.email.clone(),
            phone: record.phone.clone(),
            restaurant_id: record.restaurant_id.clone(),
        }
    }

    fn validate(&self) -> Result<SupplierInput, ValidationErrors> {
        let input = SupplierInput {
            name: self.name.trim().to_string(),
            contact_name: self.contact_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            restaurant_id: self.restaurant_id.trim().to_string(),
        };
        check_payload(&input).into_result(input)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupplierProductForm {
    pub inventory_item_id: String,
    pub price: f64,
    pub lead_time_days: u32,
}

impl Form for SupplierProductForm {
    type Record = SupplierProduct;
    type Input = SupplierProductInput;

    fn from_record(record: &SupplierProduct) -> Self {
        Self {
            inventory_item_id: record.inventory_item_id.clone(),
            price: record.price,
            lead_time_days: record.lead_time_days,
        }
    }

    fn validate(&self) -> Result<SupplierProductInput, ValidationErrors> {
        let input = SupplierProductInput {
            inventory_item_id: self.inventory_item_id.trim().to_string(),
            price: self.price,
            lead_time_days: self.lead_time_days,
        };
        let mut errors = check_payload(&input);
        check_finite(&mut errors, "price", input.price);
        errors.into_result(input)
    }
}

// ---------------------------------------------------------------------------
// Inventory item dialog
// ---------------------------------------------------------------------------

/// Restaurant (and optional branch) from the scope chain, then one of the
/// restaurant's categories, then optionally one of that category's
/// subcategories. Each level reloads when its parent changes.
pub struct InventoryItemEditor {
    editor: RecordEditor<InventoryItemForm>,
    chain: ScopeChain,
    categories: CascadingSelect<String, InventoryCategory>,
    subcategories: CascadingSelect<String, InventorySubcategory>,
}

impl InventoryItemEditor {
    pub fn new(
        chain: ScopeChain,
        categories: Arc<dyn ChildSource<String, InventoryCategory>>,
        subcategories: Arc<dyn ChildSource<String, InventorySubcategory>>,
    ) -> Self {
        Self {
            editor: RecordEditor::new(),
            chain,
            categories: CascadingSelect::new("inventory category", categories),
            subcategories: CascadingSelect::new("inventory subcategory", subcategories),
        }
    }

    pub fn for_client(client: &ApiClient) -> Self {
        Self::new(
            ScopeChain::for_client(client),
            Arc::new(CategoriesByRestaurant::new(client.clone())),
            Arc::new(SubcategoriesByCategory::new(client.clone())),
        )
    }

    pub async fn load_restaurants<A>(&mut self, api: &A) -> Result<(), ApiError>
    where
        A: ResourceApi<Record = Restaurant>,
    {
        self.chain.load_restaurants(api).await
    }

    /// Fresh form on a reset chain. A pinned account gets its restaurant's
    /// categories straight away.
    pub async fn open_create(&mut self) -> Refresh {
        self.editor.open_create();
        self.chain.reset();
        self.categories.clear();
        self.subcategories.clear();
        let refresh = match self.chain.restaurant_id() {
            Some(id) => self.categories.select_parent(id.to_string()).await,
            None => Refresh::Applied,
        };
        self.sync_from_selects();
        refresh
    }

    /// Re-seed every level from `item`, parents first.
    pub async fn open_edit(&mut self, item: &InventoryItem) -> Result<(), SelectError> {
        self.editor.open_edit(item);
        self.subcategories.clear();

        if !self.chain.is_locked() {
            self.chain.select_restaurant(&item.restaurant_id).await?;
            if self.chain.branch().contains(&item.branch_id) {
                self.chain
                    .select_branch(Choice::item(item.branch_id.clone()))
                    .await?;
            }
        }
        let restaurant_id = self.chain.restaurant_id().unwrap_or_default().to_string();
        self.categories.select_parent(restaurant_id).await;

        if self.categories.contains(&item.category_id) {
            self.categories.choose(Choice::item(item.category_id.clone()))?;
            self.subcategories
                .select_parent(item.category_id.clone())
                .await;
            if self.subcategories.contains(&item.subcategory_id) {
                self.subcategories
                    .choose(Choice::item(item.subcategory_id.clone()))?;
            }
        } else {
            debug!(item = %item.id, category = %item.category_id, "category not offered for this restaurant");
        }
        self.sync_from_selects();
        Ok(())
    }

    /// Categories belong to a restaurant, so a switch drops the category
    /// and its subcategory.
    pub async fn select_restaurant(&mut self, id: &str) -> Result<(), SelectError> {
        self.chain.select_restaurant(id).await?;
        self.subcategories.clear();
        self.categories.select_parent(id.to_string()).await;
        self.sync_from_selects();
        Ok(())
    }

    /// `None` leaves the item shared by every branch of the restaurant.
    pub async fn select_branch(&mut self, branch_id: Option<&str>) -> Result<(), SelectError> {
        match branch_id {
            Some(id) => self.chain.select_branch(Choice::item(id)).await?,
            None => self.chain.branch().clear_selection()?,
        }
        self.sync_from_selects();
        Ok(())
    }

    pub async fn select_category(&mut self, id: &str) -> Result<Refresh, SelectError> {
        self.categories.choose(Choice::item(id))?;
        let refresh = self.subcategories.select_parent(id.to_string()).await;
        self.sync_from_selects();
        Ok(refresh)
    }

    /// `None` files the item directly under its category.
    pub fn select_subcategory(&mut self, id: Option<&str>) -> Result<(), SelectError> {
        match id {
            Some(id) => self.subcategories.choose(Choice::item(id))?,
            None => self.subcategories.clear_selection()?,
        }
        self.sync_from_selects();
        Ok(())
    }

    fn sync_from_selects(&mut self) {
        let selected_id = |choice: Option<Choice>| {
            choice
                .and_then(|c| c.as_item().map(ToString::to_string))
                .unwrap_or_default()
        };
        let restaurant_id = self.chain.restaurant_id().unwrap_or_default().to_string();
        let branch_id = selected_id(self.chain.branch().selected());
        let category_id = selected_id(self.categories.selected());
        let subcategory_id = selected_id(self.subcategories.selected());

        let form = self.editor.form_mut();
        form.restaurant_id = restaurant_id;
        form.branch_id = branch_id;
        form.category_id = category_id;
        form.subcategory_id = subcategory_id;
    }

    pub async fn submit<A>(
        &mut self,
        list: &mut ListController<A>,
    ) -> Result<Option<InventoryItem>, SubmitError>
    where
        A: ResourceApi<Record = InventoryItem, Input = InventoryItemInput>,
    {
        self.sync_from_selects();
        self.editor.submit(list).await
    }

    pub fn close(&mut self) {
        self.editor.close();
    }

    pub fn editor(&self) -> &RecordEditor<InventoryItemForm> {
        &self.editor
    }

    pub fn form_mut(&mut self) -> &mut InventoryItemForm {
        self.editor.form_mut()
    }

    pub fn chain(&self) -> &ScopeChain {
        &self.chain
    }

    pub fn categories(&self) -> &CascadingSelect<String, InventoryCategory> {
        &self.categories
    }

    pub fn subcategories(&self) -> &CascadingSelect<String, InventorySubcategory> {
        &self.subcategories
    }
}

// ---------------------------------------------------------------------------
// Supplier product dialog
// ---------------------------------------------------------------------------

/// Price-list entry for one supplier. The item picker offers the stock of
/// the supplier's restaurant.
pub struct SupplierProductEditor {
    editor: RecordEditor<SupplierProductForm>,
    items: CascadingSelect<String, InventoryItem>,
}

impl SupplierProductEditor {
    pub fn new(items: Arc<dyn ChildSource<String, InventoryItem>>) -> Self {
        Self {
            editor: RecordEditor::new(),
            items: CascadingSelect::new("inventory item", items),
        }
    }

    pub fn for_client(client: &ApiClient) -> Self {
        Self::new(Arc::new(ItemsByRestaurant::new(client.clone())))
    }

    pub async fn open_create(&mut self, supplier: &Supplier) -> Refresh {
        self.editor.open_create();
        self.items.clear();
        self.items.select_parent(supplier.restaurant_id.clone()).await
    }

    /// The saved item stays on the form even when the picker cannot offer
    /// it, so a failed stock load never blanks the entry.
    pub async fn open_edit(
        &mut self,
        supplier: &Supplier,
        product: &SupplierProduct,
    ) -> Result<Refresh, SelectError> {
        self.editor.open_edit(product);
        self.items.clear();
        let refresh = self.items.select_parent(supplier.restaurant_id.clone()).await;
        if self.items.contains(&product.inventory_item_id) {
            self.items
                .choose(Choice::item(product.inventory_item_id.clone()))?;
        }
        Ok(refresh)
    }

    pub fn select_item(&mut self, id: &str) -> Result<(), SelectError> {
        self.items.choose(Choice::item(id))?;
        self.editor.form_mut().inventory_item_id = id.to_string();
        Ok(())
    }

    pub async fn submit<A>(
        &mut self,
        list: &mut ListController<A>,
    ) -> Result<Option<SupplierProduct>, SubmitError>
    where
        A: ResourceApi<Record = SupplierProduct, Input = SupplierProductInput>,
    {
        self.editor.submit(list).await
    }

    pub fn close(&mut self) {
        self.editor.close();
    }

    pub fn editor(&self) -> &RecordEditor<SupplierProductForm> {
        &self.editor
    }

    pub fn form_mut(&mut self) -> &mut SupplierProductForm {
        self.editor.form_mut()
    }

    pub fn items(&self) -> &CascadingSelect<String, InventoryItem> {
        &self.items
    }
}
