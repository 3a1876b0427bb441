//! Menu item form and its dialog with the restaurant → branch →
//! category/modifier chain.

use std::collections::BTreeSet;
use tracing::debug;

use super::{check_finite, check_payload};
use crate::chain::ScopeChain;
use crate::editor::{EditorMode, Form, RecordEditor, SubmitError, ValidationErrors};
use crate::error::ApiError;
use crate::list::ListController;
use crate::resources::menu::{BranchScope, Ingredient, MenuItem, MenuItemInput};
use crate::resources::restaurants::Restaurant;
use crate::resources::ResourceApi;
use crate::selector::{Choice, SelectError};

#[derive(Debug, Clone, PartialEq)]
pub struct MenuItemForm {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub cost: f64,
    pub restaurant_id: String,
    pub branch: Option<BranchScope>,
    pub category_id: String,
    pub modifiers: Vec<String>,
    pub ingredients: Vec<Ingredient>,
    pub tags: BTreeSet<String>,
    pub is_available: bool,
}

impl Default for MenuItemForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            price: 0.0,
            cost: 0.0,
            restaurant_id: String::new(),
            branch: Some(BranchScope::Global),
            category_id: String::new(),
            modifiers: Vec::new(),
            ingredients: Vec::new(),
            tags: BTreeSet::new(),
            is_available: true,
        }
    }
}

impl Form for MenuItemForm {
    type Record = MenuItem;
    type Input = MenuItemInput;

    fn from_record(record: &MenuItem) -> Self {
        Self {
            name: record.name.clone(),
            description: record.description.clone(),
            price: record.price,
            cost: record.cost,
            restaurant_id: record.restaurant_id.clone(),
            branch: Some(record.branch_id.clone()),
            category_id: record.category_id.clone(),
            modifiers: record.modifiers.clone(),
            ingredients: record.ingredients.clone(),
            tags: record.tags.clone(),
            is_available: record.is_available,
        }
    }

    fn validate(&self) -> Result<MenuItemInput, ValidationErrors> {
        let mut input = MenuItemInput {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            price: self.price,
            cost: self.cost,
            category_id: self.category_id.trim().to_string(),
            restaurant_id: self.restaurant_id.trim().to_string(),
            branch_id: self.branch.clone().unwrap_or_default(),
            modifiers: self.modifiers.clone(),
            ingredients: Vec::new(),
            tags: Default::default(),
            is_available: self.is_available,
        };
        let mut errors = check_payload(&input);
        check_finite(&mut errors, "price", input.price);
        check_finite(&mut errors, "cost", input.cost);
        if self.branch.is_none() {
            errors.add("branchId", "Branch is required");
        }

        let mut ingredients = Vec::with_capacity(self.ingredients.len());
        for ingredient in &self.ingredients {
            let id = ingredient.inventory_item_id.trim();
            if id.is_empty() {
                errors.add("ingredients", "Every ingredient needs an inventory item");
            }
            if !ingredient.quantity.is_finite() || ingredient.quantity <= 0.0 {
                errors.add("ingredients", "Ingredient quantities must be greater than zero");
            }
            ingredients.push(Ingredient {
                inventory_item_id: id.to_string(),
                quantity: ingredient.quantity,
                unit: ingredient.unit.trim().to_string(),
            });
        }

        input.ingredients = ingredients;
        input.tags = self
            .tags
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        errors.into_result(input)
    }
}

/// Menu item dialog. Dropdown changes go through the chain and are mirrored
/// into the form so the payload always matches what the selects show.
pub struct MenuItemEditor {
    editor: RecordEditor<MenuItemForm>,
    chain: ScopeChain,
}

impl MenuItemEditor {
    /// `chain` must carry menu category and modifier selects.
    pub fn new(chain: ScopeChain) -> Self {
        Self {
            editor: RecordEditor::new(),
            chain,
        }
    }

    pub async fn load_restaurants<A>(&mut self, api: &A) -> Result<(), ApiError>
    where
        A: ResourceApi<Record = Restaurant>,
    {
        self.chain.load_restaurants(api).await
    }

    /// Fresh form on a reset chain. The branch starts at "global" unless
    /// the account is pinned to one.
    pub async fn open_create(&mut self) -> Result<(), SelectError> {
        self.editor.open_create();
        self.chain.reset();
        let seeded = if self.chain.is_locked() {
            Ok(())
        } else {
            self.chain.select_branch(Choice::Global).await
        };
        self.sync_from_chain();
        seeded
    }

    /// Re-seed the chain from `item` one level at a time, each level
    /// waiting for its parent's options before selecting.
    pub async fn open_edit(&mut self, item: &MenuItem) -> Result<(), SelectError> {
        self.editor.open_edit(item);

        if !self.chain.is_locked() {
            self.chain.select_restaurant(&item.restaurant_id).await?;
            self.chain.select_branch(item.branch_id.to_choice()).await?;
        }
        if let Some(category) = self.chain.category() {
            if category.contains(&item.category_id) {
                category.choose(Choice::item(item.category_id.clone()))?;
            } else {
                debug!(item = %item.id, category = %item.category_id, "category not offered at this branch");
            }
        }
        self.sync_from_chain();
        Ok(())
    }

    /// Modifiers belong to a branch, so a restaurant switch drops them.
    pub async fn select_restaurant(&mut self, id: &str) -> Result<(), SelectError> {
        self.chain.select_restaurant(id).await?;
        self.editor.form_mut().modifiers.clear();
        self.sync_from_chain();
        Ok(())
    }

    pub async fn select_branch(&mut self, choice: Choice) -> Result<(), SelectError> {
        self.chain.select_branch(choice).await?;
        self.sync_from_chain();
        Ok(())
    }

    pub fn select_category(&mut self, id: &str) -> Result<(), SelectError> {
        if let Some(category) = self.chain.category() {
            category.choose(Choice::item(id))?;
        }
        self.sync_from_chain();
        Ok(())
    }

    /// Add or remove a modifier; only modifiers offered at the branch count.
    pub fn toggle_modifier(&mut self, id: &str) -> Result<(), SelectError> {
        let offered = self.chain.modifiers().is_some_and(|m| m.contains(id));
        let modifiers = &mut self.editor.form_mut().modifiers;
        if let Some(pos) = modifiers.iter().position(|m| m == id) {
            modifiers.remove(pos);
            return Ok(());
        }
        if !offered {
            return Err(SelectError::NotAnOption(id.to_string()));
        }
        modifiers.push(id.to_string());
        Ok(())
    }

    /// Ids not offered at the branch are dropped, but only against a loaded,
    /// non-empty option set. A failed or empty load keeps what the item had.
    fn available_modifiers(&self, ids: &[String]) -> Vec<String> {
        match self.chain.modifiers() {
            Some(select)
                if select.parent().is_some()
                    && !select.is_loading()
                    && select.error().is_none()
                    && !select.options().is_empty() =>
            {
                ids.iter().filter(|id| select.contains(id)).cloned().collect()
            }
            _ => ids.to_vec(),
        }
    }

    fn sync_from_chain(&mut self) {
        let restaurant_id = self.chain.restaurant_id().unwrap_or_default().to_string();
        let branch = self.chain.branch().selected().map(BranchScope::from);
        let category_id = self
            .chain
            .category()
            .and_then(|c| c.selected())
            .and_then(|c| c.as_item().map(ToString::to_string))
            .unwrap_or_default();
        let modifiers = self.available_modifiers(&self.editor.form().modifiers);

        let form = self.editor.form_mut();
        form.restaurant_id = restaurant_id;
        form.branch = branch;
        form.category_id = category_id;
        form.modifiers = modifiers;
    }

    pub async fn submit<A>(
        &mut self,
        list: &mut ListController<A>,
    ) -> Result<Option<MenuItem>, SubmitError>
    where
        A: ResourceApi<Record = MenuItem, Input = MenuItemInput>,
    {
        self.sync_from_chain();
        self.editor.submit(list).await
    }

    pub fn close(&mut self) {
        self.editor.close();
    }

    pub fn editor(&self) -> &RecordEditor<MenuItemForm> {
        &self.editor
    }

    pub fn form_mut(&mut self) -> &mut MenuItemForm {
        self.editor.form_mut()
    }

    pub fn chain(&self) -> &ScopeChain {
        &self.chain
    }

    pub fn mode(&self) -> &EditorMode {
        self.editor.mode()
    }
}
