//! Restaurant → branch → (menu category, modifier) selection chain.

use std::sync::Arc;
use tracing::{debug, info};

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::resources::branches::{Branch, BranchesByRestaurant};
use crate::resources::menu::{
    BranchKey, BranchScope, CategoriesForBranch, MenuCategory, Modifier, ModifiersForBranch,
};
use crate::resources::restaurants::Restaurant;
use crate::resources::{Record, ResourceApi};
use crate::selector::{CascadingSelect, ChildSource, Choice, Refresh, SelectError};

pub struct ScopeChain {
    restaurants: Vec<Restaurant>,
    restaurant_id: Option<String>,
    branch: CascadingSelect<String, Branch>,
    category: Option<CascadingSelect<BranchKey, MenuCategory>>,
    modifiers: Option<CascadingSelect<BranchKey, Modifier>>,
    locked: bool,
}

impl ScopeChain {
    pub fn new(branches: Arc<dyn ChildSource<String, Branch>>) -> Self {
        Self {
            restaurants: Vec::new(),
            restaurant_id: None,
            branch: CascadingSelect::new("branch", branches),
            category: None,
            modifiers: None,
            locked: false,
        }
    }

    /// Restaurant and branch only, wired to the API.
    pub fn for_client(client: &ApiClient) -> Self {
        Self::new(Arc::new(BranchesByRestaurant::new(client.clone())))
    }

    /// Full menu chain: branch offers "global", categories and modifiers
    /// follow the (restaurant, branch) pair.
    pub fn menu(client: &ApiClient) -> Self {
        Self::for_client(client).with_global_branch().with_menu_children(
            Arc::new(CategoriesForBranch::new(client.clone())),
            Arc::new(ModifiersForBranch::new(client.clone())),
        )
    }

    pub fn with_global_branch(mut self) -> Self {
        self.branch = self.branch.with_global();
        self
    }

    pub fn with_menu_children(
        mut self,
        categories: Arc<dyn ChildSource<BranchKey, MenuCategory>>,
        modifiers: Arc<dyn ChildSource<BranchKey, Modifier>>,
    ) -> Self {
        self.category = Some(CascadingSelect::new("menu category", categories));
        self.modifiers = Some(CascadingSelect::new("modifier", modifiers));
        self
    }

    /// Load the restaurant options. Deactivated restaurants are not offered.
    pub async fn load_restaurants<A>(&mut self, api: &A) -> Result<(), ApiError>
    where
        A: ResourceApi<Record = Restaurant>,
    {
        if self.locked {
            return Ok(());
        }
        let restaurants = api.list().await?;
        self.set_restaurants(restaurants);
        Ok(())
    }

    pub fn set_restaurants(&mut self, restaurants: Vec<Restaurant>) {
        self.restaurants = restaurants.into_iter().filter(|r| r.is_active()).collect();
        debug!(count = self.restaurants.len(), "restaurant options loaded");
        if let Some(id) = &self.restaurant_id {
            if !self.restaurants.iter().any(|r| &r.id == id) {
                self.restaurant_id = None;
                self.branch.clear();
                self.clear_dependents();
            }
        }
    }

    /// Switch restaurant and reload branches. Dependents reload only if a
    /// branch selection survives the switch.
    pub async fn select_restaurant(&mut self, id: &str) -> Result<Refresh, SelectError> {
        if self.locked {
            return Err(SelectError::Locked);
        }
        if !self.restaurants.iter().any(|r| r.id == id) {
            return Err(SelectError::NotAnOption(id.to_string()));
        }

        self.restaurant_id = Some(id.to_string());
        self.clear_dependents();
        let refresh = self.branch.select_parent(id.to_string()).await;
        if refresh == Refresh::Applied && self.branch.selected().is_some() {
            self.reload_dependents().await;
        }
        Ok(refresh)
    }

    pub async fn select_branch(&mut self, choice: Choice) -> Result<(), SelectError> {
        self.branch.choose(choice)?;
        self.clear_dependents();
        self.reload_dependents().await;
        Ok(())
    }

    /// Pin the chain to a branch-scoped account; every level turns read-only.
    pub async fn lock_to_profile(&mut self, restaurant: Restaurant, branch: Branch) {
        info!(restaurant = %restaurant.id, branch = %branch.id, "selection locked to profile");
        self.restaurant_id = Some(restaurant.id.clone());
        self.branch.lock_to(restaurant.id.clone(), branch);
        self.restaurants = vec![restaurant];
        self.locked = true;
        self.clear_dependents();
        self.reload_dependents().await;
    }

    /// Back to nothing chosen, for a fresh create form. A locked chain keeps
    /// its pinned restaurant and branch and only drops dependent choices.
    pub fn reset(&mut self) {
        if self.locked {
            self.clear_dependent_choices();
            return;
        }
        self.restaurant_id = None;
        self.branch.clear();
        self.clear_dependents();
    }

    fn clear_dependent_choices(&self) {
        let cleared = [
            self.category.as_ref().map(CascadingSelect::clear_selection),
            self.modifiers.as_ref().map(CascadingSelect::clear_selection),
        ];
        for result in cleared.into_iter().flatten() {
            if let Err(err) = result {
                debug!(error = %err, "dependent selection kept");
            }
        }
    }

    fn clear_dependents(&self) {
        if let Some(category) = &self.category {
            category.clear();
        }
        if let Some(modifiers) = &self.modifiers {
            modifiers.clear();
        }
    }

    async fn reload_dependents(&self) {
        let Some(key) = self.branch_key() else {
            return;
        };
        match (&self.category, &self.modifiers) {
            (Some(category), Some(modifiers)) => {
                tokio::join!(
                    category.select_parent(key.clone()),
                    modifiers.select_parent(key)
                );
            }
            (Some(category), None) => {
                category.select_parent(key).await;
            }
            (None, Some(modifiers)) => {
                modifiers.select_parent(key).await;
            }
            (None, None) => {}
        }
    }

    /// The (restaurant, branch) pair once both are chosen.
    pub fn branch_key(&self) -> Option<BranchKey> {
        let restaurant_id = self.restaurant_id.clone()?;
        let branch = BranchScope::from(self.branch.selected()?);
        Some(BranchKey {
            restaurant_id,
            branch,
        })
    }

    pub fn restaurants(&self) -> &[Restaurant] {
        &self.restaurants
    }

    pub fn restaurant_id(&self) -> Option<&str> {
        self.restaurant_id.as_deref()
    }

    pub fn restaurant(&self) -> Option<&Restaurant> {
        let id = self.restaurant_id.as_deref()?;
        self.restaurants.iter().find(|r| r.id == id)
    }

    pub fn branch(&self) -> &CascadingSelect<String, Branch> {
        &self.branch
    }

    pub fn category(&self) -> Option<&CascadingSelect<BranchKey, MenuCategory>> {
        self.category.as_ref()
    }

    pub fn modifiers(&self) -> Option<&CascadingSelect<BranchKey, Modifier>> {
        self.modifiers.as_ref()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }
}
