//! Branches: physical locations, each owned by exactly one restaurant.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::restaurants::status_label;
use super::{default_true, Address, Record, Removal, RestResource, SortKey};
use crate::api::ApiClient;
use crate::error::ApiError;
use crate::selector::{ChildSource, SelectOption};

pub const PATH: &str = "/branches";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Branch {
    pub id: String,
    pub name: String,
    pub restaurant_id: String,
    /// e.g. "dine-in", "takeaway", "delivery".
    pub service_type: String,
    pub address: Address,
    pub phone: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Branch {
    pub fn to_ref(&self) -> BranchRef {
        BranchRef {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

/// Canonical branch key plus its display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BranchRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BranchInput {
    #[validate(length(min = 2, max = 100, message = "Name must be 2 to 100 characters"))]
    pub name: String,
    #[validate(length(min = 1, message = "Restaurant is required"))]
    pub restaurant_id: String,
    pub service_type: String,
    pub address: Address,
    pub phone: String,
    pub is_active: bool,
}

pub type BranchesApi = RestResource<Branch, BranchInput>;

pub fn api(client: ApiClient) -> BranchesApi {
    RestResource::new(client, PATH)
}

/// Branches of one restaurant only.
pub fn for_restaurant(client: ApiClient, restaurant_id: &str) -> BranchesApi {
    api(client).scoped("restaurantId", restaurant_id)
}

/// "Branches by restaurant" child source for the branch select.
#[derive(Clone)]
pub struct BranchesByRestaurant {
    client: ApiClient,
}

impl BranchesByRestaurant {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChildSource<String, Branch> for BranchesByRestaurant {
    async fn fetch_children(&self, restaurant_id: &String) -> Result<Vec<Branch>, ApiError> {
        let branches: Vec<Branch> = self
            .client
            .get_list(PATH, &[("restaurantId", restaurant_id.clone())])
            .await?;
        // Inactive branches cannot take new assignments.
        Ok(branches
            .into_iter()
            .filter(|b| {
                b.is_active && (b.restaurant_id.is_empty() || b.restaurant_id == *restaurant_id)
            })
            .collect())
    }
}

impl Record for Branch {
    const KIND: &'static str = "branch";

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.service_type.clone(),
            self.address.one_line(),
            self.phone.clone(),
            status_label(self.is_active).to_string(),
        ]
    }

    fn sort_key(&self, column: &str) -> Option<SortKey> {
        match column {
            "name" => Some(SortKey::text(&self.name)),
            "serviceType" => Some(SortKey::text(&self.service_type)),
            "city" => Some(SortKey::text(&self.address.city)),
            "status" | "isActive" => Some(SortKey::Flag(self.is_active)),
            _ => None,
        }
    }

    fn removal(&self) -> Removal {
        Removal::Soft
    }

    fn removal_prompt(&self) -> String {
        format!(
            "Deactivate branch {}? It will move to the inactive list and stop taking orders.",
            self.name
        )
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }
}

impl SelectOption for Branch {
    fn option_id(&self) -> &str {
        &self.id
    }

    fn option_label(&self) -> &str {
        &self.name
    }
}
