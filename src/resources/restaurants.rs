//! Restaurants (the business entity that owns branches).

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{default_true, Address, Record, Removal, RestResource, SortKey};
use crate::api::ApiClient;
use crate::forms::optional_email;
use crate::selector::SelectOption;

pub const PATH: &str = "/restaurants";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    pub business_type: String,
    pub address: Address,
    pub phone: String,
    pub email: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Fields the server accepts on create/update.
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantInput {
    #[validate(length(min = 2, max = 100, message = "Name must be 2 to 100 characters"))]
    pub name: String,
    pub business_type: String,
    pub address: Address,
    pub phone: String,
    #[validate(custom = "optional_email")]
    pub email: String,
    pub is_active: bool,
}

pub type RestaurantsApi = RestResource<Restaurant, RestaurantInput>;

pub fn api(client: ApiClient) -> RestaurantsApi {
    RestResource::new(client, PATH)
}

pub(crate) fn status_label(active: bool) -> &'static str {
    if active {
        "Active"
    } else {
        "Inactive"
    }
}

impl Record for Restaurant {
    const KIND: &'static str = "restaurant";

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.business_type.clone(),
            self.address.one_line(),
            self.phone.clone(),
            self.email.clone(),
            status_label(self.is_active).to_string(),
        ]
    }

    fn sort_key(&self, column: &str) -> Option<SortKey> {
        match column {
            "name" => Some(SortKey::text(&self.name)),
            "businessType" => Some(SortKey::text(&self.business_type)),
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
            "Deactivate {}? The restaurant and its branches will move to the inactive list.",
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

impl SelectOption for Restaurant {
    fn option_id(&self) -> &str {
        &self.id
    }

    fn option_label(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::from_wire;

    #[test]
    fn partial_payload_defaults_missing_fields() {
        let r: Restaurant =
            from_wire(serde_json::json!({"_id": "r1", "name": "Luigi's"})).expect("decode");
        assert_eq!(r.id, "r1");
        assert_eq!(r.business_type, "");
        assert!(r.is_active, "missing isActive means active");
        assert_eq!(r.address, Address::default());
    }

    #[test]
    fn input_serializes_camel_case() {
        let input = RestaurantInput {
            name: "Luigi's".into(),
            business_type: "restaurant".into(),
            address: Address::default(),
            phone: String::new(),
            email: String::new(),
            is_active: true,
        };
        let json = serde_json::to_value(&input).expect("encode");
        assert_eq!(json["businessType"], "restaurant");
        assert_eq!(json["isActive"], true);
        assert!(json.get("id").is_none());
    }
}
