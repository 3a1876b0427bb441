use super::check_payload;
use crate::editor::{Form, ValidationErrors};
use crate::resources::branches::{Branch, BranchInput};
use crate::resources::Address;

#[derive(Debug, Clone, PartialEq)]
pub struct BranchForm {
    pub name: String,
    pub restaurant_id: String,
    pub service_type: String,
    pub address: Address,
    pub phone: String,
    pub is_active: bool,
}

impl Default for BranchForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            restaurant_id: String::new(),
            service_type: String::new(),
            address: Address::default(),
            phone: String::new(),
            is_active: true,
        }
    }
}

impl BranchForm {
    /// A create form with the restaurant already chosen by the page filter.
    pub fn for_restaurant(restaurant_id: &str) -> Self {
        Self {
            restaurant_id: restaurant_id.to_string(),
            ..Self::default()
        }
    }
}

impl Form for BranchForm {
    type Record = Branch;
    type Input = BranchInput;

    fn from_record(record: &Branch) -> Self {
        Self {
            name: record.name.clone(),
            restaurant_id: record.restaurant_id.clone(),
            service_type: record.service_type.clone(),
            address: record.address.clone(),
            phone: record.phone.clone(),
            is_active: record.is_active,
        }
    }

    fn validate(&self) -> Result<BranchInput, ValidationErrors> {
        let input = BranchInput {
            name: self.name.trim().to_string(),
            restaurant_id: self.restaurant_id.trim().to_string(),
            service_type: self.service_type.trim().to_string(),
            address: self.address.clone(),
            phone: self.phone.trim().to_string(),
            is_active: self.is_active,
        };
        check_payload(&input).into_result(input)
    }
}
