use super::check_payload;
use crate::editor::{Form, ValidationErrors};
use crate::resources::restaurants::{Restaurant, RestaurantInput};
use crate::resources::Address;

#[derive(Debug, Clone, PartialEq)]
pub struct RestaurantForm {
    pub name: String,
    pub business_type: String,
    pub address: Address,
    pub phone: String,
    pub email: String,
    pub is_active: bool,
}

impl Default for RestaurantForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            business_type: String::new(),
            address: Address::default(),
            phone: String::new(),
            email: String::new(),
            is_active: true,
        }
    }
}

impl Form for RestaurantForm {
    type Record = Restaurant;
    type Input = RestaurantInput;

    fn from_record(record: &Restaurant) -> Self {
        Self {
            name: record.name.clone(),
            business_type: record.business_type.clone(),
            address: record.address.clone(),
            phone: record.phone.clone(),
            email: record.email.clone(),
            is_active: record.is_active,
        }
    }

    fn validate(&self) -> Result<RestaurantInput, ValidationErrors> {
        let input = RestaurantInput {
            name: self.name.trim().to_string(),
            business_type: self.business_type.trim().to_string(),
            address: self.address.clone(),
            phone: self.phone.trim().to_string(),
            email: self.email.trim().to_string(),
            is_active: self.is_active,
        };
        check_payload(&input).into_result(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_restaurants_default_to_active() {
        let input = RestaurantForm {
            name: "Harbor Grill".into(),
            ..RestaurantForm::default()
        }
        .validate()
        .expect("valid");
        assert!(input.is_active);
        assert_eq!(input.email, "");
    }

    #[test]
    fn bad_email_and_short_name_are_reported() {
        let errors = RestaurantForm {
            name: "H".into(),
            email: "owner-at-example.com".into(),
            ..RestaurantForm::default()
        }
        .validate()
        .expect_err("invalid");
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["email", "name"]);
        assert_eq!(errors.get("email"), Some("Enter a valid email address"));
    }
}
