//! Managers and branch staff accounts.

use serde::{Deserialize, Serialize};
use validator::Validate;
use std::collections::{BTreeMap, BTreeSet};

use super::restaurants::status_label;
use super::{default_true, Record, RestResource, SortKey};
use crate::api::ApiClient;

pub const PATH: &str = "/managers";

/// Permission strings the back office hands out.
pub const PERMISSIONS: &[&str] = &[
    "view_orders",
    "create_order",
    "update_order_status",
    "manage_menu",
    "manage_inventory",
    "view_reports",
    "manage_staff",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaffRole {
    #[default]
    Manager,
    KitchenStaff,
    Waiter,
}

impl StaffRole {
    pub fn label(self) -> &'static str {
        match self {
            StaffRole::Manager => "Manager",
            StaffRole::KitchenStaff => "Kitchen staff",
            StaffRole::Waiter => "Waiter",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];
}

/// One day's shift, `HH:MM` 24-hour times.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Shift {
    pub start_time: String,
    pub end_time: String,
}

pub type ShiftSchedule = BTreeMap<Weekday, Shift>;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Manager {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: StaffRole,
    pub restaurant_id: String,
    pub branch_id: String,
    pub permissions: BTreeSet<String>,
    pub shift_schedule: ShiftSchedule,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ManagerInput {
    #[validate(length(min = 2, max = 100, message = "Name must be 2 to 100 characters"))]
    pub name: String,
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Enter a valid email address")
    )]
    pub email: String,
    pub phone: String,
    /// Only sent when creating an account or resetting its password.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
    pub role: StaffRole,
    #[validate(length(min = 1, message = "Restaurant is required"))]
    pub restaurant_id: String,
    #[validate(length(min = 1, message = "Branch is required"))]
    pub branch_id: String,
    pub permissions: BTreeSet<String>,
    pub shift_schedule: ShiftSchedule,
}

pub type ManagersApi = RestResource<Manager, ManagerInput>;

pub fn api(client: ApiClient) -> ManagersApi {
    RestResource::new(client, PATH)
}

pub fn for_restaurant(client: ApiClient, restaurant_id: &str) -> ManagersApi {
    api(client).scoped("restaurantId", restaurant_id)
}

impl Record for Manager {
    const KIND: &'static str = "manager";

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.email.clone(),
            self.phone.clone(),
            self.role.label().to_string(),
            status_label(self.is_active).to_string(),
        ]
    }

    fn sort_key(&self, column: &str) -> Option<SortKey> {
        match column {
            "name" => Some(SortKey::text(&self.name)),
            "email" => Some(SortKey::text(&self.email)),
            "role" => Some(SortKey::text(self.role.label())),
            "status" | "isActive" => Some(SortKey::Flag(self.is_active)),
            _ => None,
        }
    }

    fn removal_prompt(&self) -> String {
        format!(
            "Remove {}? They will no longer be able to sign in.",
            self.name
        )
    }

    fn is_active(&self) -> bool {
        self.is_active
    }
}
