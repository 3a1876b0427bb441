//! Manager/staff form and its restaurant → branch dialog.

use std::collections::BTreeSet;

use super::{check_payload, check_shift};
use crate::chain::ScopeChain;
use crate::editor::{Form, RecordEditor, SubmitError, ValidationErrors};
use crate::error::ApiError;
use crate::list::ListController;
use crate::resources::managers::{Manager, ManagerInput, ShiftSchedule, StaffRole, PERMISSIONS};
use crate::resources::restaurants::Restaurant;
use crate::resources::ResourceApi;
use crate::selector::{Choice, SelectError};

#[derive(Debug, Clone, PartialEq)]
pub struct ManagerForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Required for new accounts; blank on edit keeps the current one.
    pub password: String,
    pub role: StaffRole,
    pub restaurant_id: String,
    pub branch_id: String,
    pub permissions: BTreeSet<String>,
    pub shift_schedule: ShiftSchedule,
    is_new: bool,
}

impl Default for ManagerForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            password: String::new(),
            role: StaffRole::default(),
            restaurant_id: String::new(),
            branch_id: String::new(),
            permissions: BTreeSet::new(),
            shift_schedule: ShiftSchedule::new(),
            is_new: true,
        }
    }
}

impl Form for ManagerForm {
    type Record = Manager;
    type Input = ManagerInput;

    fn from_record(record: &Manager) -> Self {
        Self {
            name: record.name.clone(),
            email: record.email.clone(),
            phone: record.phone.clone(),
            password: String::new(),
            role: record.role,
            restaurant_id: record.restaurant_id.clone(),
            branch_id: record.branch_id.clone(),
            permissions: record.permissions.clone(),
            shift_schedule: record.shift_schedule.clone(),
            is_new: false,
        }
    }

    fn validate(&self) -> Result<ManagerInput, ValidationErrors> {
        let input = ManagerInput {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            password: (!self.password.is_empty()).then(|| self.password.clone()),
            role: self.role,
            restaurant_id: self.restaurant_id.trim().to_string(),
            branch_id: self.branch_id.trim().to_string(),
            permissions: self.permissions.clone(),
            shift_schedule: self.shift_schedule.clone(),
        };
        let mut errors = check_payload(&input);
        if self.is_new && input.password.is_none() {
            errors.add("password", "Password is required");
        }

        if self.permissions.is_empty() {
            errors.add("permissions", "Select at least one permission");
        } else if let Some(unknown) = self
            .permissions
            .iter()
            .find(|p| !PERMISSIONS.contains(&p.as_str()))
        {
            errors.add("permissions", format!("Unknown permission {unknown}"));
        }

        for shift in self.shift_schedule.values() {
            check_shift(&mut errors, "shiftSchedule", &shift.start_time, &shift.end_time);
        }

        errors.into_result(input)
    }
}

/// Manager dialog: restaurant first, then one of its branches.
pub struct ManagerEditor {
    editor: RecordEditor<ManagerForm>,
    chain: ScopeChain,
}

impl ManagerEditor {
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

    pub fn open_create(&mut self) {
        self.editor.open_create();
        self.chain.reset();
        self.sync_from_chain();
    }

    /// Restaurant first; the branch is chosen once that restaurant's
    /// branches have loaded.
    pub async fn open_edit(&mut self, manager: &Manager) -> Result<(), SelectError> {
        self.editor.open_edit(manager);
        if !self.chain.is_locked() {
            self.chain.select_restaurant(&manager.restaurant_id).await?;
            if self.chain.branch().contains(&manager.branch_id) {
                self.chain
                    .select_branch(Choice::item(manager.branch_id.clone()))
                    .await?;
            }
        }
        self.sync_from_chain();
        Ok(())
    }

    pub async fn select_restaurant(&mut self, id: &str) -> Result<(), SelectError> {
        self.chain.select_restaurant(id).await?;
        self.sync_from_chain();
        Ok(())
    }

    pub async fn select_branch(&mut self, branch_id: &str) -> Result<(), SelectError> {
        self.chain.select_branch(Choice::item(branch_id)).await?;
        self.sync_from_chain();
        Ok(())
    }

    pub fn toggle_permission(&mut self, permission: &str) -> Result<(), SelectError> {
        if !PERMISSIONS.contains(&permission) {
            return Err(SelectError::NotAnOption(permission.to_string()));
        }
        let permissions = &mut self.editor.form_mut().permissions;
        if !permissions.remove(permission) {
            permissions.insert(permission.to_string());
        }
        Ok(())
    }

    fn sync_from_chain(&mut self) {
        let restaurant_id = self.chain.restaurant_id().unwrap_or_default().to_string();
        let branch_id = self
            .chain
            .branch()
            .selected()
            .and_then(|c| c.as_item().map(ToString::to_string))
            .unwrap_or_default();
        let form = self.editor.form_mut();
        form.restaurant_id = restaurant_id;
        form.branch_id = branch_id;
    }

    pub async fn submit<A>(
        &mut self,
        list: &mut ListController<A>,
    ) -> Result<Option<Manager>, SubmitError>
    where
        A: ResourceApi<Record = Manager, Input = ManagerInput>,
    {
        self.sync_from_chain();
        self.editor.submit(list).await
    }

    pub fn close(&mut self) {
        self.editor.close();
    }

    pub fn editor(&self) -> &RecordEditor<ManagerForm> {
        &self.editor
    }

    pub fn form_mut(&mut self) -> &mut ManagerForm {
        self.editor.form_mut()
    }

    pub fn chain(&self) -> &ScopeChain {
        &self.chain
    }
}
