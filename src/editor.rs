//! Create/edit dialog bound to one form.
//!
//! The dialog validates locally, submits through the page's
//! [`ListController`] and closes only when the server accepted the change.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::list::ListController;
use crate::resources::{Record, ResourceApi};

/// Per-field validation messages, rendered inline next to each input.
/// Fields use the payload's camelCase wire names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field`. The first message per field wins.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(value)` when nothing was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Keeps the first message of each field. A rule without a message shows
/// its code.
impl From<validator::ValidationErrors> for ValidationErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut out = ValidationErrors::new();
        for (field, failures) in errors.field_errors() {
            let field: &str = field.as_ref();
            if let Some(first) = failures.first() {
                let message = first.message.as_ref().unwrap_or(&first.code);
                out.add(camel_case(field), message.to_string());
            }
        }
        out
    }
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Form state for one record type.
pub trait Form: Default + Clone + Send {
    type Record: Record;
    type Input: Serialize + Send + Sync;

    /// Pre-populate from an existing record for edit mode.
    fn from_record(record: &Self::Record) -> Self;

    /// Check required fields and formats and build the server payload.
    fn validate(&self) -> Result<Self::Input, ValidationErrors>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit { id: String },
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("the editor is closed")]
    Closed,
    #[error("{0}")]
    Invalid(ValidationErrors),
    #[error(transparent)]
    Api(#[from] ApiError),
}

pub struct RecordEditor<F: Form> {
    open: bool,
    mode: EditorMode,
    form: F,
    errors: ValidationErrors,
    failure: Option<String>,
}

impl<F: Form> Default for RecordEditor<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Form> RecordEditor<F> {
    pub fn new() -> Self {
        Self {
            open: false,
            mode: EditorMode::Create,
            form: F::default(),
            errors: ValidationErrors::new(),
            failure: None,
        }
    }

    pub fn open_create(&mut self) {
        self.open_with(EditorMode::Create, F::default());
    }

    pub fn open_edit(&mut self, record: &F::Record) {
        self.open_with(
            EditorMode::Edit {
                id: record.id().to_string(),
            },
            F::from_record(record),
        );
    }

    fn open_with(&mut self, mode: EditorMode, form: F) {
        debug!(kind = F::Record::KIND, ?mode, "editor opened");
        self.open = true;
        self.mode = mode;
        self.form = form;
        self.errors = ValidationErrors::new();
        self.failure = None;
    }

    /// Close and reset to create-mode defaults.
    pub fn close(&mut self) {
        self.open = false;
        self.mode = EditorMode::Create;
        self.form = F::default();
        self.errors = ValidationErrors::new();
        self.failure = None;
    }

    /// Validate and send. On success the list has already reloaded and the
    /// editor is closed; on failure it stays open with the reason recorded.
    pub async fn submit<A>(
        &mut self,
        list: &mut ListController<A>,
    ) -> Result<Option<F::Record>, SubmitError>
    where
        A: ResourceApi<Record = F::Record, Input = F::Input>,
    {
        if !self.open {
            return Err(SubmitError::Closed);
        }

        let input = match self.form.validate() {
            Ok(input) => input,
            Err(errors) => {
                debug!(kind = F::Record::KIND, fields = errors.len(), "submit blocked by validation");
                self.errors = errors.clone();
                return Err(SubmitError::Invalid(errors));
            }
        };
        self.errors = ValidationErrors::new();
        self.failure = None;

        let result = match &self.mode {
            EditorMode::Create => list.create(&input).await,
            EditorMode::Edit { id } => list.update(id, &input).await,
        };

        match result {
            Ok(saved) => {
                self.close();
                Ok(saved)
            }
            Err(err) => {
                warn!(kind = F::Record::KIND, error = %err, "submit failed");
                self.failure = Some(err.user_message());
                Err(SubmitError::Api(err))
            }
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn mode(&self) -> &EditorMode {
        &self.mode
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut F {
        &mut self.form
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Submission failure shown at the top of the dialog.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }
}
