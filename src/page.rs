//! Explicit per-page state: one list, one editor, one selected record.
//!
//! Nothing here is shared across pages; navigating away drops the page.

use tracing::debug;

use crate::editor::{Form, RecordEditor, SubmitError};
use crate::error::ApiError;
use crate::list::ListController;
use crate::notice::Notice;
use crate::resources::ResourceApi;

pub struct ResourcePage<A, F>
where
    A: ResourceApi,
    F: Form<Record = A::Record, Input = A::Input>,
{
    pub list: ListController<A>,
    pub editor: RecordEditor<F>,
    selected: Option<String>,
}

impl<A, F> ResourcePage<A, F>
where
    A: ResourceApi,
    F: Form<Record = A::Record, Input = A::Input>,
{
    pub fn new(api: A) -> Self {
        Self {
            list: ListController::new(api),
            editor: RecordEditor::new(),
            selected: None,
        }
    }

    /// Initial fetch when the page mounts.
    pub async fn mount(&mut self) -> Result<(), ApiError> {
        self.list.load().await
    }

    pub fn open_create(&mut self) {
        self.selected = None;
        self.editor.open_create();
    }

    /// Open the editor on a listed record; a stale id becomes a not-found
    /// notice instead of an empty dialog.
    pub fn open_edit(&mut self, id: &str) -> Result<(), ApiError> {
        match self.list.find(id) {
            Ok(record) => {
                let record = record.clone();
                self.editor.open_edit(&record);
                self.selected = Some(id.to_string());
                Ok(())
            }
            Err(err) => {
                debug!(id, "edit requested for a record that is not listed");
                self.selected = None;
                self.list.set_notice(Notice::from_api_error(&err));
                Err(err)
            }
        }
    }

    pub async fn submit(&mut self) -> Result<Option<A::Record>, SubmitError> {
        let saved = self.editor.submit(&mut self.list).await?;
        self.selected = None;
        Ok(saved)
    }

    pub fn close_editor(&mut self) {
        self.editor.close();
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&A::Record> {
        let id = self.selected.as_deref()?;
        self.list.find(id).ok()
    }
}
