//! Faculty class management: list, create, rename, delete.

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::list::ListState;
use super::{require_faculty, FlowError, FlowResult, Saved, ViewScope};
use crate::api::validation::validate_required;
use crate::api::{ApiClient, FieldErrors};
use crate::models::Class;

/// State of the create/rename dialog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassEditor {
    /// Id of the class being renamed; None when creating
    pub editing: Option<i64>,
    pub name: String,
    pub errors: FieldErrors,
}

#[derive(Debug)]
pub struct ClassesFlow {
    api: ApiClient,
    list: ListState<Class>,
    editor: Mutex<Option<ClassEditor>>,
}

impl ClassesFlow {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            list: ListState::new(),
            editor: Mutex::new(None),
        }
    }

    pub fn classes(&self) -> Vec<Class> {
        self.list.items()
    }

    pub fn is_loading(&self) -> bool {
        self.list.loads.is_active()
    }

    pub fn is_submitting(&self) -> bool {
        self.list.submitting.is_active()
    }

    /// Fetch the signed-in faculty's classes. On failure the current list
    /// is kept. When loads overlap, the one started last decides the list.
    pub async fn load(&self, scope: &ViewScope) -> FlowResult<()> {
        require_faculty(&self.api)?;
        let ticket = self.list.loads.begin();

        let classes = scope.call(self.api.faculty_classes()).await.map_err(|e| {
            warn!(error = %e, "Failed to load classes");
            e
        })?;
        if !self.list.replace_if_current(&ticket, classes) {
            debug!("Dropping superseded class list");
        }
        Ok(())
    }

    pub fn open_create(&self) {
        *self.editor.lock() = Some(ClassEditor::default());
    }

    pub fn open_edit(&self, class: &Class) {
        *self.editor.lock() = Some(ClassEditor {
            editing: Some(class.id),
            name: class.name.clone(),
            errors: FieldErrors::new(),
        });
    }

    pub fn editor(&self) -> Option<ClassEditor> {
        self.editor.lock().clone()
    }

    pub fn close_editor(&self) {
        *self.editor.lock() = None;
    }

    pub fn set_name(&self, name: impl Into<String>) -> FlowResult<()> {
        let mut editor = self.editor.lock();
        let editor = editor.as_mut().ok_or(FlowError::NoEditor)?;
        editor.name = name.into();
        editor.errors.clear("name");
        Ok(())
    }

    /// Create or rename, then refetch the list and close the dialog.
    pub async fn submit(&self, scope: &ViewScope) -> FlowResult<Saved> {
        let draft = self.editor().ok_or(FlowError::NoEditor)?;
        require_faculty(&self.api)?;

        let mut errors = FieldErrors::new();
        errors.check(validate_required(&draft.name), "name", "Class name is required");
        if let Err(errors) = errors.finish() {
            if let Some(editor) = self.editor.lock().as_mut() {
                editor.errors = errors.clone();
            }
            return Err(errors.into());
        }

        let _submitting = self.list.submitting.begin()?;
        let name = draft.name.trim();
        let saved = match draft.editing {
            Some(id) => {
                scope.call(self.api.update_class(id, name)).await?;
                info!(class_id = id, name, "Class renamed");
                Saved::Updated
            }
            None => {
                let class = scope.call(self.api.add_class(name)).await?;
                info!(class_id = class.id, name, "Class created");
                Saved::Created
            }
        };

        if let Err(e) = self.load(scope).await {
            if matches!(e, FlowError::Cancelled) {
                return Err(e);
            }
            warn!(error = %e, "Saved class but could not refresh the list");
        }
        self.close_editor();
        Ok(saved)
    }

    pub fn request_delete(&self, id: i64) {
        self.list.request_delete(id);
    }

    pub fn cancel_delete(&self) {
        self.list.cancel_delete();
    }

    pub fn pending_delete(&self) -> Option<i64> {
        self.list.pending_delete()
    }

    /// Delete the class waiting for confirmation and drop it from the list
    /// without refetching.
    pub async fn confirm_delete(&self, scope: &ViewScope) -> FlowResult<i64> {
        let _submitting = self.list.submitting.begin()?;
        let id = self.list.take_pending().ok_or(FlowError::NothingPending)?;

        scope.call(self.api.delete_class(id)).await?;
        self.list.remove(id);
        info!(class_id = id, "Class deleted");
        Ok(id)
    }
}
