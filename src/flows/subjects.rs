//! Faculty subject management, scoped to one selected class at a time.

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::list::ListState;
use super::{require_faculty, FlowError, FlowResult, InFlight, Saved, ViewScope};
use crate::api::validation::validate_required;
use crate::api::{ApiClient, FieldErrors};
use crate::models::{Class, Subject};

/// State of the create/rename dialog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectEditor {
    pub editing: Option<i64>,
    pub name: String,
    pub class_id: Option<i64>,
    pub errors: FieldErrors,
}

#[derive(Debug)]
pub struct SubjectsFlow {
    api: ApiClient,
    classes: Mutex<Vec<Class>>,
    classes_loading: InFlight,
    selected: Mutex<Option<i64>>,
    list: ListState<Subject>,
    editor: Mutex<Option<SubjectEditor>>,
}

impl SubjectsFlow {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            classes: Mutex::new(Vec::new()),
            classes_loading: InFlight::new(),
            selected: Mutex::new(None),
            list: ListState::new(),
            editor: Mutex::new(None),
        }
    }

    pub fn classes(&self) -> Vec<Class> {
        self.classes.lock().clone()
    }

    pub fn selected_class(&self) -> Option<i64> {
        *self.selected.lock()
    }

    pub fn subjects(&self) -> Vec<Subject> {
        self.list.items()
    }

    pub fn is_loading(&self) -> bool {
        self.classes_loading.is_active() || self.list.loads.is_active()
    }

    pub fn is_submitting(&self) -> bool {
        self.list.submitting.is_active()
    }

    /// Fetch the faculty's classes. When no class is selected yet, the
    /// first one is selected and its subjects loaded.
    pub async fn load_classes(&self, scope: &ViewScope) -> FlowResult<()> {
        require_faculty(&self.api)?;
        let auto_select = {
            let _loading = self.classes_loading.begin()?;
            let classes = scope.call(self.api.faculty_classes()).await.map_err(|e| {
                warn!(error = %e, "Failed to load classes");
                e
            })?;

            let first = classes.first().map(|class| class.id);
            *self.classes.lock() = classes;
            match self.selected_class() {
                None => first,
                Some(_) => None,
            }
        };

        if let Some(class_id) = auto_select {
            debug!(class_id, "Selecting first class");
            self.select_class(scope, Some(class_id)).await?;
        }
        Ok(())
    }

    /// Switch the class filter and reload its subjects. A load still running
    /// for an earlier selection is superseded, not waited on.
    pub async fn select_class(&self, scope: &ViewScope, class_id: Option<i64>) -> FlowResult<()> {
        *self.selected.lock() = class_id;
        match class_id {
            Some(class_id) => self.load_subjects(scope, class_id).await,
            None => {
                let ticket = self.list.loads.begin();
                self.list.replace_if_current(&ticket, Vec::new());
                Ok(())
            }
        }
    }

    async fn load_subjects(&self, scope: &ViewScope, class_id: i64) -> FlowResult<()> {
        let ticket = self.list.loads.begin();
        let subjects = scope.call(self.api.subjects(class_id)).await.map_err(|e| {
            warn!(class_id, error = %e, "Failed to load subjects");
            e
        })?;

        if self.selected_class() != Some(class_id) || !self.list.replace_if_current(&ticket, subjects) {
            debug!(class_id, "Dropping superseded subject list");
        }
        Ok(())
    }

    pub fn open_create(&self) {
        *self.editor.lock() = Some(SubjectEditor {
            class_id: self.selected_class(),
            ..SubjectEditor::default()
        });
    }

    pub fn open_edit(&self, subject: &Subject) {
        *self.editor.lock() = Some(SubjectEditor {
            editing: Some(subject.id),
            name: subject.name.clone(),
            class_id: subject.class_id.or_else(|| self.selected_class()),
            errors: FieldErrors::new(),
        });
    }

    pub fn editor(&self) -> Option<SubjectEditor> {
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

    pub fn set_class(&self, class_id: Option<i64>) -> FlowResult<()> {
        let mut editor = self.editor.lock();
        let editor = editor.as_mut().ok_or(FlowError::NoEditor)?;
        editor.class_id = class_id;
        editor.errors.clear("class_id");
        Ok(())
    }

    pub async fn submit(&self, scope: &ViewScope) -> FlowResult<Saved> {
        let draft = self.editor().ok_or(FlowError::NoEditor)?;
        require_faculty(&self.api)?;

        let mut errors = FieldErrors::new();
        errors.check(validate_required(&draft.name), "name", "Subject name is required");
        errors.check(draft.class_id.is_some(), "class_id", "Please select a class");
        let class_id = match (errors.finish(), draft.class_id) {
            (Ok(()), Some(class_id)) => class_id,
            (result, _) => {
                let errors = result.err().unwrap_or_default();
                if let Some(editor) = self.editor.lock().as_mut() {
                    editor.errors = errors.clone();
                }
                return Err(errors.into());
            }
        };

        let _submitting = self.list.submitting.begin()?;
        let name = draft.name.trim();
        let saved = match draft.editing {
            Some(id) => {
                scope.call(self.api.update_subject(id, name, class_id)).await?;
                info!(subject_id = id, class_id, name, "Subject updated");
                Saved::Updated
            }
            None => {
                let subject = scope.call(self.api.add_subject(name, class_id)).await?;
                info!(subject_id = subject.id, class_id, name, "Subject created");
                Saved::Created
            }
        };

        let selected = self.selected_class();
        if let Some(selected) = selected {
            if selected == class_id || saved == Saved::Updated {
                if let Err(e) = self.load_subjects(scope, selected).await {
                    if matches!(e, FlowError::Cancelled) {
                        return Err(e);
                    }
                    warn!(error = %e, "Saved subject but could not refresh the list");
                }
            }
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

    pub async fn confirm_delete(&self, scope: &ViewScope) -> FlowResult<i64> {
        let _submitting = self.list.submitting.begin()?;
        let id = self.list.take_pending().ok_or(FlowError::NothingPending)?;

        scope.call(self.api.delete_subject(id)).await?;
        self.list.remove(id);
        info!(subject_id = id, "Subject deleted");
        Ok(id)
    }
}
