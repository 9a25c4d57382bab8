//! Profile completion: a student's faculty and class, a faculty's
//! public name and email.

use parking_lot::Mutex;
use tracing::{info, warn};

use super::{require_faculty, require_student, FlowResult, InFlight, ViewScope};
use crate::api::validation::{validate_profile_email, validate_required};
use crate::api::{ApiClient, FieldErrors};
use crate::guard::{DashboardTab, Route};
use crate::models::{Class, Faculty, FacultyListing};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassSelection {
    pub faculty_id: Option<i64>,
    pub class_id: Option<i64>,
}

#[derive(Debug)]
pub struct StudentProfileFlow {
    api: ApiClient,
    faculties: Mutex<Vec<FacultyListing>>,
    classes: Mutex<Vec<Class>>,
    selection: Mutex<ClassSelection>,
    errors: Mutex<FieldErrors>,
    loading: InFlight,
    submitting: InFlight,
}

impl StudentProfileFlow {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            faculties: Mutex::new(Vec::new()),
            classes: Mutex::new(Vec::new()),
            selection: Mutex::new(ClassSelection::default()),
            errors: Mutex::new(FieldErrors::new()),
            loading: InFlight::new(),
            submitting: InFlight::new(),
        }
    }

    pub fn faculties(&self) -> Vec<FacultyListing> {
        self.faculties.lock().clone()
    }

    pub fn classes(&self) -> Vec<Class> {
        self.classes.lock().clone()
    }

    pub fn selection(&self) -> ClassSelection {
        *self.selection.lock()
    }

    pub fn errors(&self) -> FieldErrors {
        self.errors.lock().clone()
    }

    pub async fn load_faculties(&self, scope: &ViewScope) -> FlowResult<()> {
        require_student(&self.api)?;
        let _loading = self.loading.begin()?;
        let faculties = scope.call(self.api.faculties()).await.map_err(|e| {
            warn!(error = %e, "Failed to load faculties");
            e
        })?;
        *self.faculties.lock() = faculties;
        Ok(())
    }

    /// Choose a faculty. The class choice is reset and the faculty's
    /// classes are fetched.
    pub async fn select_faculty(&self, scope: &ViewScope, faculty_id: Option<i64>) -> FlowResult<()> {
        *self.selection.lock() = ClassSelection {
            faculty_id,
            class_id: None,
        };
        {
            let mut errors = self.errors.lock();
            errors.clear("faculty_id");
            errors.clear("class_id");
        }
        self.classes.lock().clear();

        let Some(faculty_id) = faculty_id else {
            return Ok(());
        };
        let classes = scope
            .call(self.api.classes_for_faculty(faculty_id))
            .await
            .map_err(|e| {
                warn!(faculty_id, error = %e, "Failed to load classes");
                e
            })?;

        if self.selection().faculty_id == Some(faculty_id) {
            *self.classes.lock() = classes;
        }
        Ok(())
    }

    pub fn select_class(&self, class_id: Option<i64>) {
        self.selection.lock().class_id = class_id;
        self.errors.lock().clear("class_id");
    }

    /// Save the selection and mark the student fully registered
    pub async fn submit(&self, scope: &ViewScope) -> FlowResult<Route> {
        require_student(&self.api)?;
        let selection = self.selection();

        let mut errors = FieldErrors::new();
        errors
            .check(selection.faculty_id.is_some(), "faculty_id", "Please select a faculty")
            .check(selection.class_id.is_some(), "class_id", "Please select a class");
        let (faculty_id, class_id) = match (errors.finish(), selection.faculty_id, selection.class_id) {
            (Ok(()), Some(faculty_id), Some(class_id)) => (faculty_id, class_id),
            (result, _, _) => {
                let errors = result.err().unwrap_or_default();
                *self.errors.lock() = errors.clone();
                return Err(errors.into());
            }
        };

        let _submitting = self.submitting.begin()?;
        let student = scope
            .call(self.api.complete_student_profile(faculty_id, class_id))
            .await?;
        self.api.session().complete_student_profile(student)?;
        info!(faculty_id, class_id, "Student profile completed");
        Ok(Route::StudentMain)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacultyProfileForm {
    pub name: String,
    pub email: String,
}

impl FacultyProfileForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check(validate_required(&self.name), "name", "Faculty name is required");
        if !validate_required(&self.email) {
            errors.add("email", "Email is required");
        } else if !validate_profile_email(&self.email) {
            errors.add("email", "Email is invalid");
        }
        errors.finish()
    }
}

#[derive(Debug)]
pub struct FacultyProfileFlow {
    api: ApiClient,
    submitting: InFlight,
}

impl FacultyProfileFlow {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            submitting: InFlight::new(),
        }
    }

    /// The form as last saved, blank for a new account
    pub fn prefill(&self) -> FlowResult<FacultyProfileForm> {
        let faculty = require_faculty(&self.api)?;
        Ok(FacultyProfileForm {
            name: faculty.faculty_name.unwrap_or_default(),
            email: faculty.faculty_email.unwrap_or_default(),
        })
    }

    pub async fn submit(&self, scope: &ViewScope, form: &FacultyProfileForm) -> FlowResult<Route> {
        let current = require_faculty(&self.api)?;
        form.validate()?;

        let _submitting = self.submitting.begin()?;
        let name = form.name.trim();
        let email = form.email.trim();
        let response = scope
            .call(self.api.complete_faculty_profile(name, email))
            .await?;

        let updated = Faculty {
            faculty_id: Some(response.id),
            faculty_name: Some(name.to_string()),
            faculty_email: Some(email.to_string()),
            is_registered: Some(true),
            ..current
        };
        self.api.session().complete_faculty_profile(updated)?;
        info!(faculty_id = response.id, "Faculty profile completed");
        Ok(Route::FacultyDashboard(DashboardTab::Home))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Method;
    use crate::flows::FlowError;
    use crate::testing::{signed_in_faculty, signed_in_student, student, FakeTransport};
    use serde_json::json;

    #[tokio::test]
    async fn test_selecting_faculty_resets_class() {
        let transport = FakeTransport::new();
        transport.respond(Method::GET, "/faculty/class/2", 200, json!([{"id": 7, "name": "CS-101"}]));
        transport.respond(Method::GET, "/faculty/class/3", 200, json!([{"id": 9, "name": "ME-101"}]));
        let flow = StudentProfileFlow::new(signed_in_student(&transport, student(1)));
        let scope = ViewScope::new();

        flow.select_faculty(&scope, Some(2)).await.unwrap();
        flow.select_class(Some(7));
        flow.select_faculty(&scope, Some(3)).await.unwrap();

        assert_eq!(
            flow.selection(),
            ClassSelection {
                faculty_id: Some(3),
                class_id: None
            }
        );
        assert_eq!(flow.classes()[0].id, 9);
        assert_eq!(transport.calls()[0].bearer, None);
    }

    #[tokio::test]
    async fn test_both_choices_required() {
        let transport = FakeTransport::new();
        let flow = StudentProfileFlow::new(signed_in_student(&transport, student(1)));

        let err = flow.submit(&ViewScope::new()).await.unwrap_err();
        let errors = err.field_errors().unwrap();
        assert_eq!(errors.get("faculty_id"), Some("Please select a faculty"));
        assert_eq!(errors.get("class_id"), Some("Please select a class"));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_submit_completes_registration() {
        let transport = FakeTransport::new();
        transport.respond(Method::GET, "/faculty/class/2", 200, json!([{"id": 7, "name": "CS-101"}]));
        transport.respond(
            Method::POST,
            "/student/profile_details",
            200,
            json!({"id": 1, "name": "Anika", "email": "anika@college.edu", "faculty_id": 2, "class_id": 7, "is_registered": true}),
        );
        let api = signed_in_student(&transport, student(1));
        let flow = StudentProfileFlow::new(api.clone());
        let scope = ViewScope::new();

        flow.select_faculty(&scope, Some(2)).await.unwrap();
        flow.select_class(Some(7));
        assert_eq!(flow.submit(&scope).await.unwrap(), Route::StudentMain);

        assert!(api.session().is_fully_registered());
        assert_eq!(api.session().student().and_then(|s| s.class_id), Some(7));
        assert_eq!(api.session().token().as_deref(), Some("s-token"));
    }

    #[test]
    fn test_faculty_form_messages() {
        let errors = FacultyProfileForm::default().validate().unwrap_err();
        assert_eq!(errors.get("name"), Some("Faculty name is required"));
        assert_eq!(errors.get("email"), Some("Email is required"));

        let form = FacultyProfileForm {
            name: "Dr. R. Menon".to_string(),
            email: "menon@college".to_string(),
        };
        assert_eq!(form.validate().unwrap_err().get("email"), Some("Email is invalid"));
    }

    #[tokio::test]
    async fn test_faculty_profile_merges_response() {
        let transport = FakeTransport::new();
        transport.respond(Method::POST, "/faculty/faculty_profile", 200, json!({"id": 41, "name": "Dr. R. Menon"}));
        let api = signed_in_faculty(&transport);
        let flow = FacultyProfileFlow::new(api.clone());
        assert_eq!(flow.prefill().unwrap(), FacultyProfileForm::default());

        let form = FacultyProfileForm {
            name: "Dr. R. Menon".to_string(),
            email: "r.menon@college.edu".to_string(),
        };
        let route = flow.submit(&ViewScope::new(), &form).await.unwrap();
        assert_eq!(route, Route::FacultyDashboard(DashboardTab::Home));

        let stored = api.session().faculty().unwrap();
        assert_eq!(stored.faculty_id, Some(41));
        assert_eq!(stored.display_name(), "Dr. R. Menon");
        assert_eq!(stored.email, "menon@college.edu");
        assert!(stored.is_registered());
        assert_eq!(flow.prefill().unwrap(), form);
    }

    #[tokio::test]
    async fn test_student_cannot_use_faculty_form() {
        let transport = FakeTransport::new();
        let flow = FacultyProfileFlow::new(signed_in_student(&transport, student(1)));
        assert!(matches!(flow.prefill(), Err(FlowError::NotSignedIn(_))));
    }
}
