//! Student feedback: the submission form and the student's own history.

use parking_lot::Mutex;
use tracing::{info, warn};

use super::{require_student, FlowResult, InFlight, ViewScope};
use crate::api::validation::validate_required;
use crate::api::{ApiClient, FieldErrors};
use crate::models::{Feedback, Rating, StudentFeedback, Subject};

/// Form contents. A rating of 0 means none chosen yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackDraft {
    pub subject_id: Option<i64>,
    pub rating: u8,
    pub message: String,
}

impl FeedbackDraft {
    /// The validated request parts, or the message for each bad field
    pub fn validate(&self) -> Result<(i64, Rating, &str), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check(self.subject_id.is_some(), "subject_id", "Please select a subject");
        if self.rating == 0 {
            errors.add("rating", "Please provide a rating");
        }
        let rating = Rating::try_from(self.rating);
        if let Err(message) = &rating {
            errors.add("rating", message.as_str());
        }
        errors.check(validate_required(&self.message), "message", "Please provide feedback");

        match (errors.finish(), self.subject_id, rating) {
            (Ok(()), Some(subject_id), Ok(rating)) => Ok((subject_id, rating, self.message.trim())),
            (result, _, _) => Err(result.err().unwrap_or_default()),
        }
    }
}

#[derive(Debug)]
pub struct FeedbackForm {
    api: ApiClient,
    subjects: Mutex<Vec<Subject>>,
    draft: Mutex<FeedbackDraft>,
    errors: Mutex<FieldErrors>,
    loading: InFlight,
    submitting: InFlight,
}

impl FeedbackForm {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            subjects: Mutex::new(Vec::new()),
            draft: Mutex::new(FeedbackDraft::default()),
            errors: Mutex::new(FieldErrors::new()),
            loading: InFlight::new(),
            submitting: InFlight::new(),
        }
    }

    pub fn subjects(&self) -> Vec<Subject> {
        self.subjects.lock().clone()
    }

    pub fn draft(&self) -> FeedbackDraft {
        self.draft.lock().clone()
    }

    pub fn errors(&self) -> FieldErrors {
        self.errors.lock().clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.is_active()
    }

    /// Subjects of the student's class. A student without a class gets an
    /// empty picker and no request.
    pub async fn load_subjects(&self, scope: &ViewScope) -> FlowResult<()> {
        let student = require_student(&self.api)?;
        let Some(class_id) = student.class_id else {
            return Ok(());
        };

        let _loading = self.loading.begin()?;
        let subjects = scope.call(self.api.subjects(class_id)).await.map_err(|e| {
            warn!(class_id, error = %e, "Failed to load subjects");
            e
        })?;
        *self.subjects.lock() = subjects;
        Ok(())
    }

    pub fn set_subject(&self, subject_id: Option<i64>) {
        self.draft.lock().subject_id = subject_id;
        self.errors.lock().clear("subject_id");
    }

    pub fn set_rating(&self, rating: u8) {
        self.draft.lock().rating = rating;
        self.errors.lock().clear("rating");
    }

    pub fn set_message(&self, message: impl Into<String>) {
        self.draft.lock().message = message.into();
        self.errors.lock().clear("message");
    }

    /// Send the draft. On success the form is cleared.
    pub async fn submit(&self, scope: &ViewScope) -> FlowResult<Feedback> {
        require_student(&self.api)?;
        let draft = self.draft();
        let (subject_id, rating, message) = match draft.validate() {
            Ok(parts) => parts,
            Err(errors) => {
                *self.errors.lock() = errors.clone();
                return Err(errors.into());
            }
        };

        let _submitting = self.submitting.begin()?;
        let feedback = scope
            .call(self.api.submit_feedback(subject_id, rating, message))
            .await?;
        info!(subject_id, rating = rating.get(), "Feedback submitted");

        *self.draft.lock() = FeedbackDraft::default();
        *self.errors.lock() = FieldErrors::new();
        Ok(feedback)
    }
}

/// The signed-in student's submitted feedback
#[derive(Debug)]
pub struct MyFeedback {
    api: ApiClient,
    items: Mutex<Vec<StudentFeedback>>,
    loading: InFlight,
}

impl MyFeedback {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            items: Mutex::new(Vec::new()),
            loading: InFlight::new(),
        }
    }

    pub fn items(&self) -> Vec<StudentFeedback> {
        self.items.lock().clone()
    }

    pub async fn load(&self, scope: &ViewScope) -> FlowResult<()> {
        require_student(&self.api)?;
        let _loading = self.loading.begin()?;
        let items = scope.call(self.api.student_feedbacks()).await?;
        *self.items.lock() = items;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Method;
    use crate::flows::FlowError;
    use crate::models::Student;
    use crate::testing::{student, signed_in_student, FakeTransport};
    use serde_json::json;

    fn enrolled() -> Student {
        Student {
            faculty_id: Some(2),
            class_id: Some(7),
            is_registered: Some(true),
            ..student(1)
        }
    }

    #[test]
    fn test_draft_validation() {
        let errors = FeedbackDraft::default().validate().unwrap_err();
        assert_eq!(errors.get("subject_id"), Some("Please select a subject"));
        assert_eq!(errors.get("rating"), Some("Please provide a rating"));
        assert_eq!(errors.get("message"), Some("Please provide feedback"));

        let draft = FeedbackDraft {
            subject_id: Some(3),
            rating: 6,
            message: "ok".to_string(),
        };
        assert_eq!(
            draft.validate().unwrap_err().get("rating"),
            Some("Rating must be between 1 and 5")
        );

        let draft = FeedbackDraft {
            subject_id: Some(3),
            rating: 5,
            message: "  Clear notes ".to_string(),
        };
        let (subject_id, rating, message) = draft.validate().unwrap();
        assert_eq!((subject_id, rating.get(), message), (3, 5, "Clear notes"));
    }

    #[tokio::test]
    async fn test_subjects_come_from_students_class() {
        let transport = FakeTransport::new();
        transport.respond(Method::GET, "/subjects/7", 200, json!([{"id": 3, "name": "DBMS", "class_id": 7}]));
        let form = FeedbackForm::new(signed_in_student(&transport, enrolled()));

        form.load_subjects(&ViewScope::new()).await.unwrap();
        assert_eq!(form.subjects()[0].id, 3);
    }

    #[tokio::test]
    async fn test_student_without_class_loads_nothing() {
        let transport = FakeTransport::new();
        let form = FeedbackForm::new(signed_in_student(&transport, student(1)));

        form.load_subjects(&ViewScope::new()).await.unwrap();
        assert!(form.subjects().is_empty());
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_draft_sends_nothing() {
        let transport = FakeTransport::new();
        let form = FeedbackForm::new(signed_in_student(&transport, enrolled()));
        form.set_subject(Some(3));
        form.set_message("Good pace");

        let err = form.submit(&ViewScope::new()).await.unwrap_err();
        assert!(matches!(err, FlowError::Validation(_)));
        assert_eq!(form.errors().get("rating"), Some("Please provide a rating"));
        assert!(transport.calls().is_empty());

        form.set_rating(4);
        assert!(form.errors().is_empty());
    }

    #[tokio::test]
    async fn test_success_resets_draft() {
        let transport = FakeTransport::new();
        transport.respond(
            Method::POST,
            "/feedback/",
            200,
            json!({"id": 1, "subject_id": 3, "rating": 4, "message": "Good pace"}),
        );
        let form = FeedbackForm::new(signed_in_student(&transport, enrolled()));
        form.set_subject(Some(3));
        form.set_rating(4);
        form.set_message("Good pace");

        let feedback = form.submit(&ViewScope::new()).await.unwrap();
        assert_eq!(feedback.rating, 4);
        assert_eq!(form.draft(), FeedbackDraft::default());
        assert!(!form.is_submitting());
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_draft() {
        let transport = FakeTransport::new();
        transport.respond(Method::POST, "/feedback/", 400, json!({"detail": "Already submitted"}));
        let form = FeedbackForm::new(signed_in_student(&transport, enrolled()));
        form.set_subject(Some(3));
        form.set_rating(2);
        form.set_message("Too fast");

        let err = form.submit(&ViewScope::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "Already submitted");
        assert_eq!(form.draft().rating, 2);
    }
}
