use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use super::error::detail_message;
use super::{ApiError, ApiRequest, ApiResult, Method, Transport};
use crate::models::{
    AuthResponse, Class, ClassRequest, Faculty, FacultyFeedback, FacultyListing,
    FacultyProfileRequest, FacultyProfileResponse, FacultySummary, Feedback, FeedbackRequest,
    LoginRequest, Rating, RegisterRequest, Student, StudentFeedback, StudentProfileRequest,
    StudentRecord, Subject, SubjectRequest,
};
use crate::session::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    None,
    Bearer,
}

/// Typed client for every backend endpoint.
///
/// Bearer endpoints read the token from the session store at call time.
/// A 401 on such a call expires the session before the error is returned.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    session: Arc<SessionStore>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, session: Arc<SessionStore>) -> Self {
        Self { transport, session }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    // ---------------------------------------------------------------------
    // Auth and profile
    // ---------------------------------------------------------------------

    /// Shared by students and faculty; the caller picks the user shape.
    pub async fn login<U: DeserializeOwned>(
        &self,
        email: &str,
        password: &str,
    ) -> ApiResult<AuthResponse<U>> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.send(Method::POST, "/auth/login", Some(encode(&body)?), Auth::None)
            .await
    }

    pub async fn register_student(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> ApiResult<AuthResponse<Student>> {
        let body = register_body(name, email, password);
        self.send(Method::POST, "/student/register", Some(encode(&body)?), Auth::None)
            .await
    }

    pub async fn register_faculty(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> ApiResult<AuthResponse<Faculty>> {
        let body = register_body(name, email, password);
        self.send(Method::POST, "/faculty/register", Some(encode(&body)?), Auth::None)
            .await
    }

    pub async fn complete_student_profile(&self, faculty_id: i64, class_id: i64) -> ApiResult<Student> {
        let body = StudentProfileRequest {
            faculty_id,
            class_id,
        };
        self.send(
            Method::POST,
            "/student/profile_details",
            Some(encode(&body)?),
            Auth::Bearer,
        )
        .await
    }

    pub async fn complete_faculty_profile(
        &self,
        name: &str,
        email: &str,
    ) -> ApiResult<FacultyProfileResponse> {
        let body = FacultyProfileRequest {
            email: email.to_string(),
            name: name.to_string(),
        };
        self.send(
            Method::POST,
            "/faculty/faculty_profile",
            Some(encode(&body)?),
            Auth::Bearer,
        )
        .await
    }

    // ---------------------------------------------------------------------
    // Classes
    // ---------------------------------------------------------------------

    /// Classes owned by the signed-in faculty
    pub async fn faculty_classes(&self) -> ApiResult<Vec<Class>> {
        self.send(Method::GET, "/faculty/class/", None, Auth::Bearer).await
    }

    pub async fn classes_for_faculty(&self, faculty_id: i64) -> ApiResult<Vec<Class>> {
        self.send(
            Method::GET,
            &format!("/faculty/class/{}", faculty_id),
            None,
            Auth::None,
        )
        .await
    }

    pub async fn add_class(&self, name: &str) -> ApiResult<Class> {
        let body = ClassRequest {
            name: name.to_string(),
        };
        self.send(Method::POST, "/faculty/class/add", Some(encode(&body)?), Auth::Bearer)
            .await
    }

    pub async fn update_class(&self, id: i64, name: &str) -> ApiResult<Class> {
        let body = ClassRequest {
            name: name.to_string(),
        };
        self.send(
            Method::PUT,
            &format!("/faculty/class/{}", id),
            Some(encode(&body)?),
            Auth::Bearer,
        )
        .await
    }

    pub async fn delete_class(&self, id: i64) -> ApiResult<()> {
        self.send::<serde_json::Value>(
            Method::DELETE,
            &format!("/faculty/class/{}", id),
            None,
            Auth::Bearer,
        )
        .await
        .map(|_| ())
    }

    // ---------------------------------------------------------------------
    // Subjects
    // ---------------------------------------------------------------------

    pub async fn subjects(&self, class_id: i64) -> ApiResult<Vec<Subject>> {
        self.send(Method::GET, &format!("/subjects/{}", class_id), None, Auth::None)
            .await
    }

    pub async fn add_subject(&self, name: &str, class_id: i64) -> ApiResult<Subject> {
        let body = SubjectRequest {
            class_id,
            name: name.to_string(),
        };
        self.send(Method::POST, "/subjects/add", Some(encode(&body)?), Auth::Bearer)
            .await
    }

    pub async fn update_subject(&self, id: i64, name: &str, class_id: i64) -> ApiResult<Subject> {
        let body = SubjectRequest {
            class_id,
            name: name.to_string(),
        };
        self.send(
            Method::PUT,
            &format!("/subjects/{}", id),
            Some(encode(&body)?),
            Auth::Bearer,
        )
        .await
    }

    pub async fn delete_subject(&self, id: i64) -> ApiResult<()> {
        self.send::<serde_json::Value>(
            Method::DELETE,
            &format!("/subjects/{}", id),
            None,
            Auth::Bearer,
        )
        .await
        .map(|_| ())
    }

    // ---------------------------------------------------------------------
    // Feedback
    // ---------------------------------------------------------------------

    pub async fn faculty_feedbacks(&self) -> ApiResult<Vec<FacultyFeedback>> {
        self.send(Method::GET, "/feedback/faculty", None, Auth::Bearer).await
    }

    pub async fn student_feedbacks(&self) -> ApiResult<Vec<StudentFeedback>> {
        self.send(Method::GET, "/feedback/student", None, Auth::Bearer).await
    }

    pub async fn submit_feedback(
        &self,
        subject_id: i64,
        rating: Rating,
        comment: &str,
    ) -> ApiResult<Feedback> {
        let body = FeedbackRequest {
            subject_id,
            rating,
            comment: comment.to_string(),
        };
        self.send(Method::POST, "/feedback/", Some(encode(&body)?), Auth::Bearer)
            .await
    }

    // ---------------------------------------------------------------------
    // Faculty directory and dashboard
    // ---------------------------------------------------------------------

    pub async fn faculties(&self) -> ApiResult<Vec<FacultyListing>> {
        self.send(Method::GET, "/faculty/", None, Auth::None).await
    }

    pub async fn faculty_summary(&self) -> ApiResult<FacultySummary> {
        self.send(Method::GET, "/faculty/summary", None, Auth::Bearer).await
    }

    pub async fn faculty_students(&self) -> ApiResult<Vec<StudentRecord>> {
        self.send(Method::GET, "/faculty/students", None, Auth::Bearer).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        auth: Auth,
    ) -> ApiResult<T> {
        let bearer = match auth {
            Auth::Bearer => self.session.token(),
            Auth::None => None,
        };

        debug!(method = %method, path, "API request");
        let response = self
            .transport
            .execute(ApiRequest {
                method: method.clone(),
                path: path.to_string(),
                body,
                bearer: bearer.clone(),
            })
            .await?;

        if response.status == 401 {
            let message = detail_message(&response.body);
            if let Some(token) = bearer.as_deref() {
                if self.session.expire_if(token) {
                    warn!(method = %method, path, "Credential rejected, ending session");
                }
            }
            return Err(ApiError::Unauthorized { message });
        }

        if !response.is_success() {
            let message = detail_message(&response.body);
            debug!(method = %method, path, status = response.status, message = %message, "API error");
            return Err(ApiError::Rejected {
                status: response.status,
                message,
            });
        }

        let text = if response.body.trim().is_empty() {
            "null"
        } else {
            response.body.as_str()
        };
        serde_json::from_str(text).map_err(|e| {
            warn!(method = %method, path, error = %e, "Unexpected response body");
            ApiError::Decode(e.to_string())
        })
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

fn register_body(name: &str, email: &str, password: &str) -> RegisterRequest {
    RegisterRequest {
        email: email.to_string(),
        password: password.to_string(),
        name: name.to_string(),
    }
}

fn encode<B: Serialize>(body: &B) -> ApiResult<serde_json::Value> {
    serde_json::to_value(body).map_err(|e| ApiError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionState;
    use crate::testing::{faculty, signed_in_faculty, FakeTransport};
    use serde_json::json;

    #[tokio::test]
    async fn test_bearer_token_comes_from_session() {
        let transport = FakeTransport::new();
        transport.respond(Method::GET, "/faculty/class/", 200, json!([]));
        let api = signed_in_faculty(&transport);

        api.faculty_classes().await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].bearer.as_deref(), Some("f-token"));
    }

    #[tokio::test]
    async fn test_public_endpoints_send_no_token() {
        let transport = FakeTransport::new();
        transport.respond(Method::GET, "/subjects/7", 200, json!([{"id": 1, "name": "DBMS", "class_id": 7}]));
        let api = signed_in_faculty(&transport);

        let subjects = api.subjects(7).await.unwrap();
        assert_eq!(subjects[0].name, "DBMS");
        assert_eq!(transport.calls()[0].bearer, None);
    }

    #[tokio::test]
    async fn test_unauthorized_expires_session() {
        let transport = FakeTransport::new();
        transport.respond(Method::GET, "/faculty/summary", 401, json!({"detail": "Could not validate credentials"}));
        let api = signed_in_faculty(&transport);

        let err = api.faculty_summary().await.unwrap_err();
        assert_eq!(
            err,
            ApiError::Unauthorized {
                message: "Could not validate credentials".to_string()
            }
        );
        assert_eq!(api.session().state(), SessionState::Anonymous);
        assert!(api.session().token().is_none());
    }

    #[tokio::test]
    async fn test_late_rejection_of_old_token_keeps_new_session() {
        let transport = FakeTransport::new();
        let gate = transport.gate(Method::GET, "/faculty/summary", 401, json!({"detail": "Token expired"}));
        let api = signed_in_faculty(&transport);

        let pending = tokio::spawn({
            let api = api.clone();
            async move { api.faculty_summary().await }
        });
        while transport.count(Method::GET, "/faculty/summary") == 0 {
            tokio::task::yield_now().await;
        }

        api.session().logout();
        api.session()
            .login_student(crate::testing::student(1), true, "s-token")
            .unwrap();
        gate.notify_one();

        let err = pending.await.unwrap().unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(api.session().student().map(|s| s.id), Some(1));
        assert_eq!(api.session().token().as_deref(), Some("s-token"));
    }

    #[tokio::test]
    async fn test_failed_login_leaves_session_alone() {
        let transport = FakeTransport::new();
        transport.respond(Method::POST, "/auth/login", 401, json!({"detail": "Invalid credentials"}));
        let api = signed_in_faculty(&transport);

        let err = api.login::<Faculty>("x@y.co", "wrong-pass").await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(api.session().faculty(), Some(faculty(2)));
    }

    #[tokio::test]
    async fn test_rejection_carries_detail() {
        let transport = FakeTransport::new();
        transport.respond(Method::POST, "/faculty/class/add", 400, json!({"detail": "Class already exists"}));
        let api = signed_in_faculty(&transport);

        let err = api.add_class("CS-201").await.unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.to_string(), "Class already exists");

        let call = &transport.calls()[0];
        assert_eq!(call.body, Some(json!({"name": "CS-201"})));
    }

    #[tokio::test]
    async fn test_delete_accepts_any_body() {
        let transport = FakeTransport::new();
        transport.respond_raw(Method::DELETE, "/subjects/3", 204, "");
        transport.respond(Method::DELETE, "/faculty/class/4", 200, json!({"message": "deleted"}));
        let api = signed_in_faculty(&transport);

        tokio_test::assert_ok!(api.delete_subject(3).await);
        tokio_test::assert_ok!(api.delete_class(4).await);
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_a_decode_error() {
        let transport = FakeTransport::new();
        transport.respond_raw(Method::GET, "/faculty/", 200, "<html>");
        let api = signed_in_faculty(&transport);

        assert!(matches!(api.faculties().await, Err(ApiError::Decode(_))));
    }

    #[tokio::test]
    async fn test_feedback_body_shape() {
        let transport = FakeTransport::new();
        transport.respond(
            Method::POST,
            "/feedback/",
            200,
            json!({"id": 10, "user_id": 1, "subject_id": 3, "rating": 4, "message": "Good pace"}),
        );
        let api = signed_in_faculty(&transport);

        let rating = Rating::try_from(4).unwrap();
        let feedback = api.submit_feedback(3, rating, "Good pace").await.unwrap();
        assert_eq!(feedback.id, 10);
        assert_eq!(
            transport.calls()[0].body,
            Some(json!({"subject_id": 3, "rating": 4, "comment": "Good pace"}))
        );
    }
}
