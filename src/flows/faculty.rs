//! Read-only faculty dashboard views: summary counts, received feedback
//! and the students roster.

use parking_lot::Mutex;
use tracing::warn;

use super::{require_faculty, FlowResult, InFlight, ViewScope};
use crate::api::ApiClient;
use crate::models::{FacultyFeedback, FacultySummary, StudentRecord};

#[derive(Debug)]
pub struct DashboardSummary {
    api: ApiClient,
    summary: Mutex<FacultySummary>,
    loading: InFlight,
}

impl DashboardSummary {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            summary: Mutex::new(FacultySummary::default()),
            loading: InFlight::new(),
        }
    }

    /// Zero counts until the first successful load
    pub fn summary(&self) -> FacultySummary {
        *self.summary.lock()
    }

    pub async fn load(&self, scope: &ViewScope) -> FlowResult<FacultySummary> {
        require_faculty(&self.api)?;
        let _loading = self.loading.begin()?;
        let summary = scope.call(self.api.faculty_summary()).await?;
        *self.summary.lock() = summary;
        Ok(summary)
    }
}

/// Every feedback entry on the faculty's subjects, newest state from the
/// backend as a flat list.
#[derive(Debug)]
pub struct FeedbackReview {
    api: ApiClient,
    items: Mutex<Vec<FacultyFeedback>>,
    loading: InFlight,
}

impl FeedbackReview {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            items: Mutex::new(Vec::new()),
            loading: InFlight::new(),
        }
    }

    pub fn items(&self) -> Vec<FacultyFeedback> {
        self.items.lock().clone()
    }

    pub async fn load(&self, scope: &ViewScope) -> FlowResult<()> {
        require_faculty(&self.api)?;
        let _loading = self.loading.begin()?;
        let items = scope.call(self.api.faculty_feedbacks()).await?;
        *self.items.lock() = items;
        Ok(())
    }
}

// -------------------------------------------------------------------------
// Students roster
// -------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ClassFilter {
    #[default]
    All,
    Named(String),
}

impl ClassFilter {
    /// "all" (any case) or an empty value means no filter
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            ClassFilter::All
        } else {
            ClassFilter::Named(value.to_string())
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterFilter {
    pub search: String,
    pub class: ClassFilter,
}

impl RosterFilter {
    pub fn matches(&self, student: &StudentRecord) -> bool {
        let needle = self.search.trim().to_lowercase();
        let found = needle.is_empty()
            || student.student_name.to_lowercase().contains(&needle)
            || student.student_email.to_lowercase().contains(&needle);
        let in_class = match &self.class {
            ClassFilter::All => true,
            ClassFilter::Named(name) => student.student_class_name == *name,
        };
        found && in_class
    }
}

/// Filtered roster plus the total it was drawn from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterView {
    pub shown: Vec<StudentRecord>,
    pub total: usize,
}

impl RosterView {
    pub fn caption(&self) -> String {
        format!("Showing {} of {} students", self.shown.len(), self.total)
    }
}

#[derive(Debug)]
pub struct StudentsRoster {
    api: ApiClient,
    students: Mutex<Vec<StudentRecord>>,
    class_names: Mutex<Vec<String>>,
    loading: InFlight,
}

impl StudentsRoster {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            students: Mutex::new(Vec::new()),
            class_names: Mutex::new(Vec::new()),
            loading: InFlight::new(),
        }
    }

    pub fn students(&self) -> Vec<StudentRecord> {
        self.students.lock().clone()
    }

    /// Names offered by the class filter
    pub fn class_names(&self) -> Vec<String> {
        self.class_names.lock().clone()
    }

    /// Fetch students and classes together. The roster needs the
    /// students; a failed class fetch only empties the filter options.
    pub async fn load(&self, scope: &ViewScope) -> FlowResult<()> {
        require_faculty(&self.api)?;
        let _loading = self.loading.begin()?;

        let (students, classes) = scope
            .run(futures::future::join(
                self.api.faculty_students(),
                self.api.faculty_classes(),
            ))
            .await?;

        let students = students?;
        match classes {
            Ok(classes) => {
                *self.class_names.lock() = classes.into_iter().map(|class| class.name).collect();
            }
            Err(e) => warn!(error = %e, "Failed to load classes for the roster filter"),
        }
        *self.students.lock() = students;
        Ok(())
    }

    pub fn view(&self, filter: &RosterFilter) -> RosterView {
        let students = self.students.lock();
        RosterView {
            shown: students
                .iter()
                .filter(|student| filter.matches(student))
                .cloned()
                .collect(),
            total: students.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Method;
    use crate::testing::{signed_in_faculty, FakeTransport};
    use serde_json::json;

    fn roster_transport() -> std::sync::Arc<FakeTransport> {
        let transport = FakeTransport::new();
        transport.respond(
            Method::GET,
            "/faculty/students",
            200,
            json!([
                {"id": 1, "student_name": "Anika Rao", "student_email": "anika@college.edu", "student_class_name": "CS-101"},
                {"id": 2, "student_name": "Dev Patel", "student_email": "dev@college.edu", "student_class_name": "CS-102"},
                {"id": 3, "student_name": "Meera Iyer", "student_email": "meera@college.edu", "student_class_name": "CS-101"}
            ]),
        );
        transport.respond(
            Method::GET,
            "/faculty/class/",
            200,
            json!([{"id": 7, "name": "CS-101"}, {"id": 8, "name": "CS-102"}]),
        );
        transport
    }

    #[tokio::test]
    async fn test_roster_search_and_class_filter() {
        let transport = roster_transport();
        let roster = StudentsRoster::new(signed_in_faculty(&transport));
        roster.load(&ViewScope::new()).await.unwrap();
        assert_eq!(roster.class_names(), vec!["CS-101", "CS-102"]);

        let all = roster.view(&RosterFilter::default());
        assert_eq!(all.caption(), "Showing 3 of 3 students");

        let by_class = roster.view(&RosterFilter {
            search: String::new(),
            class: ClassFilter::parse("CS-101"),
        });
        assert_eq!(by_class.shown.len(), 2);

        let by_search = roster.view(&RosterFilter {
            search: "DEV@".to_string(),
            class: ClassFilter::parse("all"),
        });
        assert_eq!(by_search.shown[0].id, 2);
        assert_eq!(by_search.caption(), "Showing 1 of 3 students");

        let none = roster.view(&RosterFilter {
            search: "meera".to_string(),
            class: ClassFilter::Named("CS-102".to_string()),
        });
        assert!(none.shown.is_empty());
    }

    #[tokio::test]
    async fn test_roster_survives_class_failure() {
        let transport = FakeTransport::new();
        transport.respond(Method::GET, "/faculty/students", 200, json!([]));
        transport.respond(Method::GET, "/faculty/class/", 500, json!({"detail": "boom"}));
        let roster = StudentsRoster::new(signed_in_faculty(&transport));

        roster.load(&ViewScope::new()).await.unwrap();
        assert!(roster.class_names().is_empty());
        assert_eq!(transport.count(Method::GET, "/faculty/class/"), 1);
    }

    #[tokio::test]
    async fn test_roster_failure_keeps_students() {
        let transport = roster_transport();
        transport.unreachable(Method::GET, "/faculty/students");
        let roster = StudentsRoster::new(signed_in_faculty(&transport));
        let scope = ViewScope::new();

        roster.load(&scope).await.unwrap();
        assert!(roster.load(&scope).await.is_err());
        assert_eq!(roster.students().len(), 3);
    }

    #[tokio::test]
    async fn test_summary_and_feedback_lists() {
        let transport = FakeTransport::new();
        transport.respond(Method::GET, "/faculty/summary", 200, json!({"classes": 2, "subjects": 5, "feedbacks": 11}));
        transport.respond(
            Method::GET,
            "/feedback/faculty",
            200,
            json!([{"id": 1, "rating": 4, "message": "Good pace", "subjectName": "DBMS", "userName": "Anika"}]),
        );
        let api = signed_in_faculty(&transport);
        let scope = ViewScope::new();

        let summary = DashboardSummary::new(api.clone());
        assert_eq!(summary.summary(), FacultySummary::default());
        let counts = summary.load(&scope).await.unwrap();
        assert_eq!((counts.classes, counts.subjects, counts.feedbacks), (2, 5, 11));

        let review = FeedbackReview::new(api);
        review.load(&scope).await.unwrap();
        assert_eq!(review.items()[0].subject_name, "DBMS");
        assert_eq!(review.items()[0].user_name, "Anika");
    }
}
