//! Identity models for the two roles, plus auth request/response shapes.

use serde::{Deserialize, Serialize};

/// The two kinds of account the platform knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Faculty,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Faculty => "faculty",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A student account as returned by login, registration and profile updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faculty_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_registered: Option<bool>,
}

impl Student {
    pub fn is_registered(&self) -> bool {
        self.is_registered.unwrap_or(false)
    }
}

/// A faculty account. The `faculty_*` fields are filled in by profile setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faculty {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faculty_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faculty_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faculty_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_registered: Option<bool>,
}

impl Faculty {
    pub fn is_registered(&self) -> bool {
        self.is_registered.unwrap_or(false)
    }

    /// Name shown on the dashboard: the profile name once set up.
    pub fn display_name(&self) -> &str {
        self.faculty_name.as_deref().unwrap_or(&self.name)
    }
}

/// Row of `GET /faculty/`, used by the student's faculty picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacultyListing {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Body of a successful login or registration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse<U> {
    pub user: U,
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentProfileRequest {
    pub faculty_id: i64,
    pub class_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FacultyProfileRequest {
    pub email: String,
    pub name: String,
}

/// The backend echoes the stored profile; only the id is used.
#[derive(Debug, Clone, Deserialize)]
pub struct FacultyProfileResponse {
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_missing_optional_fields() {
        let student: Student =
            serde_json::from_str(r#"{"id": 7, "name": "Asha", "email": "asha@uni.edu"}"#).unwrap();
        assert_eq!(student.class_id, None);
        assert!(!student.is_registered());
    }

    #[test]
    fn test_faculty_display_name_prefers_profile() {
        let mut faculty = Faculty {
            id: 1,
            name: "login-name".to_string(),
            email: "f@uni.edu".to_string(),
            faculty_id: None,
            faculty_name: None,
            faculty_email: None,
            is_registered: None,
        };
        assert_eq!(faculty.display_name(), "login-name");

        faculty.faculty_name = Some("Dr. Rao".to_string());
        assert_eq!(faculty.display_name(), "Dr. Rao");
    }

    #[test]
    fn test_auth_response_parses() {
        let body = r#"{"user": {"id": 3, "name": "Ravi", "email": "r@x.io", "is_registered": true}, "access_token": "tok"}"#;
        let parsed: AuthResponse<Student> = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.access_token, "tok");
        assert!(parsed.user.is_registered());
    }
}
