//! Faculty dashboard aggregates.

use serde::{Deserialize, Serialize};

/// Counts shown on the faculty dashboard home.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacultySummary {
    #[serde(default)]
    pub classes: u64,
    #[serde(default)]
    pub subjects: u64,
    #[serde(default)]
    pub feedbacks: u64,
}

/// Row of `GET /faculty/students`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: i64,
    pub student_name: String,
    pub student_email: String,
    #[serde(default)]
    pub student_class_name: String,
}
