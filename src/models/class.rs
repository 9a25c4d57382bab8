//! Class and subject models.

use serde::{Deserialize, Serialize};

/// A class owned by exactly one faculty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub id: i64,
    pub name: String,
    #[serde(default, alias = "facultyId")]
    pub faculty_id: Option<i64>,
}

/// A subject owned by exactly one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: i64,
    pub name: String,
    #[serde(default, alias = "classId")]
    pub class_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubjectRequest {
    pub class_id: i64,
    pub name: String,
}
