//! Feedback models: submission, the student's own list and the faculty view.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A star rating between 1 and 5 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(format!(
                "Rating must be between {} and {}",
                Self::MIN,
                Self::MAX
            ))
        }
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/5", self.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedbackRequest {
    pub subject_id: i64,
    pub rating: Rating,
    pub comment: String,
}

/// A stored feedback entry as echoed back by `POST /feedback/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: i64,
    #[serde(default, alias = "userId")]
    pub user_id: Option<i64>,
    #[serde(default, alias = "subjectId")]
    pub subject_id: Option<i64>,
    pub rating: u8,
    #[serde(default, alias = "comment")]
    pub message: String,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<String>,
}

/// Row of `GET /feedback/student`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentFeedback {
    pub id: i64,
    #[serde(alias = "subjectName")]
    pub subject_name: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Row of `GET /feedback/faculty`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacultyFeedback {
    pub id: i64,
    #[serde(default, alias = "userId")]
    pub user_id: Option<i64>,
    #[serde(default, alias = "subjectId")]
    pub subject_id: Option<i64>,
    pub rating: u8,
    #[serde(default, alias = "comment")]
    pub message: String,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<String>,
    #[serde(default, alias = "subjectName")]
    pub subject_name: String,
    #[serde(default, alias = "userName")]
    pub user_name: String,
}
