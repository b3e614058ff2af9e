//! Types for classes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::schools::SchoolSummary;

pub(crate) const CLASS_COLUMNS: &str =
    "c.class_id, c.school_id, c.class_name, c.teacher_name, c.academic_year, c.event_id, c.created_at";

/// A class row. Every class belongs to exactly one school.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    pub class_id: i64,
    pub school_id: i64,
    pub class_name: String,
    pub teacher_name: Option<String>,
    pub academic_year: Option<i32>,
    pub event_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewClass {
    pub school_id: i64,
    pub class_name: String,
    #[serde(default)]
    pub teacher_name: Option<String>,
    #[serde(default)]
    pub academic_year: Option<i32>,
    #[serde(default)]
    pub event_id: Option<i64>,
}

/// The class fields joined onto photos and schools for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSummary {
    pub class_id: i64,
    pub class_name: String,
    pub teacher_name: Option<String>,
    pub academic_year: Option<i32>,
}

impl From<&Class> for ClassSummary {
    fn from(class: &Class) -> Self {
        Self {
            class_id: class.class_id,
            class_name: class.class_name.clone(),
            teacher_name: class.teacher_name.clone(),
            academic_year: class.academic_year,
        }
    }
}

/// A class with its owning school's name attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassWithSchool {
    #[serde(flatten)]
    pub class: Class,
    pub school: Option<SchoolSummary>,
}
