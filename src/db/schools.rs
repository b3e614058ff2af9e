//! Types for schools, the root of the tenancy hierarchy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::classes::ClassSummary;

pub(crate) const SCHOOL_COLUMNS: &str =
    "s.school_id, s.school_name, s.contact_person, s.contact_email, s.contact_phone, s.address, s.created_at";

/// A school row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct School {
    pub school_id: i64,
    pub school_name: String,
    pub contact_person: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a school.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewSchool {
    pub school_name: String,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// The school fields joined onto other records for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolSummary {
    pub school_id: i64,
    pub school_name: String,
}

impl From<&School> for SchoolSummary {
    fn from(school: &School) -> Self {
        Self {
            school_id: school.school_id,
            school_name: school.school_name.clone(),
        }
    }
}

/// A school together with all of its classes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchoolWithClasses {
    #[serde(flatten)]
    pub school: School,
    pub classes: Vec<ClassSummary>,
}
