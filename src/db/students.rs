//! Types for student rosters.
//!
//! Parent contact fields are captured on the roster form and carried
//! through unchanged; nothing in the catalog reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::classes::ClassSummary;
use super::schools::SchoolSummary;

pub(crate) const STUDENT_COLUMNS: &str = "st.student_id, st.class_id, st.student_name, st.parent_name_on_form, st.parent_cell_on_form, st.parent_email_on_form, st.student_reference_id, st.created_at";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub student_id: i64,
    pub class_id: i64,
    pub student_name: String,
    pub parent_name_on_form: Option<String>,
    pub parent_cell_on_form: Option<String>,
    pub parent_email_on_form: Option<String>,
    pub student_reference_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewStudent {
    pub class_id: i64,
    pub student_name: String,
    #[serde(default)]
    pub parent_name_on_form: Option<String>,
    #[serde(default)]
    pub parent_cell_on_form: Option<String>,
    #[serde(default)]
    pub parent_email_on_form: Option<String>,
    #[serde(default)]
    pub student_reference_id: Option<String>,
}

/// A student with the class and school it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentWithClass {
    #[serde(flatten)]
    pub student: Student,
    pub class: Option<ClassSummary>,
    pub school: Option<SchoolSummary>,
}
