//! Catalog services layered over the store: gallery queries, filter
//! options, event status, validated writes, statistics and roster import.

pub mod filters;
pub mod import;
pub mod query;
pub mod stats;
pub mod status;
pub mod uploads;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::db::StoreError;

pub use filters::{options_for_school, GallerySelection, SchoolScoped};
pub use import::{import_roster, ImportSummary, Roster};
pub use query::{photo_by_reference_code, query_photos, PhotoPage, PhotoQuery};
pub use stats::{search_schools, ClassStats, DashboardStats, SchoolSummaryStats};
pub use status::{classify, classify_within, EventOverview, EventStatus};
pub use uploads::{ClassEventPhotoUpload, PhotoUpload};

/// Validation messages keyed by field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// The request itself is malformed, e.g. a page number below one.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("validation failed: {}", describe_fields(.0))]
    Validation(FieldErrors),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("store query failed: {0}")]
    StoreQuery(String),
}

fn describe_fields(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => CatalogError::StoreUnavailable(msg),
            StoreError::Query(msg) | StoreError::Corrupt(msg) => CatalogError::StoreQuery(msg),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Parent,
    PhotographerAdmin,
    SchoolAdmin,
}

/// The authenticated user on whose behalf a write is made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: String,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    /// Only photographer admins may change the catalog.
    pub(crate) fn require_catalog_writer(&self) -> Result<(), CatalogError> {
        if self.role == Role::PhotographerAdmin {
            Ok(())
        } else {
            Err(CatalogError::Forbidden(format!(
                "user {} may not modify the catalog",
                self.user_id
            )))
        }
    }
}

/// Accumulates per-field validation failures.
#[derive(Debug, Default)]
pub(crate) struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub(crate) fn require_text(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "is required");
        }
    }

    pub(crate) fn finish(self) -> Result<(), CatalogError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(CatalogError::Validation(self.errors))
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::{DateTime, TimeZone, Utc};

    use crate::db::sqlite::SqliteDb;
    use crate::db::{Database, NewClass, NewEvent, NewPhoto, NewSchool};

    pub fn store() -> Database {
        let db: Database = SqliteDb::open_in_memory().unwrap().into();
        db.initialize().unwrap();
        db
    }

    pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, day, hour, 0, 0).unwrap()
    }

    pub fn school(db: &Database, name: &str) -> i64 {
        db.insert_school(&NewSchool {
            school_name: name.to_string(),
            ..Default::default()
        })
        .unwrap()
        .school_id
    }

    pub fn class(db: &Database, school_id: i64, name: &str) -> i64 {
        db.insert_class(&NewClass {
            school_id,
            class_name: name.to_string(),
            academic_year: Some(2025),
            ..Default::default()
        })
        .unwrap()
        .class_id
    }

    pub fn event(db: &Database, school_id: i64, name: &str) -> i64 {
        db.insert_event(&NewEvent {
            school_id,
            event_name: name.to_string(),
            ..Default::default()
        })
        .unwrap()
        .event_id
    }

    pub fn photo(
        db: &Database,
        code: &str,
        class_id: i64,
        event_id: Option<i64>,
        public: bool,
        uploaded_at: DateTime<Utc>,
    ) -> i64 {
        db.insert_photo(&NewPhoto {
            image_url: format!("https://cdn.example.com/{}.jpg", code),
            thumbnail_url: None,
            photo_reference_code: code.to_string(),
            class_id: Some(class_id),
            student_id: None,
            event_id,
            is_class_photo: false,
            is_public_in_gallery: public,
            uploaded_at: Some(uploaded_at),
        })
        .unwrap()
        .photo_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_catalog_errors() {
        assert!(matches!(
            CatalogError::from(StoreError::Unavailable("locked".into())),
            CatalogError::StoreUnavailable(_)
        ));
        assert!(matches!(
            CatalogError::from(StoreError::Corrupt("bad timestamp".into())),
            CatalogError::StoreQuery(_)
        ));
    }

    #[test]
    fn test_only_photographer_admins_write() {
        assert!(Principal::new("u1", Role::PhotographerAdmin)
            .require_catalog_writer()
            .is_ok());
        for role in [Role::Parent, Role::SchoolAdmin] {
            let err = Principal::new("u2", role).require_catalog_writer().unwrap_err();
            assert!(matches!(err, CatalogError::Forbidden(_)));
        }
    }

    #[test]
    fn test_validation_message_lists_fields() {
        let mut v = Validator::new();
        v.require_text("school_name", "   ");
        v.add("academic_year", "must be between 1900 and 2200");
        let err = v.finish().unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation failed: academic_year: must be between 1900 and 2200; school_name: is required"
        );
    }

    #[test]
    fn test_role_serializes_snake_case() {
        let json = serde_json::to_string(&Role::PhotographerAdmin).unwrap();
        assert_eq!(json, "\"photographer_admin\"");
    }
}
