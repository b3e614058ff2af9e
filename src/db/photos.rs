//! Types for photo records and the gallery query filter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::classes::ClassSummary;
use super::events::EventSummary;
use super::schools::SchoolSummary;

pub(crate) const PHOTO_COLUMNS: &str = "p.photo_id, p.image_url, p.thumbnail_url, p.photo_reference_code, \
     p.class_id, p.student_id, p.event_id, p.is_class_photo, p.is_public_in_gallery, p.uploaded_at";

/// Display columns joined onto [`PHOTO_COLUMNS`] for gallery rows.
pub(crate) const GALLERY_COLUMNS: &str = "c.class_id, c.class_name, c.teacher_name, c.academic_year, \
     s.school_id, s.school_name, e.event_id, e.event_name, e.shoot_date";

/// Gallery rows need a class and its school; the event is optional.
pub(crate) const GALLERY_FROM: &str = "FROM photos p \
     JOIN classes c ON c.class_id = p.class_id \
     JOIN schools s ON s.school_id = c.school_id \
     LEFT JOIN photo_shoot_events e ON e.event_id = p.event_id";

/// Newest upload first; equal timestamps keep insertion order.
pub(crate) const GALLERY_ORDER: &str = "ORDER BY p.uploaded_at DESC, p.photo_id ASC";

/// A photo row. The image itself lives in blob storage at `image_url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub photo_id: i64,
    pub image_url: String,
    pub thumbnail_url: Option<String>,
    pub photo_reference_code: String,
    pub class_id: Option<i64>,
    /// `None` for class and event photos with no individual subject.
    pub student_id: Option<i64>,
    pub event_id: Option<i64>,
    pub is_class_photo: bool,
    pub is_public_in_gallery: bool,
    pub uploaded_at: DateTime<Utc>,
}

/// Insert record for a photo, after the upload path has settled its flags.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPhoto {
    pub image_url: String,
    pub thumbnail_url: Option<String>,
    pub photo_reference_code: String,
    pub class_id: Option<i64>,
    pub student_id: Option<i64>,
    pub event_id: Option<i64>,
    pub is_class_photo: bool,
    pub is_public_in_gallery: bool,
    /// Defaults to the time of insertion.
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// A photo enriched with the display names of its class, school and event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryPhoto {
    #[serde(flatten)]
    pub photo: Photo,
    pub class: Option<ClassSummary>,
    pub school: Option<SchoolSummary>,
    pub event: Option<EventSummary>,
}

/// Store-side predicates of a gallery page query. Every present predicate
/// narrows the result; they are always combined with AND.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhotoFilter {
    pub school_id: Option<i64>,
    pub class_id: Option<i64>,
    pub event_id: Option<i64>,
    pub public_only: bool,
}

impl PhotoFilter {
    /// Render the WHERE clause for a query over `photos p JOIN classes c`.
    ///
    /// `placeholder` renders the n-th (1-based) bound parameter in the
    /// backend's syntax. Returns the clause (empty when unfiltered) and the
    /// values to bind, in order.
    pub(crate) fn where_clause(&self, placeholder: impl Fn(usize) -> String) -> (String, Vec<i64>) {
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        if self.public_only {
            conditions.push("p.is_public_in_gallery = TRUE".to_string());
        }

        // School lives on the class, not on the photo.
        let predicates = [
            ("c.school_id", self.school_id),
            ("p.class_id", self.class_id),
            ("p.event_id", self.event_id),
        ];
        for (column, value) in predicates {
            if let Some(value) = value {
                params.push(value);
                conditions.push(format!("{} = {}", column, placeholder(params.len())));
            }
        }

        if conditions.is_empty() {
            (String::new(), params)
        } else {
            (format!("WHERE {}", conditions.join(" AND ")), params)
        }
    }
}

/// Which association to list photos by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoOwner {
    Class(i64),
    Student(i64),
    Event(i64),
    School(i64),
}

impl PhotoOwner {
    pub(crate) fn column(&self) -> &'static str {
        match self {
            PhotoOwner::Class(_) => "p.class_id",
            PhotoOwner::Student(_) => "p.student_id",
            PhotoOwner::Event(_) => "p.event_id",
            PhotoOwner::School(_) => "c.school_id",
        }
    }

    pub(crate) fn id(&self) -> i64 {
        match self {
            PhotoOwner::Class(id)
            | PhotoOwner::Student(id)
            | PhotoOwner::Event(id)
            | PhotoOwner::School(id) => *id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_placeholder(_: usize) -> String {
        "?".to_string()
    }

    #[test]
    fn test_unfiltered_clause_is_empty() {
        let (clause, params) = PhotoFilter::default().where_clause(sqlite_placeholder);
        assert!(clause.is_empty());
        assert!(params.is_empty());
    }

    #[test]
    fn test_filters_are_joined_with_and() {
        let filter = PhotoFilter {
            school_id: Some(10),
            class_id: None,
            event_id: Some(7),
            public_only: true,
        };
        let (clause, params) = filter.where_clause(|n| format!("${}", n));
        assert_eq!(
            clause,
            "WHERE p.is_public_in_gallery = TRUE AND c.school_id = $1 AND p.event_id = $2"
        );
        assert_eq!(params, vec![10, 7]);
    }

    #[test]
    fn test_school_filter_goes_through_class() {
        let filter = PhotoFilter {
            school_id: Some(3),
            ..Default::default()
        };
        let (clause, _) = filter.where_clause(sqlite_placeholder);
        assert_eq!(clause, "WHERE c.school_id = ?");
    }
}
