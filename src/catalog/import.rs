//! Bulk import of a school roster from a nested JSON document.
//!
//! ```json
//! { "schools": [ {
//!     "school_name": "Hillcrest Primary",
//!     "events": [ { "event_name": "Spring Portraits", "shoot_date": "2025-09-01T08:00:00Z" } ],
//!     "classes": [ {
//!         "class_name": "Grade 1A", "academic_year": 2025, "event": "Spring Portraits",
//!         "students": [ { "student_name": "Thandi Mokoena",
//!                         "photos": [ { "photo_reference_code": "HC1A0001", "image_url": "..." } ] } ],
//!         "class_photos": [ { "photo_reference_code": "HC1AGRP1", "image_url": "..." } ]
//!     } ]
//! } ] }
//! ```
//!
//! Events are referenced by name within their school. Rows go through the
//! validated write paths inside a single store transaction, so a roster that
//! fails part-way leaves the catalog untouched and can be fixed and re-run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

use super::uploads::{
    create_class, create_event, create_school, create_student, upload_class_event_photo,
    upload_photo, ClassEventPhotoUpload, PhotoUpload,
};
use super::{CatalogError, FieldErrors, Principal};
use crate::db::{Database, NewClass, NewEvent, NewSchool, NewStudent};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Roster {
    #[serde(default)]
    pub schools: Vec<RosterSchool>,
}

impl Roster {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RosterSchool {
    #[serde(flatten)]
    pub school: NewSchool,
    #[serde(default)]
    pub events: Vec<RosterEvent>,
    #[serde(default)]
    pub classes: Vec<RosterClass>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RosterEvent {
    pub event_name: String,
    #[serde(default)]
    pub shoot_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub order_deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub photo_gallery_live_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RosterClass {
    pub class_name: String,
    #[serde(default)]
    pub teacher_name: Option<String>,
    #[serde(default)]
    pub academic_year: Option<i32>,
    /// Name of one of the school's events.
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub students: Vec<RosterStudent>,
    #[serde(default)]
    pub class_photos: Vec<RosterPhoto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RosterStudent {
    pub student_name: String,
    #[serde(default)]
    pub parent_name_on_form: Option<String>,
    #[serde(default)]
    pub parent_cell_on_form: Option<String>,
    #[serde(default)]
    pub parent_email_on_form: Option<String>,
    #[serde(default)]
    pub student_reference_id: Option<String>,
    #[serde(default)]
    pub photos: Vec<RosterPhoto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RosterPhoto {
    pub photo_reference_code: String,
    pub image_url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    /// Name of one of the school's events; defaults to the class's event.
    #[serde(default)]
    pub event: Option<String>,
    /// Ignored for class photos, which are always public.
    #[serde(default)]
    pub is_public_in_gallery: bool,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// Rows created by an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub schools: usize,
    pub events: usize,
    pub classes: usize,
    pub students: usize,
    pub photos: usize,
}

fn resolve_event(
    events: &HashMap<String, i64>,
    school_name: &str,
    name: Option<&str>,
) -> Result<Option<i64>, CatalogError> {
    let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };
    match events.get(name) {
        Some(id) => Ok(Some(*id)),
        None => {
            let mut errors = FieldErrors::new();
            errors.insert(
                "event".to_string(),
                vec![format!("no event named {:?} at {}", name, school_name)],
            );
            Err(CatalogError::Validation(errors))
        }
    }
}

pub fn import_roster(
    store: &Database,
    principal: &Principal,
    roster: &Roster,
) -> Result<ImportSummary, CatalogError> {
    let summary = store.transaction(|db| {
        let mut summary = ImportSummary::default();
        for entry in &roster.schools {
            import_school(db, principal, entry, &mut summary)?;
        }
        Ok::<_, CatalogError>(summary)
    })?;

    info!(
        "Imported {} schools, {} events, {} classes, {} students, {} photos",
        summary.schools, summary.events, summary.classes, summary.students, summary.photos
    );
    Ok(summary)
}

fn import_school(
    store: &Database,
    principal: &Principal,
    entry: &RosterSchool,
    summary: &mut ImportSummary,
) -> Result<(), CatalogError> {
    let school = create_school(store, principal, &entry.school)?;
    summary.schools += 1;

    let mut events: HashMap<String, i64> = HashMap::new();
    for event in &entry.events {
        let created = create_event(
            store,
            principal,
            &NewEvent {
                school_id: school.school_id,
                event_name: event.event_name.clone(),
                shoot_date: event.shoot_date,
                order_deadline: event.order_deadline,
                photo_gallery_live_until: event.photo_gallery_live_until,
                notes: event.notes.clone(),
            },
        )?;
        events.insert(created.event_name.clone(), created.event_id);
        summary.events += 1;
    }

    for roster_class in &entry.classes {
        let class_event =
            resolve_event(&events, &school.school_name, roster_class.event.as_deref())?;
        let class = create_class(
            store,
            principal,
            &NewClass {
                school_id: school.school_id,
                class_name: roster_class.class_name.clone(),
                teacher_name: roster_class.teacher_name.clone(),
                academic_year: roster_class.academic_year,
                event_id: class_event,
            },
        )?;
        summary.classes += 1;

        let photo_event = |photo: &RosterPhoto| -> Result<Option<i64>, CatalogError> {
            match photo.event.as_deref() {
                Some(name) => resolve_event(&events, &school.school_name, Some(name)),
                None => Ok(class_event),
            }
        };

        for roster_student in &roster_class.students {
            let student = create_student(
                store,
                principal,
                &NewStudent {
                    class_id: class.class_id,
                    student_name: roster_student.student_name.clone(),
                    parent_name_on_form: roster_student.parent_name_on_form.clone(),
                    parent_cell_on_form: roster_student.parent_cell_on_form.clone(),
                    parent_email_on_form: roster_student.parent_email_on_form.clone(),
                    student_reference_id: roster_student.student_reference_id.clone(),
                },
            )?;
            summary.students += 1;

            for photo in &roster_student.photos {
                upload_photo(
                    store,
                    principal,
                    &PhotoUpload {
                        class_id: Some(class.class_id),
                        student_id: Some(student.student_id),
                        event_id: photo_event(photo)?,
                        photo_reference_code: photo.photo_reference_code.clone(),
                        image_url: photo.image_url.clone(),
                        thumbnail_url: photo.thumbnail_url.clone(),
                        is_class_photo: false,
                        is_public_in_gallery: photo.is_public_in_gallery,
                        uploaded_at: photo.uploaded_at,
                    },
                )?;
                summary.photos += 1;
            }
        }

        for photo in &roster_class.class_photos {
            upload_class_event_photo(
                store,
                principal,
                &ClassEventPhotoUpload {
                    class_id: Some(class.class_id),
                    event_id: photo_event(photo)?,
                    photo_reference_code: photo.photo_reference_code.clone(),
                    image_url: photo.image_url.clone(),
                    thumbnail_url: photo.thumbnail_url.clone(),
                    uploaded_at: photo.uploaded_at,
                },
            )?;
            summary.photos += 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::store;
    use crate::catalog::{query_photos, PhotoQuery, Role};
    use crate::db::PhotoOwner;

    const ROSTER: &str = r#"{
        "schools": [
            {
                "school_name": "Hillcrest Primary",
                "contact_person": "Mrs Pillay",
                "events": [
                    { "event_name": "Spring Portraits", "shoot_date": "2025-09-01T08:00:00Z" },
                    { "event_name": "Sports Day" }
                ],
                "classes": [
                    {
                        "class_name": "Grade 1A",
                        "teacher_name": "Ms Naidoo",
                        "academic_year": 2025,
                        "event": "Spring Portraits",
                        "students": [
                            {
                                "student_name": "Thandi Mokoena",
                                "photos": [
                                    { "photo_reference_code": "HC1A0001", "image_url": "https://cdn.example.com/1.jpg" },
                                    { "photo_reference_code": "HC1A0002", "image_url": "https://cdn.example.com/2.jpg",
                                      "event": "Sports Day", "is_public_in_gallery": true }
                                ]
                            },
                            { "student_name": "Liam Botha" }
                        ],
                        "class_photos": [
                            { "photo_reference_code": "HC1AGRP1", "image_url": "https://cdn.example.com/g.jpg" }
                        ]
                    }
                ]
            },
            { "school_name": "Abbey Road Prep" }
        ]
    }"#;

    fn admin() -> Principal {
        Principal::new("photographer-1", Role::PhotographerAdmin)
    }

    #[test]
    fn test_import_counts_and_links() {
        let db = store();
        let roster = Roster::from_json(ROSTER).unwrap();
        let summary = import_roster(&db, &admin(), &roster).unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                schools: 2,
                events: 2,
                classes: 1,
                students: 2,
                photos: 3,
            }
        );

        let schools = db.list_schools().unwrap();
        let hill = schools.iter().find(|s| s.school_name == "Hillcrest Primary").unwrap();
        assert_eq!(hill.contact_person.as_deref(), Some("Mrs Pillay"));

        let classes = db.classes_by_school(hill.school_id).unwrap();
        let events = db.events_by_school(hill.school_id).unwrap();
        let spring = events.iter().find(|e| e.event_name == "Spring Portraits").unwrap();
        let sports = events.iter().find(|e| e.event_name == "Sports Day").unwrap();
        assert_eq!(classes[0].event_id, Some(spring.event_id));

        let photos = db.photos_by_owner(PhotoOwner::Class(classes[0].class_id)).unwrap();
        let by_code = |code: &str| photos.iter().find(|p| p.photo_reference_code == code).unwrap();
        assert_eq!(by_code("HC1A0001").event_id, Some(spring.event_id));
        assert!(!by_code("HC1A0001").is_public_in_gallery);
        assert_eq!(by_code("HC1A0002").event_id, Some(sports.event_id));
        assert!(by_code("HC1AGRP1").is_class_photo);
        assert_eq!(by_code("HC1AGRP1").student_id, None);

        // The class photo and the public student photo reach the gallery.
        let page = query_photos(&db, &PhotoQuery::new(1, 12)).unwrap();
        assert_eq!(page.photos.len(), 2);
    }

    #[test]
    fn test_unknown_event_name_is_rejected() {
        let db = store();
        let roster = Roster::from_json(
            r#"{ "schools": [ { "school_name": "Hillcrest Primary",
                 "classes": [ { "class_name": "Grade 1A", "event": "Winter Gala" } ] } ] }"#,
        )
        .unwrap();
        let err = import_roster(&db, &admin(), &roster).unwrap_err();
        match err {
            CatalogError::Validation(fields) => assert!(fields.contains_key("event")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_failed_import_leaves_catalog_untouched() {
        let db = store();
        let broken = Roster::from_json(
            r#"{ "schools": [
                 { "school_name": "Hillcrest Primary",
                   "events": [ { "event_name": "Spring Portraits" } ],
                   "classes": [ { "class_name": "Grade 1A", "event": "Spring Portraits" } ] },
                 { "school_name": "Abbey Road Prep",
                   "classes": [ { "class_name": "Grade 2B", "event": "Winter Gala" } ] } ] }"#,
        )
        .unwrap();
        assert!(import_roster(&db, &admin(), &broken).is_err());
        assert!(db.list_schools().unwrap().is_empty());
        assert!(db.list_classes().unwrap().is_empty());
        assert!(db.list_events().unwrap().is_empty());

        // Fixed and re-run, each row exists once.
        let fixed = Roster::from_json(ROSTER).unwrap();
        import_roster(&db, &admin(), &fixed).unwrap();
        assert_eq!(db.list_schools().unwrap().len(), 2);
        assert_eq!(db.list_classes().unwrap().len(), 1);
    }

    #[test]
    fn test_import_requires_photographer_admin() {
        let db = store();
        let roster = Roster::from_json(ROSTER).unwrap();
        let parent = Principal::new("parent-1", Role::Parent);
        let err = import_roster(&db, &parent, &roster).unwrap_err();
        assert!(matches!(err, CatalogError::Forbidden(_)));
        assert!(db.list_schools().unwrap().is_empty());
    }
}
