//! Validated catalog writes: schools, classes, events, students and photos.
//!
//! Every write checks the caller's role, then validates its input, and only
//! then touches the store. Referential problems (a class id that does not
//! exist, say) are left to the store's foreign keys.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{error, info};

use super::{CatalogError, Principal, Validator};
use crate::db::{
    Class, Database, NewClass, NewEvent, NewPhoto, NewSchool, NewStudent, Photo,
    PhotoShootEvent, School, Student,
};

/// Reference codes are printed on order forms and are 8 or 9 characters.
pub const REFERENCE_CODE_LEN: std::ops::RangeInclusive<usize> = 8..=9;

pub const ACADEMIC_YEARS: std::ops::RangeInclusive<i32> = 1900..=2200;

/// A photo of an individual student.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PhotoUpload {
    #[serde(default)]
    pub class_id: Option<i64>,
    #[serde(default)]
    pub student_id: Option<i64>,
    #[serde(default)]
    pub event_id: Option<i64>,
    pub photo_reference_code: String,
    pub image_url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub is_class_photo: bool,
    #[serde(default)]
    pub is_public_in_gallery: bool,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// A group photo of a class or event. Always public, never tied to a student.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ClassEventPhotoUpload {
    #[serde(default)]
    pub class_id: Option<i64>,
    #[serde(default)]
    pub event_id: Option<i64>,
    pub photo_reference_code: String,
    pub image_url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

fn check_photo_fields(v: &mut Validator, code: &str, image_url: &str, class_id: Option<i64>) {
    let code_len = code.trim().chars().count();
    if !REFERENCE_CODE_LEN.contains(&code_len) {
        v.add("photo_reference_code", "must be 8 or 9 characters long");
    }
    v.require_text("image_url", image_url);
    if class_id.is_none() {
        v.add("class_id", "is required");
    }
}

fn logged<T>(what: &str, result: Result<T, crate::db::StoreError>) -> Result<T, CatalogError> {
    result.map_err(|e| {
        error!("Failed to create {}: {}", what, e);
        CatalogError::from(e)
    })
}

pub fn create_school(
    store: &Database,
    principal: &Principal,
    school: &NewSchool,
) -> Result<School, CatalogError> {
    principal.require_catalog_writer()?;

    let mut v = Validator::new();
    v.require_text("school_name", &school.school_name);
    v.finish()?;

    let school = NewSchool {
        school_name: school.school_name.trim().to_string(),
        ..school.clone()
    };
    let created = logged("school", store.insert_school(&school))?;
    info!("Created school {} ({})", created.school_id, created.school_name);
    Ok(created)
}

pub fn create_class(
    store: &Database,
    principal: &Principal,
    class: &NewClass,
) -> Result<Class, CatalogError> {
    principal.require_catalog_writer()?;

    let mut v = Validator::new();
    v.require_text("class_name", &class.class_name);
    if class.school_id <= 0 {
        v.add("school_id", "is required");
    }
    if let Some(year) = class.academic_year {
        if !ACADEMIC_YEARS.contains(&year) {
            v.add("academic_year", "must be between 1900 and 2200");
        }
    }
    v.finish()?;

    let class = NewClass {
        class_name: class.class_name.trim().to_string(),
        ..class.clone()
    };
    let created = logged("class", store.insert_class(&class))?;
    info!(
        "Created class {} ({}) in school {}",
        created.class_id, created.class_name, created.school_id
    );
    Ok(created)
}

pub fn create_event(
    store: &Database,
    principal: &Principal,
    event: &NewEvent,
) -> Result<PhotoShootEvent, CatalogError> {
    principal.require_catalog_writer()?;

    let mut v = Validator::new();
    v.require_text("event_name", &event.event_name);
    if event.school_id <= 0 {
        v.add("school_id", "is required");
    }
    v.finish()?;

    let event = NewEvent {
        event_name: event.event_name.trim().to_string(),
        ..event.clone()
    };
    let created = logged("event", store.insert_event(&event))?;
    info!("Created event {} ({})", created.event_id, created.event_name);
    Ok(created)
}

pub fn create_student(
    store: &Database,
    principal: &Principal,
    student: &NewStudent,
) -> Result<Student, CatalogError> {
    principal.require_catalog_writer()?;

    let mut v = Validator::new();
    v.require_text("student_name", &student.student_name);
    if student.class_id <= 0 {
        v.add("class_id", "is required");
    }
    v.finish()?;

    let student = NewStudent {
        student_name: student.student_name.trim().to_string(),
        ..student.clone()
    };
    let created = logged("student", store.insert_student(&student))?;
    info!("Created student {} in class {}", created.student_id, created.class_id);
    Ok(created)
}

/// Store a student photo with the caller's visibility flags.
pub fn upload_photo(
    store: &Database,
    principal: &Principal,
    upload: &PhotoUpload,
) -> Result<Photo, CatalogError> {
    principal.require_catalog_writer()?;

    let mut v = Validator::new();
    check_photo_fields(&mut v, &upload.photo_reference_code, &upload.image_url, upload.class_id);
    if upload.student_id.is_none() {
        v.add("student_id", "is required");
    }
    v.finish()?;

    let photo = NewPhoto {
        image_url: upload.image_url.trim().to_string(),
        thumbnail_url: upload.thumbnail_url.clone(),
        photo_reference_code: upload.photo_reference_code.trim().to_string(),
        class_id: upload.class_id,
        student_id: upload.student_id,
        event_id: upload.event_id,
        is_class_photo: upload.is_class_photo,
        is_public_in_gallery: upload.is_public_in_gallery,
        uploaded_at: upload.uploaded_at,
    };
    let created = logged("photo", store.insert_photo(&photo))?;
    info!(
        "Uploaded photo {} ({}) public: {}",
        created.photo_id, created.photo_reference_code, created.is_public_in_gallery
    );
    Ok(created)
}

/// Store a class or event group photo. These are always public class
/// photos with no student.
pub fn upload_class_event_photo(
    store: &Database,
    principal: &Principal,
    upload: &ClassEventPhotoUpload,
) -> Result<Photo, CatalogError> {
    principal.require_catalog_writer()?;

    let mut v = Validator::new();
    check_photo_fields(&mut v, &upload.photo_reference_code, &upload.image_url, upload.class_id);
    v.finish()?;

    let photo = NewPhoto {
        image_url: upload.image_url.trim().to_string(),
        thumbnail_url: upload.thumbnail_url.clone(),
        photo_reference_code: upload.photo_reference_code.trim().to_string(),
        class_id: upload.class_id,
        student_id: None,
        event_id: upload.event_id,
        is_class_photo: true,
        is_public_in_gallery: true,
        uploaded_at: upload.uploaded_at,
    };
    let created = logged("class photo", store.insert_photo(&photo))?;
    info!(
        "Uploaded class photo {} ({})",
        created.photo_id, created.photo_reference_code
    );
    Ok(created)
}
