//! SQLite backend implementation.

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use super::classes::{Class, ClassSummary, ClassWithSchool, NewClass, CLASS_COLUMNS};
use super::events::{EventSummary, EventWithSchool, NewEvent, PhotoShootEvent, EVENT_COLUMNS};
use super::photos::{
    GalleryPhoto, NewPhoto, Photo, PhotoFilter, PhotoOwner, GALLERY_COLUMNS, GALLERY_FROM,
    GALLERY_ORDER, PHOTO_COLUMNS,
};
use super::schema::SCHEMA;
use super::schools::{NewSchool, School, SchoolSummary, SchoolWithClasses, SCHOOL_COLUMNS};
use super::students::{NewStudent, Student, StudentWithClass, STUDENT_COLUMNS};
use super::{format_timestamp, parse_timestamp, StoreError};

pub struct SqliteDb {
    pub(crate) conn: Connection,
}

impl SqliteDb {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Unavailable(format!("{}: {}", parent.display(), e)))?;
        }
        let conn = Connection::open(path)
            .map_err(|e| StoreError::Unavailable(format!("{}: {}", path.display(), e)))?;
        Self::configure(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::configure(conn)
    }

    fn configure(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(Self { conn })
    }

    pub fn initialize(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Run `work` inside one transaction, rolling back when it fails.
    /// Nested calls join the outer transaction.
    pub fn transaction<T, E>(&self, work: impl FnOnce() -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        if !self.conn.is_autocommit() {
            return work();
        }
        let tx = self.conn.unchecked_transaction().map_err(StoreError::from)?;
        let value = work()?;
        tx.commit().map_err(StoreError::from)?;
        Ok(value)
    }

    // ========================================================================
    // School operations
    // ========================================================================

    pub fn insert_school(&self, school: &NewSchool) -> Result<School, StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO schools (school_name, contact_person, contact_email, contact_phone, address, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            rusqlite::params![
                school.school_name,
                school.contact_person,
                school.contact_email,
                school.contact_phone,
                school.address,
                format_timestamp(&Utc::now()),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_school(id)?.ok_or_else(|| inserted_row_missing("schools", id))
    }

    pub fn get_school(&self, school_id: i64) -> Result<Option<School>, StoreError> {
        let sql = format!("SELECT {} FROM schools s WHERE s.school_id = ?", SCHOOL_COLUMNS);
        let school = self
            .conn
            .query_row(&sql, [school_id], |row| school_from_row(row, 0))
            .optional()?;
        Ok(school)
    }

    pub fn list_schools(&self) -> Result<Vec<School>, StoreError> {
        let sql = format!(
            "SELECT {} FROM schools s ORDER BY s.school_name ASC, s.school_id ASC",
            SCHOOL_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let schools = stmt
            .query_map([], |row| school_from_row(row, 0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(schools)
    }

    pub fn list_schools_with_classes(&self) -> Result<Vec<SchoolWithClasses>, StoreError> {
        let schools = self.list_schools()?;

        let sql = format!(
            "SELECT {} FROM classes c ORDER BY c.class_name ASC, c.class_id ASC",
            CLASS_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut by_school: HashMap<i64, Vec<ClassSummary>> = HashMap::new();
        for class in stmt.query_map([], |row| class_from_row(row, 0))? {
            let class = class?;
            by_school
                .entry(class.school_id)
                .or_default()
                .push(ClassSummary::from(&class));
        }

        Ok(schools
            .into_iter()
            .map(|school| {
                let classes = by_school.remove(&school.school_id).unwrap_or_default();
                SchoolWithClasses { school, classes }
            })
            .collect())
    }

    // ========================================================================
    // Class operations
    // ========================================================================

    pub fn insert_class(&self, class: &NewClass) -> Result<Class, StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO classes (school_id, class_name, teacher_name, academic_year, event_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            rusqlite::params![
                class.school_id,
                class.class_name,
                class.teacher_name,
                class.academic_year,
                class.event_id,
                format_timestamp(&Utc::now()),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_class(id)?.ok_or_else(|| inserted_row_missing("classes", id))
    }

    pub fn get_class(&self, class_id: i64) -> Result<Option<Class>, StoreError> {
        let sql = format!("SELECT {} FROM classes c WHERE c.class_id = ?", CLASS_COLUMNS);
        let class = self
            .conn
            .query_row(&sql, [class_id], |row| class_from_row(row, 0))
            .optional()?;
        Ok(class)
    }

    pub fn list_classes(&self) -> Result<Vec<Class>, StoreError> {
        let sql = format!(
            "SELECT {} FROM classes c ORDER BY c.class_name ASC, c.class_id ASC",
            CLASS_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let classes = stmt
            .query_map([], |row| class_from_row(row, 0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(classes)
    }

    pub fn classes_by_school(&self, school_id: i64) -> Result<Vec<Class>, StoreError> {
        let sql = format!(
            "SELECT {} FROM classes c WHERE c.school_id = ? ORDER BY c.class_name ASC, c.class_id ASC",
            CLASS_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let classes = stmt
            .query_map([school_id], |row| class_from_row(row, 0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(classes)
    }

    pub fn classes_for_year(&self, academic_year: i32) -> Result<Vec<ClassWithSchool>, StoreError> {
        let sql = format!(
            r#"
            SELECT {}, s.school_id, s.school_name
            FROM classes c
            LEFT JOIN schools s ON s.school_id = c.school_id
            WHERE c.academic_year = ?
            ORDER BY c.class_name ASC, c.class_id ASC
            "#,
            CLASS_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let classes = stmt
            .query_map([academic_year], |row| {
                Ok(ClassWithSchool {
                    class: class_from_row(row, 0)?,
                    school: school_summary_from_row(row, 7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(classes)
    }

    // ========================================================================
    // Event operations
    // ========================================================================

    pub fn insert_event(&self, event: &NewEvent) -> Result<PhotoShootEvent, StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO photo_shoot_events
                (school_id, event_name, shoot_date, order_deadline, photo_gallery_live_until, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            rusqlite::params![
                event.school_id,
                event.event_name,
                event.shoot_date.as_ref().map(format_timestamp),
                event.order_deadline.as_ref().map(format_timestamp),
                event.photo_gallery_live_until.as_ref().map(format_timestamp),
                event.notes,
                format_timestamp(&Utc::now()),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_event(id)?.ok_or_else(|| inserted_row_missing("photo_shoot_events", id))
    }

    pub fn get_event(&self, event_id: i64) -> Result<Option<PhotoShootEvent>, StoreError> {
        let sql = format!(
            "SELECT {} FROM photo_shoot_events e WHERE e.event_id = ?",
            EVENT_COLUMNS
        );
        let event = self
            .conn
            .query_row(&sql, [event_id], |row| event_from_row(row, 0))
            .optional()?;
        Ok(event)
    }

    pub fn list_events(&self) -> Result<Vec<EventWithSchool>, StoreError> {
        let sql = format!(
            r#"
            SELECT {}, s.school_id, s.school_name
            FROM photo_shoot_events e
            LEFT JOIN schools s ON s.school_id = e.school_id
            ORDER BY e.shoot_date IS NULL, e.shoot_date DESC, e.event_id ASC
            "#,
            EVENT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let events = stmt
            .query_map([], |row| {
                Ok(EventWithSchool {
                    event: event_from_row(row, 0)?,
                    school: school_summary_from_row(row, 8)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(events)
    }

    pub fn events_by_school(&self, school_id: i64) -> Result<Vec<PhotoShootEvent>, StoreError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM photo_shoot_events e
            WHERE e.school_id = ?
            ORDER BY e.shoot_date IS NULL, e.shoot_date DESC, e.event_id ASC
            "#,
            EVENT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let events = stmt
            .query_map([school_id], |row| event_from_row(row, 0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(events)
    }

    // ========================================================================
    // Student operations
    // ========================================================================

    pub fn insert_student(&self, student: &NewStudent) -> Result<Student, StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO students
                (class_id, student_name, parent_name_on_form, parent_cell_on_form,
                 parent_email_on_form, student_reference_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            rusqlite::params![
                student.class_id,
                student.student_name,
                student.parent_name_on_form,
                student.parent_cell_on_form,
                student.parent_email_on_form,
                student.student_reference_id,
                format_timestamp(&Utc::now()),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_student(id)?.ok_or_else(|| inserted_row_missing("students", id))
    }

    pub fn get_student(&self, student_id: i64) -> Result<Option<Student>, StoreError> {
        let sql = format!("SELECT {} FROM students st WHERE st.student_id = ?", STUDENT_COLUMNS);
        let student = self
            .conn
            .query_row(&sql, [student_id], |row| student_from_row(row, 0))
            .optional()?;
        Ok(student)
    }

    pub fn students_by_class(&self, class_id: i64) -> Result<Vec<Student>, StoreError> {
        let sql = format!(
            "SELECT {} FROM students st WHERE st.class_id = ? ORDER BY st.student_name ASC, st.student_id ASC",
            STUDENT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let students = stmt
            .query_map([class_id], |row| student_from_row(row, 0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(students)
    }

    pub fn list_students(&self) -> Result<Vec<StudentWithClass>, StoreError> {
        let sql = format!(
            r#"
            SELECT {}, c.class_id, c.class_name, c.teacher_name, c.academic_year, s.school_id, s.school_name
            FROM students st
            LEFT JOIN classes c ON c.class_id = st.class_id
            LEFT JOIN schools s ON s.school_id = c.school_id
            ORDER BY st.student_name ASC, st.student_id ASC
            "#,
            STUDENT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let students = stmt
            .query_map([], |row| {
                Ok(StudentWithClass {
                    student: student_from_row(row, 0)?,
                    class: class_summary_from_row(row, 8)?,
                    school: school_summary_from_row(row, 12)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(students)
    }

    // ========================================================================
    // Photo operations
    // ========================================================================

    pub fn insert_photo(&self, photo: &NewPhoto) -> Result<Photo, StoreError> {
        let uploaded_at = photo.uploaded_at.unwrap_or_else(Utc::now);
        self.conn.execute(
            r#"
            INSERT INTO photos
                (image_url, thumbnail_url, photo_reference_code, class_id, student_id, event_id,
                 is_class_photo, is_public_in_gallery, uploaded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            rusqlite::params![
                photo.image_url,
                photo.thumbnail_url,
                photo.photo_reference_code,
                photo.class_id,
                photo.student_id,
                photo.event_id,
                photo.is_class_photo,
                photo.is_public_in_gallery,
                format_timestamp(&uploaded_at),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_photo(id)?.ok_or_else(|| inserted_row_missing("photos", id))
    }

    pub fn get_photo(&self, photo_id: i64) -> Result<Option<Photo>, StoreError> {
        let sql = format!("SELECT {} FROM photos p WHERE p.photo_id = ?", PHOTO_COLUMNS);
        let photo = self
            .conn
            .query_row(&sql, [photo_id], |row| photo_from_row(row, 0))
            .optional()?;
        Ok(photo)
    }

    pub fn photo_by_reference_code(&self, code: &str) -> Result<Option<Photo>, StoreError> {
        let sql = format!(
            "SELECT {} FROM photos p WHERE p.photo_reference_code = ? ORDER BY p.uploaded_at DESC, p.photo_id DESC LIMIT 1",
            PHOTO_COLUMNS
        );
        let photo = self
            .conn
            .query_row(&sql, [code], |row| photo_from_row(row, 0))
            .optional()?;
        Ok(photo)
    }

    pub fn photos_by_owner(&self, owner: PhotoOwner) -> Result<Vec<Photo>, StoreError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM photos p
            LEFT JOIN classes c ON c.class_id = p.class_id
            WHERE {} = ?
            {}
            "#,
            PHOTO_COLUMNS,
            owner.column(),
            GALLERY_ORDER
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let photos = stmt
            .query_map([owner.id()], |row| photo_from_row(row, 0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(photos)
    }

    pub fn photos_uploaded_between(
        &self,
        start: &DateTime<Utc>,
        end: &DateTime<Utc>,
    ) -> Result<Vec<Photo>, StoreError> {
        let sql = format!(
            "SELECT {} FROM photos p WHERE p.uploaded_at >= ? AND p.uploaded_at <= ? {}",
            PHOTO_COLUMNS, GALLERY_ORDER
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let photos = stmt
            .query_map([format_timestamp(start), format_timestamp(end)], |row| {
                photo_from_row(row, 0)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(photos)
    }

    pub fn gallery_page(
        &self,
        filter: &PhotoFilter,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<GalleryPhoto>, StoreError> {
        let offset = i64::try_from(offset)
            .map_err(|_| StoreError::Query(format!("page offset {} out of range", offset)))?;
        let (where_clause, mut params) = filter.where_clause(|_| "?".to_string());
        let sql = format!(
            "SELECT {}, {} {} {} {} LIMIT ? OFFSET ?",
            PHOTO_COLUMNS, GALLERY_COLUMNS, GALLERY_FROM, where_clause, GALLERY_ORDER
        );
        params.push(i64::from(limit));
        params.push(offset);

        let mut stmt = self.conn.prepare(&sql)?;
        let photos = stmt
            .query_map(rusqlite::params_from_iter(params), gallery_photo_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(photos)
    }

    pub fn gallery_photo_by_reference_code(
        &self,
        code: &str,
        public_only: bool,
    ) -> Result<Option<GalleryPhoto>, StoreError> {
        let visibility = if public_only {
            "AND p.is_public_in_gallery = TRUE"
        } else {
            ""
        };
        let sql = format!(
            "SELECT {}, {} {} WHERE p.photo_reference_code = ? {} {} LIMIT 1",
            PHOTO_COLUMNS, GALLERY_COLUMNS, GALLERY_FROM, visibility, GALLERY_ORDER
        );
        let photo = self
            .conn
            .query_row(&sql, [code], gallery_photo_from_row)
            .optional()?;
        Ok(photo)
    }
}

fn inserted_row_missing(table: &str, id: i64) -> StoreError {
    StoreError::Query(format!("row {} in {} not found after insert", id, table))
}

fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    parse_timestamp(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn optional_timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|text| {
        parse_timestamp(&text)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

fn school_from_row(row: &Row<'_>, base: usize) -> rusqlite::Result<School> {
    Ok(School {
        school_id: row.get(base)?,
        school_name: row.get(base + 1)?,
        contact_person: row.get(base + 2)?,
        contact_email: row.get(base + 3)?,
        contact_phone: row.get(base + 4)?,
        address: row.get(base + 5)?,
        created_at: timestamp_at(row, base + 6)?,
    })
}

fn class_from_row(row: &Row<'_>, base: usize) -> rusqlite::Result<Class> {
    Ok(Class {
        class_id: row.get(base)?,
        school_id: row.get(base + 1)?,
        class_name: row.get(base + 2)?,
        teacher_name: row.get(base + 3)?,
        academic_year: row.get(base + 4)?,
        event_id: row.get(base + 5)?,
        created_at: timestamp_at(row, base + 6)?,
    })
}

fn event_from_row(row: &Row<'_>, base: usize) -> rusqlite::Result<PhotoShootEvent> {
    Ok(PhotoShootEvent {
        event_id: row.get(base)?,
        school_id: row.get(base + 1)?,
        event_name: row.get(base + 2)?,
        shoot_date: optional_timestamp_at(row, base + 3)?,
        order_deadline: optional_timestamp_at(row, base + 4)?,
        photo_gallery_live_until: optional_timestamp_at(row, base + 5)?,
        notes: row.get(base + 6)?,
        created_at: timestamp_at(row, base + 7)?,
    })
}

fn student_from_row(row: &Row<'_>, base: usize) -> rusqlite::Result<Student> {
    Ok(Student {
        student_id: row.get(base)?,
        class_id: row.get(base + 1)?,
        student_name: row.get(base + 2)?,
        parent_name_on_form: row.get(base + 3)?,
        parent_cell_on_form: row.get(base + 4)?,
        parent_email_on_form: row.get(base + 5)?,
        student_reference_id: row.get(base + 6)?,
        created_at: timestamp_at(row, base + 7)?,
    })
}

fn photo_from_row(row: &Row<'_>, base: usize) -> rusqlite::Result<Photo> {
    Ok(Photo {
        photo_id: row.get(base)?,
        image_url: row.get(base + 1)?,
        thumbnail_url: row.get(base + 2)?,
        photo_reference_code: row.get(base + 3)?,
        class_id: row.get(base + 4)?,
        student_id: row.get(base + 5)?,
        event_id: row.get(base + 6)?,
        is_class_photo: row.get(base + 7)?,
        is_public_in_gallery: row.get(base + 8)?,
        uploaded_at: timestamp_at(row, base + 9)?,
    })
}

// Summaries come from joined columns and are absent when the join found nothing.

fn school_summary_from_row(row: &Row<'_>, base: usize) -> rusqlite::Result<Option<SchoolSummary>> {
    let Some(school_id) = row.get::<_, Option<i64>>(base)? else {
        return Ok(None);
    };
    Ok(Some(SchoolSummary {
        school_id,
        school_name: row.get(base + 1)?,
    }))
}

fn class_summary_from_row(row: &Row<'_>, base: usize) -> rusqlite::Result<Option<ClassSummary>> {
    let Some(class_id) = row.get::<_, Option<i64>>(base)? else {
        return Ok(None);
    };
    Ok(Some(ClassSummary {
        class_id,
        class_name: row.get(base + 1)?,
        teacher_name: row.get(base + 2)?,
        academic_year: row.get(base + 3)?,
    }))
}

fn event_summary_from_row(row: &Row<'_>, base: usize) -> rusqlite::Result<Option<EventSummary>> {
    let Some(event_id) = row.get::<_, Option<i64>>(base)? else {
        return Ok(None);
    };
    Ok(Some(EventSummary {
        event_id,
        event_name: row.get(base + 1)?,
        shoot_date: optional_timestamp_at(row, base + 2)?,
    }))
}

/// Decode a row selected as `PHOTO_COLUMNS, GALLERY_COLUMNS`.
fn gallery_photo_from_row(row: &Row<'_>) -> rusqlite::Result<GalleryPhoto> {
    Ok(GalleryPhoto {
        photo: photo_from_row(row, 0)?,
        class: class_summary_from_row(row, 10)?,
        school: school_summary_from_row(row, 14)?,
        event: event_summary_from_row(row, 16)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn seeded() -> (SqliteDb, School, Class) {
        let db = SqliteDb::open_in_memory().unwrap();
        db.initialize().unwrap();
        let school = db
            .insert_school(&NewSchool {
                school_name: "Hillcrest Primary".to_string(),
                ..Default::default()
            })
            .unwrap();
        let class = db
            .insert_class(&NewClass {
                school_id: school.school_id,
                class_name: "Grade 3B".to_string(),
                teacher_name: Some("Mrs. Ndlovu".to_string()),
                academic_year: Some(2025),
                event_id: None,
            })
            .unwrap();
        (db, school, class)
    }

    fn photo(class_id: i64, code: &str, uploaded_at: DateTime<Utc>) -> NewPhoto {
        NewPhoto {
            image_url: format!("https://blobs.example/{}.jpg", code),
            thumbnail_url: None,
            photo_reference_code: code.to_string(),
            class_id: Some(class_id),
            student_id: None,
            event_id: None,
            is_class_photo: true,
            is_public_in_gallery: true,
            uploaded_at: Some(uploaded_at),
        }
    }

    #[test]
    fn test_failed_transaction_rolls_back() {
        let (db, school, _) = seeded();
        let result: Result<(), StoreError> = db.transaction(|| {
            db.insert_class(&NewClass {
                school_id: school.school_id,
                class_name: "Grade 4A".to_string(),
                ..Default::default()
            })?;
            Err(StoreError::Query("abandoned".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(db.classes_by_school(school.school_id).unwrap().len(), 1);

        db.transaction(|| {
            db.insert_class(&NewClass {
                school_id: school.school_id,
                class_name: "Grade 4A".to_string(),
                ..Default::default()
            })
        })
        .unwrap();
        assert_eq!(db.classes_by_school(school.school_id).unwrap().len(), 2);
        assert!(db.conn.is_autocommit());
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let db = SqliteDb::open_in_memory().unwrap();
        db.initialize().unwrap();
        db.initialize().unwrap();
        assert!(db.list_schools().unwrap().is_empty());
    }

    #[test]
    fn test_missing_rows_are_none() {
        let (db, _, _) = seeded();
        assert!(db.get_school(999).unwrap().is_none());
        assert!(db.get_class(999).unwrap().is_none());
        assert!(db.get_event(999).unwrap().is_none());
        assert!(db.get_student(999).unwrap().is_none());
        assert!(db.photo_by_reference_code("NOPE0000").unwrap().is_none());
    }

    #[test]
    fn test_foreign_keys_are_enforced() {
        let (db, _, _) = seeded();
        let result = db.insert_class(&NewClass {
            school_id: 404,
            class_name: "Orphan".to_string(),
            ..Default::default()
        });
        assert!(matches!(result, Err(StoreError::Query(_))));
    }

    #[test]
    fn test_gallery_page_joins_display_names() {
        let (db, school, class) = seeded();
        let event = db
            .insert_event(&NewEvent {
                school_id: school.school_id,
                event_name: "Autumn Portraits".to_string(),
                shoot_date: Some(Utc.with_ymd_and_hms(2025, 4, 2, 9, 0, 0).unwrap()),
                ..Default::default()
            })
            .unwrap();
        let mut new_photo = photo(class.class_id, "HPS00001", Utc::now());
        new_photo.event_id = Some(event.event_id);
        db.insert_photo(&new_photo).unwrap();

        let page = db.gallery_page(&PhotoFilter::default(), 10, 0).unwrap();
        assert_eq!(page.len(), 1);
        let row = &page[0];
        assert_eq!(row.class.as_ref().unwrap().class_name, "Grade 3B");
        assert_eq!(row.class.as_ref().unwrap().teacher_name.as_deref(), Some("Mrs. Ndlovu"));
        assert_eq!(row.school.as_ref().unwrap().school_name, "Hillcrest Primary");
        assert_eq!(row.event.as_ref().unwrap().event_name, "Autumn Portraits");
        assert_eq!(row.event.as_ref().unwrap().shoot_date, event.shoot_date);
    }

    #[test]
    fn test_gallery_page_orders_newest_first_then_insertion() {
        let (db, _, class) = seeded();
        let base = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        db.insert_photo(&photo(class.class_id, "OLDEST01", base)).unwrap();
        db.insert_photo(&photo(class.class_id, "TIEFIRST", base + Duration::hours(1))).unwrap();
        db.insert_photo(&photo(class.class_id, "TIESECND", base + Duration::hours(1))).unwrap();
        db.insert_photo(&photo(class.class_id, "NEWEST01", base + Duration::hours(2))).unwrap();

        let codes: Vec<String> = db
            .gallery_page(&PhotoFilter::default(), 10, 0)
            .unwrap()
            .into_iter()
            .map(|p| p.photo.photo_reference_code)
            .collect();
        assert_eq!(codes, vec!["NEWEST01", "TIEFIRST", "TIESECND", "OLDEST01"]);

        let second: Vec<String> = db
            .gallery_page(&PhotoFilter::default(), 2, 2)
            .unwrap()
            .into_iter()
            .map(|p| p.photo.photo_reference_code)
            .collect();
        assert_eq!(second, vec!["TIESECND", "OLDEST01"]);
    }

    #[test]
    fn test_gallery_excludes_photos_without_class() {
        let (db, _, class) = seeded();
        db.insert_photo(&photo(class.class_id, "WITHCLAS", Utc::now())).unwrap();
        let mut loose = photo(class.class_id, "NOCLASS1", Utc::now());
        loose.class_id = None;
        db.insert_photo(&loose).unwrap();

        let page = db.gallery_page(&PhotoFilter::default(), 10, 0).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].photo.photo_reference_code, "WITHCLAS");
    }

    #[test]
    fn test_reference_code_lookup_prefers_latest_upload() {
        let (db, _, class) = seeded();
        let base = Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap();
        db.insert_photo(&photo(class.class_id, "DUPL0001", base)).unwrap();
        let newer = db
            .insert_photo(&photo(class.class_id, "DUPL0001", base + Duration::days(1)))
            .unwrap();

        let found = db.photo_by_reference_code("DUPL0001").unwrap().unwrap();
        assert_eq!(found.photo_id, newer.photo_id);
    }

    #[test]
    fn test_photos_by_school_go_through_class() {
        let (db, school, class) = seeded();
        let other_school = db
            .insert_school(&NewSchool {
                school_name: "Riverside High".to_string(),
                ..Default::default()
            })
            .unwrap();
        let other_class = db
            .insert_class(&NewClass {
                school_id: other_school.school_id,
                class_name: "Grade 10A".to_string(),
                ..Default::default()
            })
            .unwrap();
        db.insert_photo(&photo(class.class_id, "HILL0001", Utc::now())).unwrap();
        db.insert_photo(&photo(other_class.class_id, "RIVR0001", Utc::now())).unwrap();

        let photos = db.photos_by_owner(PhotoOwner::School(school.school_id)).unwrap();
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].photo_reference_code, "HILL0001");
    }

    #[test]
    fn test_photos_uploaded_between_is_inclusive() {
        let (db, _, class) = seeded();
        let start = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 2, 28, 0, 0, 0).unwrap();
        db.insert_photo(&photo(class.class_id, "BEFORE01", start - Duration::seconds(1))).unwrap();
        db.insert_photo(&photo(class.class_id, "ATSTART1", start)).unwrap();
        db.insert_photo(&photo(class.class_id, "ATEND001", end)).unwrap();
        db.insert_photo(&photo(class.class_id, "AFTER001", end + Duration::seconds(1))).unwrap();

        let codes: Vec<String> = db
            .photos_uploaded_between(&start, &end)
            .unwrap()
            .into_iter()
            .map(|p| p.photo_reference_code)
            .collect();
        assert_eq!(codes, vec!["ATEND001", "ATSTART1"]);
    }

    #[test]
    fn test_schools_with_classes_groups_by_school() {
        let (db, school, _) = seeded();
        db.insert_class(&NewClass {
            school_id: school.school_id,
            class_name: "Grade 1A".to_string(),
            ..Default::default()
        })
        .unwrap();
        db.insert_school(&NewSchool {
            school_name: "Abbey Road Prep".to_string(),
            ..Default::default()
        })
        .unwrap();

        let schools = db.list_schools_with_classes().unwrap();
        assert_eq!(schools.len(), 2);
        assert_eq!(schools[0].school.school_name, "Abbey Road Prep");
        assert!(schools[0].classes.is_empty());
        let names: Vec<&str> = schools[1].classes.iter().map(|c| c.class_name.as_str()).collect();
        assert_eq!(names, vec!["Grade 1A", "Grade 3B"]);
    }

    #[test]
    fn test_events_list_undated_last() {
        let (db, school, _) = seeded();
        for (name, day) in [("Undated", None), ("Early", Some(1)), ("Late", Some(20))] {
            db.insert_event(&NewEvent {
                school_id: school.school_id,
                event_name: name.to_string(),
                shoot_date: day.map(|d| Utc.with_ymd_and_hms(2025, 6, d, 9, 0, 0).unwrap()),
                ..Default::default()
            })
            .unwrap();
        }

        let names: Vec<String> = db
            .list_events()
            .unwrap()
            .into_iter()
            .map(|e| e.event.event_name)
            .collect();
        assert_eq!(names, vec!["Late", "Early", "Undated"]);
    }

    #[test]
    fn test_students_carry_class_and_school() {
        let (db, _, class) = seeded();
        db.insert_student(&NewStudent {
            class_id: class.class_id,
            student_name: "Thandi M.".to_string(),
            ..Default::default()
        })
        .unwrap();

        let students = db.list_students().unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].class.as_ref().unwrap().class_name, "Grade 3B");
        assert_eq!(students[0].school.as_ref().unwrap().school_name, "Hillcrest Primary");
        assert_eq!(db.students_by_class(class.class_id).unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_timestamp_is_reported() {
        let (db, _, _) = seeded();
        db.conn
            .execute("UPDATE schools SET created_at = 'yesterday-ish'", [])
            .unwrap();
        assert!(matches!(db.list_schools(), Err(StoreError::Corrupt(_))));
    }
}
