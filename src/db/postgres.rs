//! PostgreSQL backend implementation.

use chrono::{DateTime, Utc};
use postgres::types::{FromSql, ToSql};
use postgres::{Client, NoTls, Row};
use r2d2::{Pool, PooledConnection};
use r2d2_postgres::PostgresConnectionManager;
use std::collections::HashMap;
use std::error::Error as _;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard};

use super::classes::{Class, ClassSummary, ClassWithSchool, NewClass, CLASS_COLUMNS};
use super::events::{EventSummary, EventWithSchool, NewEvent, PhotoShootEvent, EVENT_COLUMNS};
use super::photos::{
    GalleryPhoto, NewPhoto, Photo, PhotoFilter, PhotoOwner, GALLERY_COLUMNS, GALLERY_FROM,
    GALLERY_ORDER, PHOTO_COLUMNS,
};
use super::postgres_schema::POSTGRES_SCHEMA;
use super::schools::{NewSchool, School, SchoolSummary, SchoolWithClasses, SCHOOL_COLUMNS};
use super::students::{NewStudent, Student, StudentWithClass, STUDENT_COLUMNS};
use super::{format_timestamp, parse_timestamp, StoreError};

type Manager = PostgresConnectionManager<NoTls>;

impl From<postgres::Error> for StoreError {
    fn from(err: postgres::Error) -> Self {
        let io_failure = err
            .source()
            .is_some_and(|source| source.is::<std::io::Error>());
        if err.is_closed() || io_failure {
            StoreError::Unavailable(err.to_string())
        } else {
            StoreError::Query(err.to_string())
        }
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(err: r2d2::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

type PooledClient = PooledConnection<Manager>;

#[derive(Clone)]
pub struct PgDb {
    pool: Pool<Manager>,
    /// Set inside [`PgDb::transaction`]: every statement runs on this one
    /// connection instead of a fresh pool checkout.
    pinned: Option<Arc<Mutex<PooledClient>>>,
}

/// A connection borrowed either from the pool or from an open transaction.
enum ClientGuard<'a> {
    Pooled(PooledClient),
    Pinned(MutexGuard<'a, PooledClient>),
}

impl Deref for ClientGuard<'_> {
    type Target = Client;

    fn deref(&self) -> &Client {
        match self {
            ClientGuard::Pooled(client) => client,
            ClientGuard::Pinned(client) => client,
        }
    }
}

impl DerefMut for ClientGuard<'_> {
    fn deref_mut(&mut self) -> &mut Client {
        match self {
            ClientGuard::Pooled(client) => client,
            ClientGuard::Pinned(client) => client,
        }
    }
}

impl PgDb {
    pub fn open(url: &str, pool_size: u32) -> Result<Self, StoreError> {
        let config = url
            .parse()
            .map_err(|e: postgres::Error| StoreError::Unavailable(format!("invalid PostgreSQL URL: {}", e)))?;
        let manager = PostgresConnectionManager::new(config, NoTls);
        let pool = Pool::builder().max_size(pool_size).build(manager)?;
        Ok(Self { pool, pinned: None })
    }

    fn client(&self) -> Result<ClientGuard<'_>, StoreError> {
        match &self.pinned {
            Some(pinned) => pinned
                .lock()
                .map(ClientGuard::Pinned)
                .map_err(|_| StoreError::Unavailable("transaction connection poisoned".to_string())),
            None => Ok(ClientGuard::Pooled(self.pool.get()?)),
        }
    }

    /// Run `work` against a handle whose statements all share one
    /// connection inside `BEGIN`/`COMMIT`. Any error rolls the work back.
    pub fn transaction<T, E>(&self, work: impl FnOnce(&PgDb) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        if self.pinned.is_some() {
            return work(self);
        }

        let mut client = self.pool.get().map_err(StoreError::from)?;
        client.batch_execute("BEGIN").map_err(StoreError::from)?;
        let pinned = Arc::new(Mutex::new(client));
        let scoped = PgDb {
            pool: self.pool.clone(),
            pinned: Some(Arc::clone(&pinned)),
        };

        let result = work(&scoped);
        drop(scoped);

        let mut client = pinned
            .lock()
            .map_err(|_| StoreError::Unavailable("transaction connection poisoned".to_string()))?;
        match result {
            Ok(value) => {
                client.batch_execute("COMMIT").map_err(StoreError::from)?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = client.batch_execute("ROLLBACK") {
                    tracing::warn!("Rollback failed: {}", rollback);
                }
                Err(e)
            }
        }
    }

    pub fn initialize(&self) -> Result<(), StoreError> {
        let mut client = self.client()?;
        client.batch_execute(POSTGRES_SCHEMA)?;
        Ok(())
    }

    // ========================================================================
    // School operations
    // ========================================================================

    pub fn insert_school(&self, school: &NewSchool) -> Result<School, StoreError> {
        let mut client = self.client()?;
        let sql = format!(
            r#"
            INSERT INTO schools AS s (school_name, contact_person, contact_email, contact_phone, address, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            SCHOOL_COLUMNS
        );
        let row = client.query_one(
            &sql,
            &[
                &school.school_name,
                &school.contact_person,
                &school.contact_email,
                &school.contact_phone,
                &school.address,
                &format_timestamp(&Utc::now()),
            ],
        )?;
        school_from_row(&row, 0)
    }

    pub fn get_school(&self, school_id: i64) -> Result<Option<School>, StoreError> {
        let mut client = self.client()?;
        let sql = format!("SELECT {} FROM schools s WHERE s.school_id = $1", SCHOOL_COLUMNS);
        client
            .query_opt(&sql, &[&school_id])?
            .map(|row| school_from_row(&row, 0))
            .transpose()
    }

    pub fn list_schools(&self) -> Result<Vec<School>, StoreError> {
        let mut client = self.client()?;
        let sql = format!(
            "SELECT {} FROM schools s ORDER BY s.school_name ASC, s.school_id ASC",
            SCHOOL_COLUMNS
        );
        client
            .query(&sql, &[])?
            .iter()
            .map(|row| school_from_row(row, 0))
            .collect()
    }

    pub fn list_schools_with_classes(&self) -> Result<Vec<SchoolWithClasses>, StoreError> {
        let schools = self.list_schools()?;

        let mut by_school: HashMap<i64, Vec<ClassSummary>> = HashMap::new();
        for class in self.list_classes()? {
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
        let mut client = self.client()?;
        let sql = format!(
            r#"
            INSERT INTO classes AS c (school_id, class_name, teacher_name, academic_year, event_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            CLASS_COLUMNS
        );
        let row = client.query_one(
            &sql,
            &[
                &class.school_id,
                &class.class_name,
                &class.teacher_name,
                &class.academic_year,
                &class.event_id,
                &format_timestamp(&Utc::now()),
            ],
        )?;
        class_from_row(&row, 0)
    }

    pub fn get_class(&self, class_id: i64) -> Result<Option<Class>, StoreError> {
        let mut client = self.client()?;
        let sql = format!("SELECT {} FROM classes c WHERE c.class_id = $1", CLASS_COLUMNS);
        client
            .query_opt(&sql, &[&class_id])?
            .map(|row| class_from_row(&row, 0))
            .transpose()
    }

    pub fn list_classes(&self) -> Result<Vec<Class>, StoreError> {
        let mut client = self.client()?;
        let sql = format!(
            "SELECT {} FROM classes c ORDER BY c.class_name ASC, c.class_id ASC",
            CLASS_COLUMNS
        );
        client
            .query(&sql, &[])?
            .iter()
            .map(|row| class_from_row(row, 0))
            .collect()
    }

    pub fn classes_by_school(&self, school_id: i64) -> Result<Vec<Class>, StoreError> {
        let mut client = self.client()?;
        let sql = format!(
            "SELECT {} FROM classes c WHERE c.school_id = $1 ORDER BY c.class_name ASC, c.class_id ASC",
            CLASS_COLUMNS
        );
        client
            .query(&sql, &[&school_id])?
            .iter()
            .map(|row| class_from_row(row, 0))
            .collect()
    }

    pub fn classes_for_year(&self, academic_year: i32) -> Result<Vec<ClassWithSchool>, StoreError> {
        let mut client = self.client()?;
        let sql = format!(
            r#"
            SELECT {}, s.school_id, s.school_name
            FROM classes c
            LEFT JOIN schools s ON s.school_id = c.school_id
            WHERE c.academic_year = $1
            ORDER BY c.class_name ASC, c.class_id ASC
            "#,
            CLASS_COLUMNS
        );
        client
            .query(&sql, &[&academic_year])?
            .iter()
            .map(|row| {
                Ok(ClassWithSchool {
                    class: class_from_row(row, 0)?,
                    school: school_summary_from_row(row, 7)?,
                })
            })
            .collect()
    }

    // ========================================================================
    // Event operations
    // ========================================================================

    pub fn insert_event(&self, event: &NewEvent) -> Result<PhotoShootEvent, StoreError> {
        let mut client = self.client()?;
        let sql = format!(
            r#"
            INSERT INTO photo_shoot_events AS e
                (school_id, event_name, shoot_date, order_deadline, photo_gallery_live_until, notes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            EVENT_COLUMNS
        );
        let row = client.query_one(
            &sql,
            &[
                &event.school_id,
                &event.event_name,
                &event.shoot_date.as_ref().map(format_timestamp),
                &event.order_deadline.as_ref().map(format_timestamp),
                &event.photo_gallery_live_until.as_ref().map(format_timestamp),
                &event.notes,
                &format_timestamp(&Utc::now()),
            ],
        )?;
        event_from_row(&row, 0)
    }

    pub fn get_event(&self, event_id: i64) -> Result<Option<PhotoShootEvent>, StoreError> {
        let mut client = self.client()?;
        let sql = format!(
            "SELECT {} FROM photo_shoot_events e WHERE e.event_id = $1",
            EVENT_COLUMNS
        );
        client
            .query_opt(&sql, &[&event_id])?
            .map(|row| event_from_row(&row, 0))
            .transpose()
    }

    pub fn list_events(&self) -> Result<Vec<EventWithSchool>, StoreError> {
        let mut client = self.client()?;
        let sql = format!(
            r#"
            SELECT {}, s.school_id, s.school_name
            FROM photo_shoot_events e
            LEFT JOIN schools s ON s.school_id = e.school_id
            ORDER BY e.shoot_date IS NULL, e.shoot_date DESC, e.event_id ASC
            "#,
            EVENT_COLUMNS
        );
        client
            .query(&sql, &[])?
            .iter()
            .map(|row| {
                Ok(EventWithSchool {
                    event: event_from_row(row, 0)?,
                    school: school_summary_from_row(row, 8)?,
                })
            })
            .collect()
    }

    pub fn events_by_school(&self, school_id: i64) -> Result<Vec<PhotoShootEvent>, StoreError> {
        let mut client = self.client()?;
        let sql = format!(
            r#"
            SELECT {}
            FROM photo_shoot_events e
            WHERE e.school_id = $1
            ORDER BY e.shoot_date IS NULL, e.shoot_date DESC, e.event_id ASC
            "#,
            EVENT_COLUMNS
        );
        client
            .query(&sql, &[&school_id])?
            .iter()
            .map(|row| event_from_row(row, 0))
            .collect()
    }

    // ========================================================================
    // Student operations
    // ========================================================================

    pub fn insert_student(&self, student: &NewStudent) -> Result<Student, StoreError> {
        let mut client = self.client()?;
        let sql = format!(
            r#"
            INSERT INTO students AS st
                (class_id, student_name, parent_name_on_form, parent_cell_on_form,
                 parent_email_on_form, student_reference_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            STUDENT_COLUMNS
        );
        let row = client.query_one(
            &sql,
            &[
                &student.class_id,
                &student.student_name,
                &student.parent_name_on_form,
                &student.parent_cell_on_form,
                &student.parent_email_on_form,
                &student.student_reference_id,
                &format_timestamp(&Utc::now()),
            ],
        )?;
        student_from_row(&row, 0)
    }

    pub fn get_student(&self, student_id: i64) -> Result<Option<Student>, StoreError> {
        let mut client = self.client()?;
        let sql = format!("SELECT {} FROM students st WHERE st.student_id = $1", STUDENT_COLUMNS);
        client
            .query_opt(&sql, &[&student_id])?
            .map(|row| student_from_row(&row, 0))
            .transpose()
    }

    pub fn students_by_class(&self, class_id: i64) -> Result<Vec<Student>, StoreError> {
        let mut client = self.client()?;
        let sql = format!(
            "SELECT {} FROM students st WHERE st.class_id = $1 ORDER BY st.student_name ASC, st.student_id ASC",
            STUDENT_COLUMNS
        );
        client
            .query(&sql, &[&class_id])?
            .iter()
            .map(|row| student_from_row(row, 0))
            .collect()
    }

    pub fn list_students(&self) -> Result<Vec<StudentWithClass>, StoreError> {
        let mut client = self.client()?;
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
        client
            .query(&sql, &[])?
            .iter()
            .map(|row| {
                Ok(StudentWithClass {
                    student: student_from_row(row, 0)?,
                    class: class_summary_from_row(row, 8)?,
                    school: school_summary_from_row(row, 12)?,
                })
            })
            .collect()
    }

    // ========================================================================
    // Photo operations
    // ========================================================================

    pub fn insert_photo(&self, photo: &NewPhoto) -> Result<Photo, StoreError> {
        let mut client = self.client()?;
        let uploaded_at = photo.uploaded_at.unwrap_or_else(Utc::now);
        let sql = format!(
            r#"
            INSERT INTO photos AS p
                (image_url, thumbnail_url, photo_reference_code, class_id, student_id, event_id,
                 is_class_photo, is_public_in_gallery, uploaded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            PHOTO_COLUMNS
        );
        let row = client.query_one(
            &sql,
            &[
                &photo.image_url,
                &photo.thumbnail_url,
                &photo.photo_reference_code,
                &photo.class_id,
                &photo.student_id,
                &photo.event_id,
                &photo.is_class_photo,
                &photo.is_public_in_gallery,
                &format_timestamp(&uploaded_at),
            ],
        )?;
        photo_from_row(&row, 0)
    }

    pub fn get_photo(&self, photo_id: i64) -> Result<Option<Photo>, StoreError> {
        let mut client = self.client()?;
        let sql = format!("SELECT {} FROM photos p WHERE p.photo_id = $1", PHOTO_COLUMNS);
        client
            .query_opt(&sql, &[&photo_id])?
            .map(|row| photo_from_row(&row, 0))
            .transpose()
    }

    pub fn photo_by_reference_code(&self, code: &str) -> Result<Option<Photo>, StoreError> {
        let mut client = self.client()?;
        let sql = format!(
            "SELECT {} FROM photos p WHERE p.photo_reference_code = $1 ORDER BY p.uploaded_at DESC, p.photo_id DESC LIMIT 1",
            PHOTO_COLUMNS
        );
        client
            .query_opt(&sql, &[&code])?
            .map(|row| photo_from_row(&row, 0))
            .transpose()
    }

    pub fn photos_by_owner(&self, owner: PhotoOwner) -> Result<Vec<Photo>, StoreError> {
        let mut client = self.client()?;
        let sql = format!(
            r#"
            SELECT {}
            FROM photos p
            LEFT JOIN classes c ON c.class_id = p.class_id
            WHERE {} = $1
            {}
            "#,
            PHOTO_COLUMNS,
            owner.column(),
            GALLERY_ORDER
        );
        client
            .query(&sql, &[&owner.id()])?
            .iter()
            .map(|row| photo_from_row(row, 0))
            .collect()
    }

    pub fn photos_uploaded_between(
        &self,
        start: &DateTime<Utc>,
        end: &DateTime<Utc>,
    ) -> Result<Vec<Photo>, StoreError> {
        let mut client = self.client()?;
        let sql = format!(
            "SELECT {} FROM photos p WHERE p.uploaded_at >= $1 AND p.uploaded_at <= $2 {}",
            PHOTO_COLUMNS, GALLERY_ORDER
        );
        client
            .query(&sql, &[&format_timestamp(start), &format_timestamp(end)])?
            .iter()
            .map(|row| photo_from_row(row, 0))
            .collect()
    }

    pub fn gallery_page(
        &self,
        filter: &PhotoFilter,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<GalleryPhoto>, StoreError> {
        let offset = i64::try_from(offset)
            .map_err(|_| StoreError::Query(format!("page offset {} out of range", offset)))?;
        let limit = i64::from(limit);
        let (where_clause, filter_params) = filter.where_clause(|n| format!("${}", n));
        let sql = format!(
            "SELECT {}, {} {} {} {} LIMIT ${} OFFSET ${}",
            PHOTO_COLUMNS,
            GALLERY_COLUMNS,
            GALLERY_FROM,
            where_clause,
            GALLERY_ORDER,
            filter_params.len() + 1,
            filter_params.len() + 2
        );

        let mut params: Vec<&(dyn ToSql + Sync)> =
            filter_params.iter().map(|v| v as &(dyn ToSql + Sync)).collect();
        params.push(&limit);
        params.push(&offset);

        let mut client = self.client()?;
        client
            .query(&sql, &params)?
            .iter()
            .map(gallery_photo_from_row)
            .collect()
    }

    pub fn gallery_photo_by_reference_code(
        &self,
        code: &str,
        public_only: bool,
    ) -> Result<Option<GalleryPhoto>, StoreError> {
        let mut client = self.client()?;
        let visibility = if public_only {
            "AND p.is_public_in_gallery = TRUE"
        } else {
            ""
        };
        let sql = format!(
            "SELECT {}, {} {} WHERE p.photo_reference_code = $1 {} {} LIMIT 1",
            PHOTO_COLUMNS, GALLERY_COLUMNS, GALLERY_FROM, visibility, GALLERY_ORDER
        );
        client
            .query_opt(&sql, &[&code])?
            .map(|row| gallery_photo_from_row(&row))
            .transpose()
    }
}

fn column<'a, T: FromSql<'a>>(row: &'a Row, idx: usize) -> Result<T, StoreError> {
    row.try_get(idx)
        .map_err(|e| StoreError::Corrupt(format!("column {}: {}", idx, e)))
}

fn timestamp_at(row: &Row, idx: usize) -> Result<DateTime<Utc>, StoreError> {
    let text: String = column(row, idx)?;
    parse_timestamp(&text).map_err(|e| StoreError::Corrupt(format!("column {}: {}", idx, e)))
}

fn optional_timestamp_at(row: &Row, idx: usize) -> Result<Option<DateTime<Utc>>, StoreError> {
    let text: Option<String> = column(row, idx)?;
    text.map(|text| {
        parse_timestamp(&text).map_err(|e| StoreError::Corrupt(format!("column {}: {}", idx, e)))
    })
    .transpose()
}

fn school_from_row(row: &Row, base: usize) -> Result<School, StoreError> {
    Ok(School {
        school_id: column(row, base)?,
        school_name: column(row, base + 1)?,
        contact_person: column(row, base + 2)?,
        contact_email: column(row, base + 3)?,
        contact_phone: column(row, base + 4)?,
        address: column(row, base + 5)?,
        created_at: timestamp_at(row, base + 6)?,
    })
}

fn class_from_row(row: &Row, base: usize) -> Result<Class, StoreError> {
    Ok(Class {
        class_id: column(row, base)?,
        school_id: column(row, base + 1)?,
        class_name: column(row, base + 2)?,
        teacher_name: column(row, base + 3)?,
        academic_year: column(row, base + 4)?,
        event_id: column(row, base + 5)?,
        created_at: timestamp_at(row, base + 6)?,
    })
}

fn event_from_row(row: &Row, base: usize) -> Result<PhotoShootEvent, StoreError> {
    Ok(PhotoShootEvent {
        event_id: column(row, base)?,
        school_id: column(row, base + 1)?,
        event_name: column(row, base + 2)?,
        shoot_date: optional_timestamp_at(row, base + 3)?,
        order_deadline: optional_timestamp_at(row, base + 4)?,
        photo_gallery_live_until: optional_timestamp_at(row, base + 5)?,
        notes: column(row, base + 6)?,
        created_at: timestamp_at(row, base + 7)?,
    })
}

fn student_from_row(row: &Row, base: usize) -> Result<Student, StoreError> {
    Ok(Student {
        student_id: column(row, base)?,
        class_id: column(row, base + 1)?,
        student_name: column(row, base + 2)?,
        parent_name_on_form: column(row, base + 3)?,
        parent_cell_on_form: column(row, base + 4)?,
        parent_email_on_form: column(row, base + 5)?,
        student_reference_id: column(row, base + 6)?,
        created_at: timestamp_at(row, base + 7)?,
    })
}

fn photo_from_row(row: &Row, base: usize) -> Result<Photo, StoreError> {
    Ok(Photo {
        photo_id: column(row, base)?,
        image_url: column(row, base + 1)?,
        thumbnail_url: column(row, base + 2)?,
        photo_reference_code: column(row, base + 3)?,
        class_id: column(row, base + 4)?,
        student_id: column(row, base + 5)?,
        event_id: column(row, base + 6)?,
        is_class_photo: column(row, base + 7)?,
        is_public_in_gallery: column(row, base + 8)?,
        uploaded_at: timestamp_at(row, base + 9)?,
    })
}

fn school_summary_from_row(row: &Row, base: usize) -> Result<Option<SchoolSummary>, StoreError> {
    let Some(school_id) = column::<Option<i64>>(row, base)? else {
        return Ok(None);
    };
    Ok(Some(SchoolSummary {
        school_id,
        school_name: column(row, base + 1)?,
    }))
}

fn class_summary_from_row(row: &Row, base: usize) -> Result<Option<ClassSummary>, StoreError> {
    let Some(class_id) = column::<Option<i64>>(row, base)? else {
        return Ok(None);
    };
    Ok(Some(ClassSummary {
        class_id,
        class_name: column(row, base + 1)?,
        teacher_name: column(row, base + 2)?,
        academic_year: column(row, base + 3)?,
    }))
}

fn event_summary_from_row(row: &Row, base: usize) -> Result<Option<EventSummary>, StoreError> {
    let Some(event_id) = column::<Option<i64>>(row, base)? else {
        return Ok(None);
    };
    Ok(Some(EventSummary {
        event_id,
        event_name: column(row, base + 1)?,
        shoot_date: optional_timestamp_at(row, base + 2)?,
    }))
}

fn gallery_photo_from_row(row: &Row) -> Result<GalleryPhoto, StoreError> {
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

    /// Runs against `TEST_DATABASE_URL`; skipped when it is not set.
    fn test_db() -> Option<PgDb> {
        let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
            eprintln!("skipping: TEST_DATABASE_URL not set");
            return None;
        };
        let db = PgDb::open(&url, 2).unwrap();
        db.initialize().unwrap();
        Some(db)
    }

    #[test]
    fn test_undecodable_column_is_corrupt() {
        let Some(db) = test_db() else { return };
        let mut client = db.client().unwrap();
        let row = client.query_one("SELECT 42::INT4", &[]).unwrap();
        let decoded: Result<String, StoreError> = column(&row, 0);
        assert!(matches!(decoded, Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_server_side_failure_is_a_query_error() {
        let Some(db) = test_db() else { return };
        let mut client = db.client().unwrap();
        let err = client.query("SELECT * FROM no_such_table", &[]).unwrap_err();
        assert!(matches!(StoreError::from(err), StoreError::Query(_)));
    }

    #[test]
    fn test_failed_transaction_rolls_back() {
        let Some(db) = test_db() else { return };
        let name = format!("Rollback School {}", std::process::id());

        let result: Result<(), StoreError> = db.transaction(|scoped| {
            scoped.insert_school(&NewSchool {
                school_name: name.clone(),
                ..Default::default()
            })?;
            Err(StoreError::Query("abandoned".to_string()))
        });
        assert!(result.is_err());
        let schools = db.list_schools().unwrap();
        assert!(schools.iter().all(|s| s.school_name != name));

        let kept = db
            .transaction(|scoped| {
                scoped.insert_school(&NewSchool {
                    school_name: name.clone(),
                    ..Default::default()
                })
            })
            .unwrap();
        assert!(db.get_school(kept.school_id).unwrap().is_some());
    }
}
