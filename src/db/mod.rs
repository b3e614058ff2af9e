mod schema;
pub mod classes;
pub mod events;
pub mod photos;
pub mod schools;
pub mod sqlite;
pub mod students;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "postgres")]
pub mod postgres_schema;

use chrono::{DateTime, SecondsFormat, Utc};
use std::path::PathBuf;
use thiserror::Error;

pub use schema::SCHEMA;
pub use classes::{Class, ClassSummary, ClassWithSchool, NewClass};
pub use events::{EventSummary, EventWithSchool, NewEvent, PhotoShootEvent};
pub use photos::{GalleryPhoto, NewPhoto, Photo, PhotoFilter, PhotoOwner};
pub use schools::{NewSchool, School, SchoolSummary, SchoolWithClasses};
pub use students::{NewStudent, Student, StudentWithClass};

use crate::config::DatabaseConfig;
#[cfg(feature = "postgres")]
use crate::config::DatabaseType;

/// Failure reported by the catalog store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached: open/connect failed, busy or locked.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A statement failed to execute.
    #[error("store query failed: {0}")]
    Query(String),

    /// A row came back that does not decode into its record type.
    #[error("store returned an undecodable row: {0}")]
    Corrupt(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        match &err {
            rusqlite::Error::SqliteFailure(failure, _)
                if matches!(
                    failure.code,
                    ErrorCode::CannotOpen
                        | ErrorCode::DatabaseBusy
                        | ErrorCode::DatabaseLocked
                        | ErrorCode::NotADatabase
                        | ErrorCode::PermissionDenied
                        | ErrorCode::SystemIoFailure
                ) =>
            {
                StoreError::Unavailable(err.to_string())
            }
            rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..) => StoreError::Corrupt(err.to_string()),
            _ => StoreError::Query(err.to_string()),
        }
    }
}

/// Timestamps are stored as fixed-width RFC 3339 UTC text, so comparing the
/// strings orders them chronologically.
pub(crate) fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc))
}

/// Macro to dispatch a method call to the active backend variant.
macro_rules! dispatch {
    // No arguments beyond self
    ($self:expr, $method:ident()) => {
        match &$self.inner {
            DatabaseInner::Sqlite(db) => db.$method(),
            #[cfg(feature = "postgres")]
            DatabaseInner::Postgres(db) => db.$method(),
        }
    };
    // With arguments
    ($self:expr, $method:ident($($arg:expr),+ $(,)?)) => {
        match &$self.inner {
            DatabaseInner::Sqlite(db) => db.$method($($arg),+),
            #[cfg(feature = "postgres")]
            DatabaseInner::Postgres(db) => db.$method($($arg),+),
        }
    };
}

enum DatabaseInner {
    Sqlite(sqlite::SqliteDb),
    #[cfg(feature = "postgres")]
    Postgres(postgres::PgDb),
}

/// A handle on the catalog store, scoped to one request or command.
pub struct Database {
    inner: DatabaseInner,
}

impl From<sqlite::SqliteDb> for Database {
    fn from(db: sqlite::SqliteDb) -> Self {
        Self { inner: DatabaseInner::Sqlite(db) }
    }
}

#[cfg(feature = "postgres")]
impl From<postgres::PgDb> for Database {
    fn from(db: postgres::PgDb) -> Self {
        Self { inner: DatabaseInner::Postgres(db) }
    }
}

impl Database {
    /// Open a database connection based on the provided configuration.
    pub fn open(config: &DatabaseConfig) -> Result<Self, StoreError> {
        StoreFactory::new(config)?.connect()
    }

    pub fn initialize(&self) -> Result<(), StoreError> {
        dispatch!(self, initialize())
    }

    /// Run `work` as one unit: either every write it makes is kept or, when
    /// it returns an error, none is.
    pub fn transaction<T, E>(&self, work: impl FnOnce(&Database) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        match &self.inner {
            DatabaseInner::Sqlite(db) => db.transaction(|| work(self)),
            #[cfg(feature = "postgres")]
            DatabaseInner::Postgres(db) => {
                db.transaction(|scoped| work(&Database::from(scoped.clone())))
            }
        }
    }

    // ========================================================================
    // School operations
    // ========================================================================

    pub fn insert_school(&self, school: &NewSchool) -> Result<School, StoreError> {
        dispatch!(self, insert_school(school))
    }

    pub fn get_school(&self, school_id: i64) -> Result<Option<School>, StoreError> {
        dispatch!(self, get_school(school_id))
    }

    pub fn list_schools(&self) -> Result<Vec<School>, StoreError> {
        dispatch!(self, list_schools())
    }

    pub fn list_schools_with_classes(&self) -> Result<Vec<SchoolWithClasses>, StoreError> {
        dispatch!(self, list_schools_with_classes())
    }

    // ========================================================================
    // Class operations
    // ========================================================================

    pub fn insert_class(&self, class: &NewClass) -> Result<Class, StoreError> {
        dispatch!(self, insert_class(class))
    }

    pub fn get_class(&self, class_id: i64) -> Result<Option<Class>, StoreError> {
        dispatch!(self, get_class(class_id))
    }

    pub fn list_classes(&self) -> Result<Vec<Class>, StoreError> {
        dispatch!(self, list_classes())
    }

    pub fn classes_by_school(&self, school_id: i64) -> Result<Vec<Class>, StoreError> {
        dispatch!(self, classes_by_school(school_id))
    }

    pub fn classes_for_year(&self, academic_year: i32) -> Result<Vec<ClassWithSchool>, StoreError> {
        dispatch!(self, classes_for_year(academic_year))
    }

    // ========================================================================
    // Event operations
    // ========================================================================

    pub fn insert_event(&self, event: &NewEvent) -> Result<PhotoShootEvent, StoreError> {
        dispatch!(self, insert_event(event))
    }

    pub fn get_event(&self, event_id: i64) -> Result<Option<PhotoShootEvent>, StoreError> {
        dispatch!(self, get_event(event_id))
    }

    pub fn list_events(&self) -> Result<Vec<EventWithSchool>, StoreError> {
        dispatch!(self, list_events())
    }

    pub fn events_by_school(&self, school_id: i64) -> Result<Vec<PhotoShootEvent>, StoreError> {
        dispatch!(self, events_by_school(school_id))
    }

    // ========================================================================
    // Student operations
    // ========================================================================

    pub fn insert_student(&self, student: &NewStudent) -> Result<Student, StoreError> {
        dispatch!(self, insert_student(student))
    }

    pub fn get_student(&self, student_id: i64) -> Result<Option<Student>, StoreError> {
        dispatch!(self, get_student(student_id))
    }

    pub fn students_by_class(&self, class_id: i64) -> Result<Vec<Student>, StoreError> {
        dispatch!(self, students_by_class(class_id))
    }

    pub fn list_students(&self) -> Result<Vec<StudentWithClass>, StoreError> {
        dispatch!(self, list_students())
    }

    // ========================================================================
    // Photo operations
    // ========================================================================

    pub fn insert_photo(&self, photo: &NewPhoto) -> Result<Photo, StoreError> {
        dispatch!(self, insert_photo(photo))
    }

    pub fn get_photo(&self, photo_id: i64) -> Result<Option<Photo>, StoreError> {
        dispatch!(self, get_photo(photo_id))
    }

    /// Most recently uploaded photo carrying `code`.
    pub fn photo_by_reference_code(&self, code: &str) -> Result<Option<Photo>, StoreError> {
        dispatch!(self, photo_by_reference_code(code))
    }

    pub fn photos_by_owner(&self, owner: PhotoOwner) -> Result<Vec<Photo>, StoreError> {
        dispatch!(self, photos_by_owner(owner))
    }

    /// Photos uploaded in the inclusive range `[start, end]`, newest first.
    pub fn photos_uploaded_between(
        &self,
        start: &DateTime<Utc>,
        end: &DateTime<Utc>,
    ) -> Result<Vec<Photo>, StoreError> {
        dispatch!(self, photos_uploaded_between(start, end))
    }

    /// One page of joined gallery rows, newest upload first, ties in
    /// insertion order.
    pub fn gallery_page(
        &self,
        filter: &PhotoFilter,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<GalleryPhoto>, StoreError> {
        dispatch!(self, gallery_page(filter, limit, offset))
    }

    pub fn gallery_photo_by_reference_code(
        &self,
        code: &str,
        public_only: bool,
    ) -> Result<Option<GalleryPhoto>, StoreError> {
        dispatch!(self, gallery_photo_by_reference_code(code, public_only))
    }
}

enum FactoryInner {
    Sqlite(PathBuf),
    #[cfg(feature = "postgres")]
    Postgres(postgres::PgDb),
}

/// Hands out a fresh [`Database`] handle per request.
///
/// SQLite handles each own a connection; PostgreSQL handles share the
/// factory's connection pool.
pub struct StoreFactory {
    inner: FactoryInner,
}

impl StoreFactory {
    pub fn new(config: &DatabaseConfig) -> Result<Self, StoreError> {
        #[cfg(feature = "postgres")]
        {
            if config.backend == DatabaseType::Postgresql {
                let url = config.postgresql_url.as_deref().ok_or_else(|| {
                    StoreError::Unavailable("PostgreSQL URL not configured".to_string())
                })?;
                let pool_size = config.pool_size.unwrap_or(10);
                let pg = postgres::PgDb::open(url, pool_size)?;
                return Ok(Self { inner: FactoryInner::Postgres(pg) });
            }
        }

        Ok(Self {
            inner: FactoryInner::Sqlite(config.sqlite_path.clone()),
        })
    }

    pub fn connect(&self) -> Result<Database, StoreError> {
        match &self.inner {
            FactoryInner::Sqlite(path) => Ok(sqlite::SqliteDb::open(path)?.into()),
            #[cfg(feature = "postgres")]
            FactoryInner::Postgres(pg) => Ok(pg.clone().into()),
        }
    }
}
