pub const SCHEMA: &str = r#"
-- Schools: root of the tenancy hierarchy
CREATE TABLE IF NOT EXISTS schools (
    school_id INTEGER PRIMARY KEY AUTOINCREMENT,
    school_name TEXT NOT NULL,
    contact_person TEXT,
    contact_email TEXT,
    contact_phone TEXT,
    address TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_schools_name ON schools(school_name);

-- Photo-shoot events: dated sessions at a school
CREATE TABLE IF NOT EXISTS photo_shoot_events (
    event_id INTEGER PRIMARY KEY AUTOINCREMENT,
    school_id INTEGER,
    event_name TEXT NOT NULL,
    shoot_date TEXT,                 -- RFC 3339, UTC
    order_deadline TEXT,
    photo_gallery_live_until TEXT,
    notes TEXT,
    created_at TEXT NOT NULL,
    FOREIGN KEY (school_id) REFERENCES schools(school_id)
);

CREATE INDEX IF NOT EXISTS idx_events_school ON photo_shoot_events(school_id);
CREATE INDEX IF NOT EXISTS idx_events_shoot_date ON photo_shoot_events(shoot_date);

-- Classes: always owned by a school, optionally tied to an event
CREATE TABLE IF NOT EXISTS classes (
    class_id INTEGER PRIMARY KEY AUTOINCREMENT,
    school_id INTEGER NOT NULL,
    class_name TEXT NOT NULL,
    teacher_name TEXT,
    academic_year INTEGER,
    event_id INTEGER,
    created_at TEXT NOT NULL,
    FOREIGN KEY (school_id) REFERENCES schools(school_id),
    FOREIGN KEY (event_id) REFERENCES photo_shoot_events(event_id)
);

CREATE INDEX IF NOT EXISTS idx_classes_school ON classes(school_id);
CREATE INDEX IF NOT EXISTS idx_classes_year ON classes(academic_year);

-- Students: class rosters
CREATE TABLE IF NOT EXISTS students (
    student_id INTEGER PRIMARY KEY AUTOINCREMENT,
    class_id INTEGER NOT NULL,
    student_name TEXT NOT NULL,
    parent_name_on_form TEXT,
    parent_cell_on_form TEXT,
    parent_email_on_form TEXT,
    student_reference_id TEXT,
    created_at TEXT NOT NULL,
    FOREIGN KEY (class_id) REFERENCES classes(class_id)
);

CREATE INDEX IF NOT EXISTS idx_students_class ON students(class_id);

-- Photos: records pointing at blob storage
CREATE TABLE IF NOT EXISTS photos (
    photo_id INTEGER PRIMARY KEY AUTOINCREMENT,
    image_url TEXT NOT NULL,
    thumbnail_url TEXT,
    photo_reference_code TEXT NOT NULL,  -- not unique, see DESIGN.md
    class_id INTEGER,
    student_id INTEGER,                  -- NULL for class/event photos
    event_id INTEGER,
    is_class_photo INTEGER NOT NULL DEFAULT 0,
    is_public_in_gallery INTEGER NOT NULL DEFAULT 0,
    uploaded_at TEXT NOT NULL,
    FOREIGN KEY (class_id) REFERENCES classes(class_id),
    FOREIGN KEY (student_id) REFERENCES students(student_id),
    FOREIGN KEY (event_id) REFERENCES photo_shoot_events(event_id)
);

CREATE INDEX IF NOT EXISTS idx_photos_class ON photos(class_id);
CREATE INDEX IF NOT EXISTS idx_photos_student ON photos(student_id);
CREATE INDEX IF NOT EXISTS idx_photos_event ON photos(event_id);
CREATE INDEX IF NOT EXISTS idx_photos_reference ON photos(photo_reference_code);
CREATE INDEX IF NOT EXISTS idx_photos_public_uploaded ON photos(is_public_in_gallery, uploaded_at);
"#;
