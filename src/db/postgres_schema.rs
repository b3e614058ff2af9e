pub const POSTGRES_SCHEMA: &str = r#"
-- PostgreSQL schema for schoolshots

CREATE TABLE IF NOT EXISTS schools (
    school_id BIGSERIAL PRIMARY KEY,
    school_name TEXT NOT NULL,
    contact_person TEXT,
    contact_email TEXT,
    contact_phone TEXT,
    address TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_schools_name ON schools(school_name);

CREATE TABLE IF NOT EXISTS photo_shoot_events (
    event_id BIGSERIAL PRIMARY KEY,
    school_id BIGINT REFERENCES schools(school_id),
    event_name TEXT NOT NULL,
    shoot_date TEXT,
    order_deadline TEXT,
    photo_gallery_live_until TEXT,
    notes TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_events_school ON photo_shoot_events(school_id);
CREATE INDEX IF NOT EXISTS idx_events_shoot_date ON photo_shoot_events(shoot_date);

CREATE TABLE IF NOT EXISTS classes (
    class_id BIGSERIAL PRIMARY KEY,
    school_id BIGINT NOT NULL REFERENCES schools(school_id),
    class_name TEXT NOT NULL,
    teacher_name TEXT,
    academic_year INTEGER,
    event_id BIGINT REFERENCES photo_shoot_events(event_id),
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_classes_school ON classes(school_id);
CREATE INDEX IF NOT EXISTS idx_classes_year ON classes(academic_year);

CREATE TABLE IF NOT EXISTS students (
    student_id BIGSERIAL PRIMARY KEY,
    class_id BIGINT NOT NULL REFERENCES classes(class_id),
    student_name TEXT NOT NULL,
    parent_name_on_form TEXT,
    parent_cell_on_form TEXT,
    parent_email_on_form TEXT,
    student_reference_id TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_students_class ON students(class_id);

CREATE TABLE IF NOT EXISTS photos (
    photo_id BIGSERIAL PRIMARY KEY,
    image_url TEXT NOT NULL,
    thumbnail_url TEXT,
    photo_reference_code TEXT NOT NULL,
    class_id BIGINT REFERENCES classes(class_id),
    student_id BIGINT REFERENCES students(student_id),
    event_id BIGINT REFERENCES photo_shoot_events(event_id),
    is_class_photo BOOLEAN NOT NULL DEFAULT FALSE,
    is_public_in_gallery BOOLEAN NOT NULL DEFAULT FALSE,
    uploaded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_photos_class ON photos(class_id);
CREATE INDEX IF NOT EXISTS idx_photos_student ON photos(student_id);
CREATE INDEX IF NOT EXISTS idx_photos_event ON photos(event_id);
CREATE INDEX IF NOT EXISTS idx_photos_reference ON photos(photo_reference_code);
CREATE INDEX IF NOT EXISTS idx_photos_public_uploaded ON photos(is_public_in_gallery, uploaded_at);
"#;
