//! Types for photo-shoot events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::schools::SchoolSummary;

pub(crate) const EVENT_COLUMNS: &str = "e.event_id, e.school_id, e.event_name, e.shoot_date, e.order_deadline, e.photo_gallery_live_until, e.notes, e.created_at";

/// A dated photography session at a school.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoShootEvent {
    pub event_id: i64,
    pub school_id: Option<i64>,
    pub event_name: String,
    pub shoot_date: Option<DateTime<Utc>>,
    pub order_deadline: Option<DateTime<Utc>>,
    pub photo_gallery_live_until: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub school_id: i64,
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

/// The event fields joined onto photos for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    pub event_id: i64,
    pub event_name: String,
    pub shoot_date: Option<DateTime<Utc>>,
}

/// An event with its owning school's name attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventWithSchool {
    #[serde(flatten)]
    pub event: PhotoShootEvent,
    pub school: Option<SchoolSummary>,
}
