use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{Datelike, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use super::errors::{ApiError, ApiResult};
use super::AppState;
use crate::catalog::{self, classify_within, EventStatus, PhotoQuery};
use crate::db::{ClassWithSchool, EventWithSchool, GalleryPhoto, School};

const INVALID_PAGINATION: &str = "Invalid pagination parameters";

/// Query string as raw key/value pairs. Repeated keys keep their first
/// value.
type QueryPairs = Query<Vec<(String, String)>>;

fn first_values(pairs: Vec<(String, String)>) -> HashMap<String, String> {
    let mut values = HashMap::new();
    for (key, value) in pairs {
        values.entry(key).or_insert(value);
    }
    values
}

/// Query string of `GET /api/photos`. Values stay strings so malformed
/// numbers can be told apart from missing ones.
#[derive(Debug, Default)]
pub struct PhotoParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub school_id: Option<String>,
    pub class_id: Option<String>,
    pub event_id: Option<String>,
    pub search: Option<String>,
}

/// Empty means "use the default"; anything else must be a number.
fn pagination_value(raw: Option<&str>, default: u32) -> Result<i64, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(i64::from(default)),
        Some(text) => text
            .parse::<i64>()
            .map_err(|_| ApiError::bad_request(INVALID_PAGINATION)),
    }
}

/// Ids that do not parse are dropped rather than rejected.
fn id_filter(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|text| text.trim().parse().ok())
}

impl PhotoParams {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut values = first_values(pairs);
        Self {
            page: values.remove("page"),
            page_size: values.remove("pageSize"),
            school_id: values.remove("schoolId"),
            class_id: values.remove("classId"),
            event_id: values.remove("eventId"),
            search: values.remove("search"),
        }
    }

    fn into_query(self, default_page_size: u32, max_page_size: u32) -> ApiResult<PhotoQuery> {
        let page = pagination_value(self.page.as_deref(), 1)?;
        let page_size = pagination_value(self.page_size.as_deref(), default_page_size)?;

        if page < 1 || page_size < 1 || page_size > i64::from(max_page_size) {
            return Err(ApiError::bad_request(INVALID_PAGINATION));
        }
        let page = u32::try_from(page).map_err(|_| ApiError::bad_request(INVALID_PAGINATION))?;
        let page_size =
            u32::try_from(page_size).map_err(|_| ApiError::bad_request(INVALID_PAGINATION))?;

        Ok(PhotoQuery {
            school_id: id_filter(self.school_id.as_deref()),
            class_id: id_filter(self.class_id.as_deref()),
            event_id: id_filter(self.event_id.as_deref()),
            search: self.search.filter(|s| !s.trim().is_empty()),
            ..PhotoQuery::new(page, page_size)
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotosResponse {
    pub photos: Vec<GalleryPhoto>,
    pub has_more: bool,
    pub page: u32,
    pub page_size: u32,
}

/// `GET /api/photos`: a page of public gallery photos.
pub async fn list_photos(
    State(state): State<AppState>,
    Query(pairs): QueryPairs,
) -> ApiResult<Json<PhotosResponse>> {
    let query = PhotoParams::from_pairs(pairs).into_query(state.default_page_size, state.max_page_size)?;
    debug!("Gallery request {:?}", query);

    let (page, page_size) = (query.page, query.page_size);
    let result = state
        .with_store("list_photos", "Internal server error", move |db| {
            catalog::query_photos(db, &query)
        })
        .await?;

    Ok(Json(PhotosResponse {
        photos: result.photos,
        has_more: result.has_more,
        page,
        page_size,
    }))
}

/// `GET /api/photos/{reference_code}`: one public photo.
pub async fn get_photo(
    State(state): State<AppState>,
    Path(reference_code): Path<String>,
) -> ApiResult<Json<GalleryPhoto>> {
    state
        .with_store("get_photo", "Internal server error", move |db| {
            catalog::photo_by_reference_code(db, &reference_code, true)
        })
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Photo not found"))
}

/// `GET /api/schools`
pub async fn list_schools(State(state): State<AppState>) -> ApiResult<Json<Vec<School>>> {
    let schools = state
        .with_store("list_schools", "Failed to fetch schools", |db| db.list_schools())
        .await?;
    Ok(Json(schools))
}

/// `GET /api/classes`: classes of the current academic year.
pub async fn list_classes(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ClassWithSchool>>> {
    let year = Utc::now().year();
    let classes = state
        .with_store("list_classes", "Failed to fetch classes", move |db| {
            db.classes_for_year(year)
        })
        .await?;
    Ok(Json(classes))
}

#[derive(Debug, Default)]
pub struct EventParams {
    pub school_id: Option<String>,
}

impl EventParams {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self {
            school_id: first_values(pairs).remove("schoolId"),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EventView {
    #[serde(flatten)]
    pub event: EventWithSchool,
    pub status: EventStatus,
    pub status_label: &'static str,
}

/// `GET /api/events`: events with their current status, optionally for one
/// school.
pub async fn list_events(
    State(state): State<AppState>,
    Query(pairs): QueryPairs,
) -> ApiResult<Json<Vec<EventView>>> {
    let params = EventParams::from_pairs(pairs);
    let school_id = id_filter(params.school_id.as_deref());
    let events = state
        .with_store("list_events", "Failed to fetch events", |db| db.list_events())
        .await?;

    let now = Utc::now();
    let views = events
        .into_iter()
        .filter(|e| school_id.is_none() || e.event.school_id == school_id)
        .map(|event| {
            let status = classify_within(&event.event, now, state.upcoming_window_days);
            EventView {
                event,
                status,
                status_label: status.label(),
            }
        })
        .collect();
    Ok(Json(views))
}
