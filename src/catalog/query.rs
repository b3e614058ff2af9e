//! Paginated, filtered gallery queries.

use tracing::{debug, error};

use super::CatalogError;
use crate::db::{Database, GalleryPhoto, PhotoFilter};

/// One request for a page of gallery photos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoQuery {
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
    pub school_id: Option<i64>,
    pub class_id: Option<i64>,
    pub event_id: Option<i64>,
    /// Free-text search applied to the fetched page.
    pub search: Option<String>,
    pub public_only: bool,
}

impl PhotoQuery {
    /// An unfiltered query over public photos.
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size,
            school_id: None,
            class_id: None,
            event_id: None,
            search: None,
            public_only: true,
        }
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.page < 1 {
            return Err(CatalogError::InvalidRequest(format!(
                "page must be at least 1, got {}",
                self.page
            )));
        }
        if self.page_size < 1 {
            return Err(CatalogError::InvalidRequest(format!(
                "page size must be at least 1, got {}",
                self.page_size
            )));
        }
        Ok(())
    }

    fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    fn filter(&self) -> PhotoFilter {
        PhotoFilter {
            school_id: self.school_id,
            class_id: self.class_id,
            event_id: self.event_id,
            public_only: self.public_only,
        }
    }

    /// The normalized search needle, or `None` when there is nothing to match.
    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhotoPage {
    pub photos: Vec<GalleryPhoto>,
    /// Whether the store returned a full page. Computed before the search
    /// filter, so it can be true on a page that search emptied and can be
    /// true when the next page turns out empty.
    pub has_more: bool,
}

/// Fetch one page of gallery photos.
pub fn query_photos(store: &Database, request: &PhotoQuery) -> Result<PhotoPage, CatalogError> {
    request.validate()?;

    let rows = store
        .gallery_page(&request.filter(), request.page_size, request.offset())
        .map_err(|e| {
            error!("Failed to query photos {:?}: {}", request, e);
            CatalogError::from(e)
        })?;

    let has_more = rows.len() == request.page_size as usize;

    let photos = match request.search_term() {
        Some(needle) => rows
            .into_iter()
            .filter(|photo| matches_search(photo, &needle))
            .collect(),
        None => rows,
    };

    debug!(
        "Photo query page {} size {} returned {} rows (has_more: {})",
        request.page,
        request.page_size,
        photos.len(),
        has_more
    );

    Ok(PhotoPage { photos, has_more })
}

/// `needle` must already be lowercased.
fn matches_search(photo: &GalleryPhoto, needle: &str) -> bool {
    let contains = |text: &str| text.to_lowercase().contains(needle);

    contains(&photo.photo.photo_reference_code)
        || photo.class.as_ref().is_some_and(|c| contains(&c.class_name))
        || photo.school.as_ref().is_some_and(|s| contains(&s.school_name))
        || photo.event.as_ref().is_some_and(|e| contains(&e.event_name))
}

/// Look up a single gallery photo by its reference code.
pub fn photo_by_reference_code(
    store: &Database,
    code: &str,
    public_only: bool,
) -> Result<Option<GalleryPhoto>, CatalogError> {
    let code = code.trim();
    if code.is_empty() {
        return Ok(None);
    }

    store
        .gallery_photo_by_reference_code(code, public_only)
        .map_err(|e| {
            error!("Failed to look up photo {:?}: {}", code, e);
            CatalogError::from(e)
        })
}
