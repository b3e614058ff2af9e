//! Gallery filter options narrowed to the selected school.

use crate::db::{Class, ClassWithSchool, EventWithSchool, PhotoShootEvent};

use super::query::PhotoQuery;

/// Records that belong to a school.
pub trait SchoolScoped {
    fn school_id(&self) -> Option<i64>;
}

impl SchoolScoped for Class {
    fn school_id(&self) -> Option<i64> {
        Some(self.school_id)
    }
}

impl SchoolScoped for ClassWithSchool {
    fn school_id(&self) -> Option<i64> {
        Some(self.class.school_id)
    }
}

impl SchoolScoped for PhotoShootEvent {
    fn school_id(&self) -> Option<i64> {
        self.school_id
    }
}

impl SchoolScoped for EventWithSchool {
    fn school_id(&self) -> Option<i64> {
        self.event.school_id
    }
}

/// Items selectable once `school_id` is chosen; everything when it is not.
/// Input order is kept.
pub fn options_for_school<T: SchoolScoped>(items: &[T], school_id: Option<i64>) -> Vec<&T> {
    match school_id {
        None => items.iter().collect(),
        Some(id) => items
            .iter()
            .filter(|item| item.school_id() == Some(id))
            .collect(),
    }
}

/// The filters a gallery viewer currently has applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GallerySelection {
    pub school_id: Option<i64>,
    pub class_id: Option<i64>,
    pub event_id: Option<i64>,
    pub search: String,
}

impl GallerySelection {
    /// Drop a class or event selection that is not offered for the
    /// selected school.
    pub fn reconcile(&mut self, classes: &[Class], events: &[PhotoShootEvent]) {
        if self.school_id.is_none() {
            return;
        }

        if let Some(class_id) = self.class_id {
            let offered = options_for_school(classes, self.school_id)
                .iter()
                .any(|c| c.class_id == class_id);
            if !offered {
                self.class_id = None;
            }
        }

        if let Some(event_id) = self.event_id {
            let offered = options_for_school(events, self.school_id)
                .iter()
                .any(|e| e.event_id == event_id);
            if !offered {
                self.event_id = None;
            }
        }
    }

    pub fn active_filter_count(&self) -> usize {
        [self.school_id, self.class_id, self.event_id]
            .iter()
            .filter(|id| id.is_some())
            .count()
            + usize::from(!self.search.is_empty())
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// The public gallery query for `page` of this selection.
    pub fn to_query(&self, page: u32, page_size: u32) -> PhotoQuery {
        PhotoQuery {
            school_id: self.school_id,
            class_id: self.class_id,
            event_id: self.event_id,
            search: (!self.search.is_empty()).then(|| self.search.clone()),
            ..PhotoQuery::new(page, page_size)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn class(class_id: i64, school_id: i64) -> Class {
        Class {
            class_id,
            school_id,
            class_name: format!("Class {}", class_id),
            teacher_name: None,
            academic_year: Some(2025),
            event_id: None,
            created_at: Utc::now(),
        }
    }

    fn event(event_id: i64, school_id: Option<i64>) -> PhotoShootEvent {
        PhotoShootEvent {
            event_id,
            school_id,
            event_name: format!("Event {}", event_id),
            shoot_date: None,
            order_deadline: None,
            photo_gallery_live_until: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_no_school_offers_everything() {
        let classes = vec![class(1, 10), class(2, 20), class(3, 10)];
        let options = options_for_school(&classes, None);
        assert_eq!(options.len(), 3);
    }

    #[test]
    fn test_school_narrows_and_keeps_order() {
        let classes = vec![class(3, 10), class(1, 20), class(2, 10)];
        let ids: Vec<_> = options_for_school(&classes, Some(10))
            .iter()
            .map(|c| c.class_id)
            .collect();
        assert_eq!(ids, vec![3, 2]);

        assert!(options_for_school(&classes, Some(99)).is_empty());
    }

    #[test]
    fn test_events_without_school_only_show_unfiltered() {
        let events = vec![event(1, Some(10)), event(2, None), event(3, Some(20))];
        assert_eq!(options_for_school(&events, None).len(), 3);
        let ids: Vec<_> = options_for_school(&events, Some(10))
            .iter()
            .map(|e| e.event_id)
            .collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_reconcile_clears_foreign_selections() {
        let classes = vec![class(1, 10), class(2, 20)];
        let events = vec![event(5, Some(10)), event(6, Some(20))];

        let mut selection = GallerySelection {
            school_id: Some(10),
            class_id: Some(2),
            event_id: Some(5),
            search: String::new(),
        };
        selection.reconcile(&classes, &events);
        assert_eq!(selection.class_id, None);
        assert_eq!(selection.event_id, Some(5));

        selection.school_id = Some(20);
        selection.class_id = Some(2);
        selection.reconcile(&classes, &events);
        assert_eq!(selection.class_id, Some(2));
        assert_eq!(selection.event_id, None);
    }

    #[test]
    fn test_reconcile_without_school_keeps_selection() {
        let mut selection = GallerySelection {
            class_id: Some(42),
            event_id: Some(43),
            ..Default::default()
        };
        selection.reconcile(&[], &[]);
        assert_eq!(selection.class_id, Some(42));
        assert_eq!(selection.event_id, Some(43));
    }

    #[test]
    fn test_active_filter_count() {
        let mut selection = GallerySelection::default();
        assert_eq!(selection.active_filter_count(), 0);

        selection.school_id = Some(1);
        selection.search = "gala".to_string();
        assert_eq!(selection.active_filter_count(), 2);

        selection.clear();
        assert_eq!(selection.active_filter_count(), 0);
    }

    #[test]
    fn test_selection_builds_public_query() {
        let selection = GallerySelection {
            school_id: Some(1),
            event_id: Some(9),
            ..Default::default()
        };
        let query = selection.to_query(2, 12);
        assert_eq!(query.page, 2);
        assert_eq!(query.school_id, Some(1));
        assert_eq!(query.event_id, Some(9));
        assert_eq!(query.search, None);
        assert!(query.public_only);
    }
}
