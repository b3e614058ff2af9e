//! Lifecycle status of photo-shoot events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::db::PhotoShootEvent;

/// Default width of the "This Week" window, in whole days.
pub const UPCOMING_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventStatus {
    /// No shoot date has been set.
    Pending,
    /// Shot, and the gallery is still open.
    GalleryLive,
    Completed,
    /// Not yet shot, but the order deadline has passed.
    OrdersClosed,
    /// Shooting within the upcoming window.
    Upcoming,
    Scheduled,
}

impl EventStatus {
    pub fn label(&self) -> &'static str {
        match self {
            EventStatus::Pending => "Pending",
            EventStatus::GalleryLive => "Gallery Live",
            EventStatus::Completed => "Completed",
            EventStatus::OrdersClosed => "Orders Closed",
            EventStatus::Upcoming => "This Week",
            EventStatus::Scheduled => "Scheduled",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify `event` as of `now` with the default seven-day window.
pub fn classify(event: &PhotoShootEvent, now: DateTime<Utc>) -> EventStatus {
    classify_within(event, now, UPCOMING_WINDOW_DAYS)
}

/// Classify `event` as of `now`. The first matching rule wins.
pub fn classify_within(event: &PhotoShootEvent, now: DateTime<Utc>, window_days: i64) -> EventStatus {
    let Some(shoot_date) = event.shoot_date else {
        return EventStatus::Pending;
    };

    if shoot_date < now {
        return match event.photo_gallery_live_until {
            Some(until) if until > now => EventStatus::GalleryLive,
            _ => EventStatus::Completed,
        };
    }

    if event.order_deadline.is_some_and(|deadline| deadline < now) {
        return EventStatus::OrdersClosed;
    }

    // Partial days are truncated: 7 days 23 hours away counts as 7.
    if (shoot_date - now).num_days() <= window_days {
        return EventStatus::Upcoming;
    }

    EventStatus::Scheduled
}

/// Headline counts for an events dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EventOverview {
    pub total: usize,
    pub upcoming: usize,
    pub past: usize,
    pub overdue_orders: usize,
}

impl EventOverview {
    pub fn from_events<'a, I>(events: I, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'a PhotoShootEvent>,
    {
        let mut overview = Self::default();
        for event in events {
            overview.total += 1;
            if let Some(shoot_date) = event.shoot_date {
                if shoot_date > now {
                    overview.upcoming += 1;
                } else if shoot_date < now {
                    overview.past += 1;
                }
            }
            if event.order_deadline.is_some_and(|deadline| deadline < now) {
                overview.overdue_orders += 1;
            }
        }
        overview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn event(
        shoot: Option<Duration>,
        deadline: Option<Duration>,
        gallery_until: Option<Duration>,
    ) -> PhotoShootEvent {
        PhotoShootEvent {
            event_id: 1,
            school_id: Some(1),
            event_name: "Spring Portraits".to_string(),
            shoot_date: shoot.map(|d| now() + d),
            order_deadline: deadline.map(|d| now() + d),
            photo_gallery_live_until: gallery_until.map(|d| now() + d),
            notes: None,
            created_at: now() - Duration::days(60),
        }
    }

    #[test]
    fn test_missing_shoot_date_is_pending() {
        // Other dates do not matter without a shoot date.
        let e = event(None, Some(Duration::days(-3)), Some(Duration::days(5)));
        assert_eq!(classify(&e, now()), EventStatus::Pending);
    }

    #[test]
    fn test_past_shoot_with_open_gallery_is_live() {
        let e = event(Some(Duration::days(-2)), None, Some(Duration::days(10)));
        assert_eq!(classify(&e, now()), EventStatus::GalleryLive);
    }

    #[test]
    fn test_past_shoot_is_completed() {
        let closed = event(Some(Duration::days(-2)), None, Some(Duration::days(-1)));
        assert_eq!(classify(&closed, now()), EventStatus::Completed);

        let no_gallery = event(Some(Duration::days(-2)), Some(Duration::days(-5)), None);
        assert_eq!(classify(&no_gallery, now()), EventStatus::Completed);
    }

    #[test]
    fn test_future_shoot_with_passed_deadline_is_orders_closed() {
        // Orders Closed beats This Week.
        let e = event(Some(Duration::days(3)), Some(Duration::days(-1)), None);
        assert_eq!(classify(&e, now()), EventStatus::OrdersClosed);
    }

    #[test]
    fn test_upcoming_window_truncates_partial_days() {
        let edge = event(Some(Duration::days(7) + Duration::hours(23)), None, None);
        assert_eq!(classify(&edge, now()), EventStatus::Upcoming);

        let beyond = event(Some(Duration::days(8)), None, None);
        assert_eq!(classify(&beyond, now()), EventStatus::Scheduled);

        let wider = classify_within(&beyond, now(), 14);
        assert_eq!(wider, EventStatus::Upcoming);
    }

    #[test]
    fn test_shoot_exactly_now_is_upcoming() {
        let e = event(Some(Duration::zero()), None, None);
        assert_eq!(classify(&e, now()), EventStatus::Upcoming);
    }

    #[test]
    fn test_serialized_names_and_labels() {
        assert_eq!(
            serde_json::to_string(&EventStatus::GalleryLive).unwrap(),
            "\"gallery-live\""
        );
        assert_eq!(
            serde_json::to_string(&EventStatus::OrdersClosed).unwrap(),
            "\"orders-closed\""
        );
        assert_eq!(EventStatus::Upcoming.to_string(), "This Week");
        assert_eq!(EventStatus::GalleryLive.label(), "Gallery Live");
    }

    #[test]
    fn test_overview_counts() {
        let events = vec![
            event(Some(Duration::days(3)), Some(Duration::days(-1)), None),
            event(Some(Duration::days(-3)), Some(Duration::days(-10)), None),
            event(Some(Duration::days(30)), Some(Duration::days(20)), None),
            event(None, None, None),
        ];
        let overview = EventOverview::from_events(&events, now());
        assert_eq!(
            overview,
            EventOverview {
                total: 4,
                upcoming: 2,
                past: 1,
                overdue_orders: 2,
            }
        );
    }
}
