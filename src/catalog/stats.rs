//! Dashboard statistics computed over already-loaded records.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::db::{Class, EventSummary, PhotoShootEvent, School};

const RECENT_EVENTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_schools: usize,
    pub schools_with_classes: usize,
    pub total_classes: usize,
    pub academic_year: i32,
    pub classes_in_year: usize,
    /// Rounded to one decimal place; 0 when there are no schools.
    pub average_classes_per_school: f64,
}

impl DashboardStats {
    pub fn compute(schools: &[School], classes: &[Class], academic_year: i32) -> Self {
        let with_classes: HashSet<i64> = classes.iter().map(|c| c.school_id).collect();
        let schools_with_classes = schools
            .iter()
            .filter(|s| with_classes.contains(&s.school_id))
            .count();

        let average_classes_per_school = if schools.is_empty() {
            0.0
        } else {
            (classes.len() as f64 / schools.len() as f64 * 10.0).round() / 10.0
        };

        Self {
            total_schools: schools.len(),
            schools_with_classes,
            total_classes: classes.len(),
            academic_year,
            classes_in_year: classes
                .iter()
                .filter(|c| c.academic_year == Some(academic_year))
                .count(),
            average_classes_per_school,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassStats {
    pub total_classes: usize,
    pub unique_teachers: usize,
    pub academic_years: usize,
    pub classes_with_events: usize,
}

impl ClassStats {
    /// `None` when there are no classes to summarize.
    pub fn compute(classes: &[Class]) -> Option<Self> {
        if classes.is_empty() {
            return None;
        }

        let teachers: HashSet<&str> = classes
            .iter()
            .filter_map(|c| c.teacher_name.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect();
        let years: HashSet<i32> = classes.iter().filter_map(|c| c.academic_year).collect();

        Some(Self {
            total_classes: classes.len(),
            unique_teachers: teachers.len(),
            academic_years: years.len(),
            classes_with_events: classes.iter().filter(|c| c.event_id.is_some()).count(),
        })
    }
}

/// Per-school counts shown in the school finder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchoolSummaryStats {
    pub school_id: i64,
    pub class_count: usize,
    pub event_count: usize,
    /// Up to three dated events, most recent shoot first.
    pub recent_events: Vec<EventSummary>,
}

impl SchoolSummaryStats {
    /// One entry per school, in the order given.
    pub fn for_schools(
        schools: &[School],
        classes: &[Class],
        events: &[PhotoShootEvent],
    ) -> Vec<Self> {
        let mut class_counts: HashMap<i64, usize> = HashMap::new();
        for class in classes {
            *class_counts.entry(class.school_id).or_default() += 1;
        }

        let mut events_by_school: HashMap<i64, Vec<&PhotoShootEvent>> = HashMap::new();
        for event in events {
            if let Some(school_id) = event.school_id {
                events_by_school.entry(school_id).or_default().push(event);
            }
        }

        schools
            .iter()
            .map(|school| {
                let school_events = events_by_school
                    .get(&school.school_id)
                    .map(Vec::as_slice)
                    .unwrap_or_default();

                let mut dated: Vec<&PhotoShootEvent> = school_events
                    .iter()
                    .copied()
                    .filter(|e| e.shoot_date.is_some())
                    .collect();
                dated.sort_by(|a, b| b.shoot_date.cmp(&a.shoot_date));

                Self {
                    school_id: school.school_id,
                    class_count: class_counts.get(&school.school_id).copied().unwrap_or(0),
                    event_count: school_events.len(),
                    recent_events: dated
                        .into_iter()
                        .take(RECENT_EVENTS)
                        .map(|e| EventSummary {
                            event_id: e.event_id,
                            event_name: e.event_name.clone(),
                            shoot_date: e.shoot_date,
                        })
                        .collect(),
                }
            })
            .collect()
    }
}

/// Case-insensitive substring search over school name, contact person and
/// address. A blank term matches every school.
pub fn search_schools<'a>(schools: &'a [School], term: &str) -> Vec<&'a School> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return schools.iter().collect();
    }

    let contains = |field: Option<&str>| {
        field.is_some_and(|text| text.to_lowercase().contains(&needle))
    };

    schools
        .iter()
        .filter(|s| {
            contains(Some(s.school_name.as_str()))
                || contains(s.contact_person.as_deref())
                || contains(s.address.as_deref())
        })
        .collect()
}
