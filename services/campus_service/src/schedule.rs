//! Weekly timetable of a group.

use chrono::NaiveTime;

use crate::error::CampusError;
use crate::model::schedule::hh_mm;
use crate::model::{new_id, Group, Lesson};
use crate::records;
use crate::store::{DocumentStore, Filter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewLesson {
    pub group_id: String,
    pub subject_id: String,
    pub teacher_id: String,
    pub day_of_week: u8,
    /// `HH:MM`
    pub start_time: String,
    /// `HH:MM`
    pub end_time: String,
    pub room: String,
    pub weekly: bool,
}

fn parse_time(field: &str, raw: &str) -> Result<NaiveTime, CampusError> {
    NaiveTime::parse_from_str(raw.trim(), hh_mm::FORMAT)
        .map_err(|_| CampusError::validation(field, format!("'{}' is not a HH:MM time", raw)))
}

#[tracing::instrument(skip(store))]
pub async fn create_lesson(store: &dyn DocumentStore, new_lesson: NewLesson) -> Result<Lesson, CampusError> {
    if !(1..=7).contains(&new_lesson.day_of_week) {
        return Err(CampusError::validation("dayOfWeek", "must be between 1 and 7"));
    }
    let start_time = parse_time("startTime", &new_lesson.start_time)?;
    let end_time = parse_time("endTime", &new_lesson.end_time)?;
    if start_time >= end_time {
        return Err(CampusError::validation("endTime", "must be after startTime"));
    }
    records::fetch::<Group>(store, &new_lesson.group_id).await?;

    let lesson = Lesson {
        id: new_id(),
        group_id: new_lesson.group_id,
        subject_id: new_lesson.subject_id,
        teacher_id: new_lesson.teacher_id,
        day_of_week: new_lesson.day_of_week,
        start_time,
        end_time,
        room: new_lesson.room,
        weekly: new_lesson.weekly,
    };
    store.commit(vec![records::put(&lesson)?]).await?;
    Ok(lesson)
}

/// Lessons of the group, by day of week and then start time.
pub async fn list_lessons_for_group(store: &dyn DocumentStore, group_id: &str) -> Result<Vec<Lesson>, CampusError> {
    let mut lessons: Vec<Lesson> = records::find(store, &Filter::all().eq("groupId", group_id)).await?;
    lessons.sort_by_key(|lesson| (lesson.day_of_week, lesson.start_time));
    Ok(lessons)
}
