//! Day sheets of a journal: one editable row per student of the group for a calendar day.

use std::collections::{HashMap, HashSet};
use std::ops::RangeInclusive;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::error::CampusError;
use crate::events::{DomainEvent, EventBus};
use crate::lookup::{self, RosterRow};
use crate::model::{new_id, AttendanceStatus, Group, Journal, JournalDay, JournalEntry, Record};
use crate::records;
use crate::store::DocumentStore;

/// Accepted grade values, bounds included.
pub const GRADE_RANGE: RangeInclusive<i64> = 0..=100;

/// Calendar day of `at`, in the timezone `at` is expressed in.
pub fn normalize_day<Tz: TimeZone>(at: &DateTime<Tz>) -> NaiveDate {
    at.naive_local().date()
}

#[derive(Clone, Debug, PartialEq)]
pub struct DayRow {
    pub student_id: String,
    pub display_name: String,
    pub attendance: AttendanceStatus,
    pub grade: Option<u8>,
    pub comment: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DaySheet {
    pub journal: Journal,
    pub date: NaiveDate,
    pub rows: Vec<DayRow>,
}

/// Entry as submitted by the console, before validation.
#[derive(Clone, Debug, PartialEq)]
pub struct EntryInput {
    pub student_id: String,
    pub attendance: AttendanceStatus,
    pub grade: Option<i64>,
    pub comment: String,
}

/// Proof that the user explicitly agreed to a destructive action.
#[derive(Debug)]
pub struct Confirmed {
    _private: (),
}

/// Source of [`Confirmed`] tokens.
pub struct Confirmation;

impl Confirmation {
    /// Asks `confirm` with `prompt` and hands out a token only on an explicit yes.
    pub fn request(prompt: &str, confirm: impl FnOnce(&str) -> bool) -> Option<Confirmed> {
        if confirm(prompt) {
            Some(Confirmed { _private: () })
        } else {
            tracing::info!(prompt, "Destructive action declined.");
            None
        }
    }
}

/// Merges the roster with the stored entries of the day. Students without an entry show up as
/// present with no grade or comment; stored entries of students no longer in the roster are ignored.
pub fn aggregate(roster: &[RosterRow], stored: Option<&JournalDay>) -> Vec<DayRow> {
    let by_student: HashMap<&str, &JournalEntry> = stored
        .map(|day| day.entries.iter().map(|e| (e.student_id.as_str(), e)).collect())
        .unwrap_or_default();

    roster
        .iter()
        .map(|student| {
            let entry = by_student.get(student.student_id.as_str());
            DayRow {
                student_id: student.student_id.clone(),
                display_name: student.display_name(),
                attendance: entry.map(|e| e.attendance).unwrap_or_default(),
                grade: entry.and_then(|e| e.grade),
                comment: entry.map(|e| e.comment.clone()).unwrap_or_default(),
            }
        })
        .collect()
}

/// Validates every entry up front. Grades outside [`GRADE_RANGE`] and repeated students reject the
/// whole set.
pub fn validate_entries(entries: Vec<EntryInput>) -> Result<Vec<JournalEntry>, CampusError> {
    let mut seen = HashSet::with_capacity(entries.len());
    entries
        .into_iter()
        .map(|entry| {
            if entry.student_id.is_empty() {
                return Err(CampusError::validation("studentId", "is required"));
            }
            if !seen.insert(entry.student_id.clone()) {
                return Err(CampusError::validation(
                    "studentId",
                    format!("{} appears more than once", entry.student_id),
                ));
            }
            let grade = match entry.grade {
                None => None,
                Some(grade) if GRADE_RANGE.contains(&grade) => Some(grade as u8),
                Some(grade) => {
                    return Err(CampusError::validation(
                        "grade",
                        format!(
                            "{} is outside {}..={}",
                            grade,
                            GRADE_RANGE.start(),
                            GRADE_RANGE.end()
                        ),
                    ))
                }
            };
            Ok(JournalEntry {
                student_id: entry.student_id,
                attendance: entry.attendance,
                grade,
                comment: entry.comment.trim().to_owned(),
            })
        })
        .collect()
}

#[tracing::instrument(skip(store))]
pub async fn create_journal(
    store: &dyn DocumentStore,
    group_id: &str,
    subject_id: &str,
    teacher_id: &str,
    semester_id: &str,
) -> Result<Journal, CampusError> {
    if semester_id.trim().is_empty() {
        return Err(CampusError::validation("semesterId", "is required"));
    }
    records::fetch::<Group>(store, group_id).await?;

    let journal = Journal {
        id: new_id(),
        group_id: group_id.to_owned(),
        subject_id: subject_id.to_owned(),
        teacher_id: teacher_id.to_owned(),
        semester_id: semester_id.trim().to_owned(),
    };
    store.commit(vec![records::put(&journal)?]).await?;
    Ok(journal)
}

/// Day sheet of `journal_id` for the calendar day of `at`.
#[tracing::instrument(skip(store, at))]
pub async fn journal_day<Tz: TimeZone>(
    store: &dyn DocumentStore,
    journal_id: &str,
    at: &DateTime<Tz>,
) -> Result<DaySheet, CampusError> {
    let date = normalize_day(at);
    let journal: Journal = records::fetch(store, journal_id).await?;
    let (_, roster) = lookup::group_roster(store, &journal.group_id).await?;
    let stored: Option<JournalDay> = records::fetch_optional(store, &JournalDay::key(journal_id, date)).await?;

    Ok(DaySheet {
        rows: aggregate(&roster, stored.as_ref()),
        journal,
        date,
    })
}

/// Replaces every entry of the day with `entries` and announces grades that changed. Every entry
/// must belong to a current member of the journal's group.
#[tracing::instrument(skip(store, events, at, entries), fields(entries = entries.len()))]
pub async fn save_journal_day<Tz: TimeZone>(
    store: &dyn DocumentStore,
    events: &EventBus,
    journal_id: &str,
    at: &DateTime<Tz>,
    entries: Vec<EntryInput>,
) -> Result<JournalDay, CampusError> {
    let entries = validate_entries(entries)?;
    let date = normalize_day(at);
    let journal: Journal = records::fetch(store, journal_id).await?;
    let group: Group = records::fetch(store, &journal.group_id).await?;
    if let Some(stranger) = entries.iter().find(|e| !group.students.contains(&e.student_id)) {
        return Err(CampusError::validation(
            "studentId",
            format!("{} is not a member of group {}", stranger.student_id, group.name),
        ));
    }

    let key = JournalDay::key(journal_id, date);
    let previous: HashMap<String, Option<u8>> = records::fetch_optional::<JournalDay>(store, &key)
        .await?
        .map(|day| day.entries.into_iter().map(|e| (e.student_id, e.grade)).collect())
        .unwrap_or_default();

    let day = JournalDay {
        id: key,
        journal_id: journal_id.to_owned(),
        date,
        entries,
        updated_at: Some(Utc::now()),
    };
    store.commit(vec![records::put(&day)?]).await?;

    for entry in day.entries.iter() {
        let Some(grade) = entry.grade else { continue };
        if previous.get(&entry.student_id).copied().flatten() != Some(grade) {
            events.publish(DomainEvent::GradeCreated {
                journal_id: journal_id.to_owned(),
                student_id: entry.student_id.clone(),
                date,
                grade,
            });
        }
    }
    Ok(day)
}

/// Deletes every entry of the day. Returns whether there was anything to delete.
#[tracing::instrument(skip(store, at, _confirmed))]
pub async fn remove_journal_entries_for_date<Tz: TimeZone>(
    store: &dyn DocumentStore,
    journal_id: &str,
    at: &DateTime<Tz>,
    _confirmed: Confirmed,
) -> Result<bool, CampusError> {
    records::fetch::<Journal>(store, journal_id).await?;
    let key = JournalDay::key(journal_id, normalize_day(at));
    let existed = store.get(JournalDay::COLLECTION, &key).await?.is_some();
    if existed {
        store.commit(vec![records::delete::<JournalDay>(&key)]).await?;
        tracing::info!(key = %key, "Journal day removed.");
    }
    Ok(existed)
}
