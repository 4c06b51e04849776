use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::Record;
use crate::store::Collection;

/// Attendance and grades of one group in one subject, taught by one teacher during one semester.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Journal {
    pub id: String,
    pub group_id: String,
    pub subject_id: String,
    pub teacher_id: String,
    pub semester_id: String,
}

/// Canonical attendance states. `Excused` is kept apart from `Absent`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub student_id: String,
    pub attendance: AttendanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<u8>,
    #[serde(default)]
    pub comment: String,
}

/// Every entry of a journal for one calendar day. Saving a day replaces the whole document, which
/// keeps (date, student) unique.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JournalDay {
    pub id: String,
    pub journal_id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub entries: Vec<JournalEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for AttendanceStatus {
    fn default() -> Self {
        AttendanceStatus::Present
    }
}

impl JournalDay {
    pub fn key(journal_id: &str, date: NaiveDate) -> String {
        format!("{}#{}", journal_id, date.format("%Y-%m-%d"))
    }
}

impl Record for Journal {
    const COLLECTION: Collection = Collection::Journals;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for JournalDay {
    const COLLECTION: Collection = Collection::JournalEntries;

    fn id(&self) -> &str {
        &self.id
    }
}
