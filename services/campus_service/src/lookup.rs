//! Resolution of membership ID lists into full records.

use std::collections::{HashMap, HashSet};

use crate::error::CampusError;
use crate::model::{Group, Record, StudentProfile, StudentStatus, User};
use crate::records;
use crate::store::{DocumentStore, MAX_IDS_PER_LOOKUP};

/// Display row of a roster: the student profile joined with its user.
#[derive(Clone, Debug, PartialEq)]
pub struct RosterRow {
    pub student_id: String,
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub card_number: String,
    pub status: StudentStatus,
}

impl RosterRow {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.last_name, self.first_name).trim().to_owned()
    }
}

/// Fetches the records of `ids`, chunked to the store's lookup limit. Duplicates are looked up
/// once and unknown IDs are skipped. An empty list issues no query at all.
pub async fn fetch_by_ids<R: Record>(store: &dyn DocumentStore, ids: &[String]) -> Result<Vec<R>, CampusError> {
    let mut seen = HashSet::with_capacity(ids.len());
    let unique: Vec<String> = ids.iter().filter(|id| seen.insert(id.as_str())).cloned().collect();
    if unique.is_empty() {
        return Ok(Vec::new());
    }

    let mut records = Vec::with_capacity(unique.len());
    for chunk in unique.chunks(MAX_IDS_PER_LOOKUP) {
        for document in store.get_many(R::COLLECTION, chunk).await? {
            records.push(R::from_document(document)?);
        }
    }

    if records.len() < unique.len() {
        tracing::debug!(
            requested = unique.len(),
            found = records.len(),
            collection = %R::COLLECTION,
            "Some IDs did not resolve."
        );
    }
    Ok(records)
}

pub async fn get_students_in_group_details(
    store: &dyn DocumentStore,
    student_ids: &[String],
) -> Result<Vec<StudentProfile>, CampusError> {
    fetch_by_ids(store, student_ids).await
}

/// Joins student IDs → student profiles → users, sorted by last then first name.
///
/// Profiles whose user is gone are kept with empty names and logged.
pub async fn resolve_roster(store: &dyn DocumentStore, student_ids: &[String]) -> Result<Vec<RosterRow>, CampusError> {
    let students = get_students_in_group_details(store, student_ids).await?;
    let user_ids: Vec<String> = students.iter().map(|s| s.user_id.clone()).collect();
    let users: HashMap<String, User> = fetch_by_ids::<User>(store, &user_ids)
        .await?
        .into_iter()
        .map(|user| (user.id.clone(), user))
        .collect();

    let mut rows: Vec<RosterRow> = students
        .into_iter()
        .map(|student| {
            let user = users.get(&student.user_id);
            if user.is_none() {
                tracing::warn!(
                    student_id = %student.id,
                    user_id = %student.user_id,
                    "Student profile without user (PartialCascadeGap)."
                );
            }
            RosterRow {
                first_name: user.map(|u| u.first_name.clone()).unwrap_or_default(),
                last_name: user.map(|u| u.last_name.clone()).unwrap_or_default(),
                email: user.map(|u| u.email.clone()).unwrap_or_default(),
                student_id: student.id,
                user_id: student.user_id,
                card_number: student.card_number,
                status: student.status,
            }
        })
        .collect();

    rows.sort_by(|a, b| (&a.last_name, &a.first_name, &a.student_id).cmp(&(&b.last_name, &b.first_name, &b.student_id)));
    Ok(rows)
}

pub async fn group_roster(store: &dyn DocumentStore, group_id: &str) -> Result<(Group, Vec<RosterRow>), CampusError> {
    let group: Group = records::fetch(store, group_id).await?;
    let rows = resolve_roster(store, &group.students).await?;
    Ok((group, rows))
}
