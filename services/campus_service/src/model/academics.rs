use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Record;
use crate::store::Collection;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    pub year: u16,
    #[serde(default)]
    pub specialization: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curator_id: Option<String>,
    /// Student profile IDs.
    #[serde(default)]
    pub students: Vec<String>,
    /// Teacher profile IDs.
    #[serde(default)]
    pub teachers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub credits: u16,
    #[serde(default)]
    pub hours: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
}

impl Record for Group {
    const COLLECTION: Collection = Collection::Groups;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Subject {
    const COLLECTION: Collection = Collection::Subjects;

    fn id(&self) -> &str {
        &self.id
    }
}
