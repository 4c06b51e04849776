use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::Record;
use crate::store::Collection;

/// One recurring slot of a group timetable. `day_of_week` runs from 1 (Monday) to 7 (Sunday).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: String,
    pub group_id: String,
    pub subject_id: String,
    pub teacher_id: String,
    pub day_of_week: u8,
    #[serde(with = "hh_mm")]
    pub start_time: NaiveTime,
    #[serde(with = "hh_mm")]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub room: String,
    #[serde(default = "weekly_default")]
    pub weekly: bool,
}

fn weekly_default() -> bool {
    true
}

impl Record for Lesson {
    const COLLECTION: Collection = Collection::Schedules;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Times are stored as `HH:MM`.
pub(crate) mod hh_mm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}
