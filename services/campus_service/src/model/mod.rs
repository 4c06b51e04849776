//! Canonical schema of every document the console stores.
//!
//! Field names are camelCase in storage. Role-specific data lives in separate profile documents
//! that point back to their user through `userId`.

pub mod academics;
pub mod journal;
pub mod messaging;
pub mod people;
pub mod schedule;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub use academics::{Group, Subject};
pub use journal::{AttendanceStatus, Journal, JournalDay, JournalEntry};
pub use messaging::{Chat, Comment, Message, News, Notification, NotificationKind};
pub use people::{Role, StudentProfile, StudentStatus, TeacherProfile, User, UserStatus};
pub use schedule::Lesson;

use crate::store::{Collection, Document, StoreError};

/// A typed document of one collection.
pub trait Record: Serialize + DeserializeOwned {
    const COLLECTION: Collection;

    fn id(&self) -> &str;

    fn to_document(&self) -> Result<Document, StoreError> {
        match serde_json::to_value(self)? {
            Value::Object(document) => Ok(document),
            other => Err(<serde_json::Error as serde::ser::Error>::custom(format!(
                "{} record serialized to a non-object: {}",
                Self::COLLECTION,
                other
            ))
            .into()),
        }
    }

    fn from_document(document: Document) -> Result<Self, StoreError> {
        Ok(serde_json::from_value(Value::Object(document))?)
    }
}

/// Generates a fresh document ID.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
