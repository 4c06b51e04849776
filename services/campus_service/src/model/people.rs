use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::Record;
use crate::store::Collection;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Teacher,
    Admin,
    PendingApproval,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    Suspended,
    PendingApproval,
}

/// Identity record shared by every role.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    /// Mirror of the student profile's group, kept in sync by the roster operations. Empty when
    /// the user is not a student or not in any group.
    #[serde(default)]
    pub group_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StudentStatus {
    Active,
    AcademicLeave,
    Expelled,
    Graduated,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    pub id: String,
    pub user_id: String,
    /// Empty when the student is not in any group.
    #[serde(default)]
    pub group_id: String,
    #[serde(default)]
    pub card_number: String,
    #[serde(default)]
    pub enrollment_date: Option<NaiveDate>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    pub status: StudentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeacherProfile {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub specialization: String,
    #[serde(default)]
    pub experience: Option<u32>,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl StudentProfile {
    pub fn is_assigned(&self) -> bool {
        !self.group_id.is_empty()
    }
}

impl Record for User {
    const COLLECTION: Collection = Collection::Users;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for StudentProfile {
    const COLLECTION: Collection = Collection::Students;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for TeacherProfile {
    const COLLECTION: Collection = Collection::Teachers;

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    #[test]
    fn student_without_group_deserializes_as_unassigned() {
        let doc = json!({
            "id": "s-1",
            "userId": "u-1",
            "cardNumber": "0042",
            "status": "active"
        });
        let Value::Object(doc) = doc else { unreachable!() };

        let student = StudentProfile::from_document(doc).unwrap();

        assert_eq!(student.group_id, "");
        assert!(!student.is_assigned());
    }

    #[test]
    fn roles_use_snake_case() {
        assert_eq!(serde_json::to_value(Role::PendingApproval).unwrap(), json!("pending_approval"));
        assert_eq!(serde_json::to_value(UserStatus::Suspended).unwrap(), json!("suspended"));
    }
}
