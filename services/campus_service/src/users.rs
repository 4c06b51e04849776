//! Console accounts and their role profiles.

use chrono::Utc;
use typed_builder::TypedBuilder;
use validator::Validate;

use crate::error::CampusError;
use crate::model::{new_id, Record, Role, StudentProfile, StudentStatus, TeacherProfile, User, UserStatus};
use crate::records;
use crate::store::{DocumentStore, FieldChange, Filter, Order, StoreError};

#[derive(Clone, Debug, Validate, TypedBuilder)]
pub struct NewUser {
    #[builder(setter(into))]
    #[validate(length(min = 1, max = 100, message = "is required"))]
    pub first_name: String,
    #[builder(setter(into))]
    #[validate(length(min = 1, max = 100, message = "is required"))]
    pub last_name: String,
    #[builder(setter(into))]
    #[validate(email(message = "is not a valid email address"))]
    pub email: String,
    pub role: Role,
    /// Student card number, ignored for other roles.
    #[builder(default, setter(into))]
    pub card_number: String,
    /// Teacher specialization, ignored for other roles.
    #[builder(default, setter(into))]
    pub specialization: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreatedUser {
    pub user: User,
    /// ID of the student or teacher profile created alongside the user.
    pub profile_id: Option<String>,
}

/// What a [`delete_user`] left behind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeletedUser {
    pub orphaned_profiles: Vec<String>,
}

/// Creates a user awaiting approval together with the profile its role needs.
#[tracing::instrument(skip(store, new_user), fields(email = %new_user.email, role = ?new_user.role))]
pub async fn create_user(store: &dyn DocumentStore, new_user: NewUser) -> Result<CreatedUser, CampusError> {
    new_user.validate()?;
    let email = new_user.email.trim().to_lowercase();

    let existing = store
        .find(User::COLLECTION, &Filter::all().eq("email", email.as_str()).limit(1))
        .await?;
    if !existing.is_empty() {
        return Err(CampusError::AlreadyExists(format!("A user with email {} already exists.", email)));
    }

    let now = Utc::now();
    let user = User {
        id: new_id(),
        first_name: new_user.first_name.trim().to_owned(),
        last_name: new_user.last_name.trim().to_owned(),
        email,
        role: new_user.role,
        status: UserStatus::PendingApproval,
        group_id: String::new(),
        created_at: now,
        updated_at: None,
    };

    let mut ops = vec![records::put(&user)?];
    let profile_id = match user.role {
        Role::Student => {
            let profile = StudentProfile {
                id: new_id(),
                user_id: user.id.clone(),
                group_id: String::new(),
                card_number: new_user.card_number,
                enrollment_date: Some(now.date_naive()),
                birth_date: None,
                status: StudentStatus::Active,
                updated_at: None,
            };
            ops.push(records::put(&profile)?);
            Some(profile.id)
        }
        Role::Teacher => {
            let profile = TeacherProfile {
                id: new_id(),
                user_id: user.id.clone(),
                groups: Vec::new(),
                specialization: new_user.specialization,
                experience: None,
                education: None,
                updated_at: None,
            };
            ops.push(records::put(&profile)?);
            Some(profile.id)
        }
        Role::Admin | Role::PendingApproval => None,
    };

    store.commit(ops).await?;
    tracing::info!(user_id = %user.id, "User created.");
    Ok(CreatedUser { user, profile_id })
}

#[tracing::instrument(skip(store))]
pub async fn update_user_status(store: &dyn DocumentStore, user_id: &str, status: UserStatus) -> Result<(), CampusError> {
    let status = serde_json::to_value(status).map_err(StoreError::from)?;
    store
        .commit(vec![records::update::<User>(
            user_id,
            vec![FieldChange::Set("status".to_owned(), status)],
        )])
        .await?;
    Ok(())
}

#[tracing::instrument(skip(store))]
pub async fn update_user_role(store: &dyn DocumentStore, user_id: &str, role: Role) -> Result<(), CampusError> {
    let role = serde_json::to_value(role).map_err(StoreError::from)?;
    store
        .commit(vec![records::update::<User>(
            user_id,
            vec![FieldChange::Set("role".to_owned(), role)],
        )])
        .await?;
    Ok(())
}

/// Removes the user document only. Profiles and group memberships pointing at the user are left
/// in place and reported.
#[tracing::instrument(skip(store))]
pub async fn delete_user(store: &dyn DocumentStore, user_id: &str) -> Result<DeletedUser, CampusError> {
    records::fetch::<User>(store, user_id).await?;

    let mut orphaned_profiles = Vec::new();
    for student in records::find::<StudentProfile>(store, &Filter::all().eq("userId", user_id)).await? {
        if student.is_assigned() {
            tracing::warn!(
                student_id = %student.id,
                group_id = %student.group_id,
                "Deleted user is still listed in a group (PartialCascadeGap)."
            );
        }
        orphaned_profiles.push(student.id);
    }
    for teacher in records::find::<TeacherProfile>(store, &Filter::all().eq("userId", user_id)).await? {
        orphaned_profiles.push(teacher.id);
    }
    if !orphaned_profiles.is_empty() {
        tracing::warn!(
            profiles = ?orphaned_profiles,
            "Profiles left without user (PartialCascadeGap)."
        );
    }

    store.commit(vec![records::delete::<User>(user_id)]).await?;
    Ok(DeletedUser { orphaned_profiles })
}

pub async fn list_users(store: &dyn DocumentStore, role: Option<Role>) -> Result<Vec<User>, CampusError> {
    let mut filter = Filter::all().order_by("lastName", Order::Ascending);
    if let Some(role) = role {
        filter = filter.eq("role", serde_json::to_value(role).map_err(StoreError::from)?);
    }
    records::find(store, &filter).await
}
