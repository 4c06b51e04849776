#![allow(dead_code)]

use campus_service::groups::{create_group, NewGroup};
use campus_service::journal::create_journal;
use campus_service::model::{Group, Journal, Role, StudentProfile};
use campus_service::records;
use campus_service::store::MemoryStore;
use campus_service::users::{create_user, NewUser};

pub async fn group(store: &MemoryStore, name: &str) -> Group {
    create_group(store, NewGroup::builder().name(name).year(2).build())
        .await
        .unwrap()
}

/// Creates a student user and returns its profile.
pub async fn student(store: &MemoryStore, first: &str, last: &str) -> StudentProfile {
    let new_user = NewUser::builder()
        .first_name(first)
        .last_name(last)
        .email(format!("{}.{}@example.com", first, last).to_lowercase())
        .role(Role::Student)
        .build();
    let created = create_user(store, new_user).await.unwrap();
    records::fetch(store, &created.profile_id.unwrap()).await.unwrap()
}

/// Creates a teacher user and returns the ID of its profile.
pub async fn teacher(store: &MemoryStore, first: &str, last: &str) -> String {
    let new_user = NewUser::builder()
        .first_name(first)
        .last_name(last)
        .email(format!("{}.{}@example.com", first, last).to_lowercase())
        .role(Role::Teacher)
        .build();
    create_user(store, new_user).await.unwrap().profile_id.unwrap()
}

pub async fn journal(store: &MemoryStore, group_id: &str) -> Journal {
    create_journal(store, group_id, "sub-1", "t-1", "2024-spring").await.unwrap()
}
