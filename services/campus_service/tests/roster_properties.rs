mod common;

use campus_service::error::CampusError;
use campus_service::events::{DomainEvent, EventBus};
use campus_service::model::{Group, StudentProfile, TeacherProfile, User};
use campus_service::records;
use campus_service::roster::{
    add_student_to_group, assign_teacher_to_group, remove_student_from_group, remove_teacher_from_group,
};
use campus_service::store::{Collection, DocumentStore, Filter, MemoryStore};

async fn assert_membership_symmetric(store: &MemoryStore, student: &StudentProfile) {
    let profile: StudentProfile = records::fetch(store, &student.id).await.unwrap();
    let user: User = records::fetch(store, &profile.user_id).await.unwrap();
    assert_eq!(user.group_id, profile.group_id);

    let groups: Vec<Group> = records::find(store, &Filter::all()).await.unwrap();
    for group in groups {
        let listed = group.students.iter().filter(|id| **id == student.id).count();
        if group.id == profile.group_id {
            assert_eq!(listed, 1, "group {} lists the student {} times", group.id, listed);
        } else {
            assert_eq!(listed, 0, "stale membership in group {}", group.id);
        }
    }
}

#[tokio::test]
async fn membership_stays_symmetric_through_moves_and_removal() {
    let store = MemoryStore::new();
    let (events, _rx) = EventBus::new();
    let first = common::group(&store, "KN-21").await;
    let second = common::group(&store, "KN-22").await;
    let student = common::student(&store, "Olena", "Koval").await;

    add_student_to_group(&store, &events, &first.id, &student.id).await.unwrap();
    assert_membership_symmetric(&store, &student).await;

    add_student_to_group(&store, &events, &second.id, &student.id).await.unwrap();
    assert_membership_symmetric(&store, &student).await;
    let profile: StudentProfile = records::fetch(&store, &student.id).await.unwrap();
    assert_eq!(profile.group_id, second.id);

    remove_student_from_group(&store, &events, &second.id, &student.id).await.unwrap();
    assert_membership_symmetric(&store, &student).await;
    let profile: StudentProfile = records::fetch(&store, &student.id).await.unwrap();
    assert!(profile.group_id.is_empty());
}

#[tokio::test]
async fn adding_twice_lists_the_student_once() {
    let store = MemoryStore::new();
    let (events, mut rx) = EventBus::new();
    let group = common::group(&store, "KN-21").await;
    let student = common::student(&store, "Olena", "Koval").await;

    add_student_to_group(&store, &events, &group.id, &student.id).await.unwrap();
    assert!(rx.try_recv().is_ok());
    add_student_to_group(&store, &events, &group.id, &student.id).await.unwrap();

    assert!(rx.try_recv().is_err(), "re-adding a member announced a change");
    let group: Group = records::fetch(&store, &group.id).await.unwrap();
    assert_eq!(group.students, vec![student.id.clone()]);
    assert_membership_symmetric(&store, &student).await;
}

#[tokio::test]
async fn removing_a_non_member_is_a_no_op() {
    let store = MemoryStore::new();
    let (events, mut rx) = EventBus::new();
    let home = common::group(&store, "KN-21").await;
    let other = common::group(&store, "KN-22").await;
    let student = common::student(&store, "Olena", "Koval").await;
    add_student_to_group(&store, &events, &home.id, &student.id).await.unwrap();
    assert!(rx.try_recv().is_ok());

    remove_student_from_group(&store, &events, &other.id, &student.id).await.unwrap();

    assert!(rx.try_recv().is_err(), "removing a non-member announced a change");
    let other: Group = records::fetch(&store, &other.id).await.unwrap();
    assert!(other.students.is_empty());
    let profile: StudentProfile = records::fetch(&store, &student.id).await.unwrap();
    assert_eq!(profile.group_id, home.id);
    assert_membership_symmetric(&store, &student).await;
}

#[tokio::test]
async fn repeated_teacher_changes_are_announced_once() {
    let store = MemoryStore::new();
    let (events, mut rx) = EventBus::new();
    let group = common::group(&store, "KN-21").await;
    let teacher_id = common::teacher(&store, "Ivan", "Shevchenko").await;

    assign_teacher_to_group(&store, &events, &group.id, &teacher_id).await.unwrap();
    assign_teacher_to_group(&store, &events, &group.id, &teacher_id).await.unwrap();
    remove_teacher_from_group(&store, &events, &group.id, &teacher_id).await.unwrap();
    remove_teacher_from_group(&store, &events, &group.id, &teacher_id).await.unwrap();

    let received: Vec<DomainEvent> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
    assert_eq!(
        received,
        vec![
            DomainEvent::TeacherAssignedToGroup {
                group_id: group.id.clone(),
                teacher_id: teacher_id.clone(),
            },
            DomainEvent::TeacherRemovedFromGroup {
                group_id: group.id.clone(),
                teacher_id: teacher_id.clone(),
            },
        ]
    );
}

#[tokio::test]
async fn missing_student_fails_without_touching_the_group() {
    let store = MemoryStore::new();
    let (events, mut rx) = EventBus::new();
    let group = common::group(&store, "KN-21").await;

    let err = add_student_to_group(&store, &events, &group.id, "s-404").await.unwrap_err();

    assert!(matches!(err, CampusError::NotFound { collection: Collection::Students, .. }));
    let group: Group = records::fetch(&store, &group.id).await.unwrap();
    assert!(group.students.is_empty());
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn missing_group_fails_without_touching_the_student() {
    let store = MemoryStore::new();
    let (events, _rx) = EventBus::new();
    let student = common::student(&store, "Olena", "Koval").await;

    let err = add_student_to_group(&store, &events, "g-404", &student.id).await.unwrap_err();

    assert!(matches!(err, CampusError::NotFound { collection: Collection::Groups, .. }));
    let profile: StudentProfile = records::fetch(&store, &student.id).await.unwrap();
    assert!(profile.group_id.is_empty());
}

#[tokio::test]
async fn moving_a_student_announces_both_sides() {
    let store = MemoryStore::new();
    let (events, mut rx) = EventBus::new();
    let first = common::group(&store, "KN-21").await;
    let second = common::group(&store, "KN-22").await;
    let student = common::student(&store, "Olena", "Koval").await;

    add_student_to_group(&store, &events, &first.id, &student.id).await.unwrap();
    add_student_to_group(&store, &events, &second.id, &student.id).await.unwrap();

    let received: Vec<DomainEvent> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
    assert_eq!(
        received,
        vec![
            DomainEvent::StudentAddedToGroup {
                group_id: first.id.clone(),
                student_id: student.id.clone(),
            },
            DomainEvent::StudentRemovedFromGroup {
                group_id: first.id.clone(),
                student_id: student.id.clone(),
            },
            DomainEvent::StudentAddedToGroup {
                group_id: second.id.clone(),
                student_id: student.id.clone(),
            },
        ]
    );
}

#[tokio::test]
async fn teacher_assignment_is_symmetric_across_groups() {
    let store = MemoryStore::new();
    let (events, _rx) = EventBus::new();
    let first = common::group(&store, "KN-21").await;
    let second = common::group(&store, "KN-22").await;
    let teacher_id = common::teacher(&store, "Ivan", "Shevchenko").await;

    assign_teacher_to_group(&store, &events, &first.id, &teacher_id).await.unwrap();
    assign_teacher_to_group(&store, &events, &second.id, &teacher_id).await.unwrap();
    assign_teacher_to_group(&store, &events, &second.id, &teacher_id).await.unwrap();

    let teacher: TeacherProfile = records::fetch(&store, &teacher_id).await.unwrap();
    assert_eq!(teacher.groups, vec![first.id.clone(), second.id.clone()]);
    let second_group: Group = records::fetch(&store, &second.id).await.unwrap();
    assert_eq!(second_group.teachers, vec![teacher_id.clone()]);

    remove_teacher_from_group(&store, &events, &first.id, &teacher_id).await.unwrap();

    let teacher: TeacherProfile = records::fetch(&store, &teacher_id).await.unwrap();
    assert_eq!(teacher.groups, vec![second.id.clone()]);
    let first_group: Group = records::fetch(&store, &first.id).await.unwrap();
    assert!(first_group.teachers.is_empty());
}

#[tokio::test]
async fn membership_change_is_one_commit() {
    let store = MemoryStore::new();
    let (events, _rx) = EventBus::new();
    let group = common::group(&store, "KN-21").await;
    let student = common::student(&store, "Olena", "Koval").await;

    add_student_to_group(&store, &events, &group.id, &student.id).await.unwrap();

    // Every side carries the same server timestamp, so they were written together.
    let group_doc = store.get(Collection::Groups, &group.id).await.unwrap().unwrap();
    let student_doc = store.get(Collection::Students, &student.id).await.unwrap().unwrap();
    let user_doc = store.get(Collection::Users, &student.user_id).await.unwrap().unwrap();
    assert_eq!(group_doc["updatedAt"], student_doc["updatedAt"]);
    assert_eq!(group_doc["updatedAt"], user_doc["updatedAt"]);
}
