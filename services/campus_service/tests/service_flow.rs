use std::sync::Arc;

use campus_service::context::Context;
use campus_service::notifications::Notifier;
use campus_service::pb::campus_service_server::CampusService;
use campus_service::pb::*;
use campus_service::svc::CampusServiceImpl;
use campus_service::store::{DocumentStore, MemoryStore};
use tonic::{Code, Request};

async fn create_student(service: &CampusServiceImpl, first: &str, last: &str) -> CreateUserOutput {
    service
        .create_user(Request::new(CreateUserInput {
            first_name: first.to_owned(),
            last_name: last.to_owned(),
            email: format!("{}.{}@example.com", first, last).to_lowercase(),
            role: Role::Student as i32,
            card_number: "KB-0001".to_owned(),
            specialization: String::new(),
        }))
        .await
        .unwrap()
        .into_inner()
}

async fn create_group(service: &CampusServiceImpl, name: &str) -> String {
    service
        .create_group(Request::new(CreateGroupInput {
            name: name.to_owned(),
            year: 1,
            specialization: "Computer Science".to_owned(),
            curator_id: String::new(),
        }))
        .await
        .unwrap()
        .into_inner()
        .group_id
}

#[tokio::test]
async fn roster_change_reaches_the_students_notifications() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let (ctx, events) = Context::with_store(store.clone());
    let service = CampusServiceImpl::new(ctx);
    let notifier = Notifier::new(store.clone()).spawn(events);

    let student = create_student(&service, "Olena", "Koval").await;
    let group_id = create_group(&service, "KN-21").await;
    service
        .add_student_to_group(Request::new(MembershipInput {
            group_id: group_id.clone(),
            member_id: student.profile_id.clone(),
        }))
        .await
        .unwrap();

    let roster = service
        .describe_roster(Request::new(DescribeRosterInput {
            group_id: group_id.clone(),
        }))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(roster.students.len(), 1);
    assert_eq!(roster.students[0].display_name, "Koval Olena");

    // Closing the bus lets the notifier finish the queued events.
    drop(service);
    notifier.await.unwrap();

    let (ctx, _events) = Context::with_store(store);
    let service = CampusServiceImpl::new(ctx);
    let notifications = service
        .list_notifications(Request::new(ListNotificationsInput {
            recipient_id: student.user_id.clone(),
            unread_only: true,
        }))
        .await
        .unwrap()
        .into_inner()
        .notifications;
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, "roster");
    assert!(notifications[0].body.contains("KN-21"));

    service
        .mark_notification_read(Request::new(MarkNotificationReadInput {
            notification_id: notifications[0].notification_id.clone(),
        }))
        .await
        .unwrap();
    let unread = service
        .list_notifications(Request::new(ListNotificationsInput {
            recipient_id: student.user_id,
            unread_only: true,
        }))
        .await
        .unwrap()
        .into_inner()
        .notifications;
    assert!(unread.is_empty());
}

#[tokio::test]
async fn unknown_members_map_to_not_found() {
    let (ctx, _events) = Context::with_store(Arc::new(MemoryStore::new()));
    let service = CampusServiceImpl::new(ctx);
    let group_id = create_group(&service, "KN-21").await;

    let status = service
        .add_student_to_group(Request::new(MembershipInput {
            group_id,
            member_id: "s-404".to_owned(),
        }))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::NotFound);
}

#[tokio::test]
async fn blank_membership_ids_are_invalid() {
    let (ctx, _events) = Context::with_store(Arc::new(MemoryStore::new()));
    let service = CampusServiceImpl::new(ctx);

    let status = service
        .assign_teacher_to_group(Request::new(MembershipInput {
            group_id: String::new(),
            member_id: "t-1".to_owned(),
        }))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::InvalidArgument);
}

#[tokio::test]
async fn duplicate_email_is_already_exists() {
    let (ctx, _events) = Context::with_store(Arc::new(MemoryStore::new()));
    let service = CampusServiceImpl::new(ctx);
    create_student(&service, "Olena", "Koval").await;

    let status = service
        .create_user(Request::new(CreateUserInput {
            first_name: "Olena".to_owned(),
            last_name: "Koval".to_owned(),
            email: "OLENA.KOVAL@example.com".to_owned(),
            role: Role::Student as i32,
            card_number: String::new(),
            specialization: String::new(),
        }))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::AlreadyExists);
}
