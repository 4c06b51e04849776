//! Per-user notifications derived from domain events.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use crate::error::CampusError;
use crate::events::DomainEvent;
use crate::model::{
    new_id, Group, Journal, Notification, NotificationKind, Record, StudentProfile, Subject, TeacherProfile, User,
    UserStatus,
};
use crate::records;
use crate::store::{DocumentStore, FieldChange, Filter, Order, StoreError, WriteOp};

/// Notifications written per batch when fanning out to many users.
pub const FAN_OUT_BATCH: usize = 25;

/// Consumes domain events and writes the matching notifications.
///
/// Runs detached from the operations that emitted the events: a failure here is logged and the
/// event dropped, the original write stays.
pub struct Notifier {
    store: Arc<dyn DocumentStore>,
}

impl Notifier {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn spawn(self, events: UnboundedReceiver<DomainEvent>) -> JoinHandle<()> {
        tokio::spawn(self.run(events))
    }

    /// Handles events until every [`crate::events::EventBus`] handle is gone.
    pub async fn run(self, mut events: UnboundedReceiver<DomainEvent>) {
        while let Some(event) = events.recv().await {
            match self.handle(&event).await {
                Ok(written) => tracing::debug!(?event, written, "Notifications written."),
                Err(err) => tracing::warn!(?event, error = %err, "Failed to notify about event."),
            }
        }
        tracing::info!("Event bus closed, notifier stopped.");
    }

    /// Writes the notifications for one event and returns how many were written.
    pub async fn handle(&self, event: &DomainEvent) -> Result<usize, CampusError> {
        let store = self.store.as_ref();
        let (recipients, kind, title, body) = match event {
            DomainEvent::StudentAddedToGroup { group_id, student_id } => {
                let recipients = student_user(store, student_id).await?;
                let body = format!("You were added to group {}.", group_name(store, group_id).await?);
                (recipients, NotificationKind::Roster, "Group membership".to_owned(), body)
            }
            DomainEvent::StudentRemovedFromGroup { group_id, student_id } => {
                let recipients = student_user(store, student_id).await?;
                let body = format!("You were removed from group {}.", group_name(store, group_id).await?);
                (recipients, NotificationKind::Roster, "Group membership".to_owned(), body)
            }
            DomainEvent::TeacherAssignedToGroup { group_id, teacher_id } => {
                let recipients = teacher_user(store, teacher_id).await?;
                let body = format!("You now teach group {}.", group_name(store, group_id).await?);
                (recipients, NotificationKind::Roster, "Teaching assignment".to_owned(), body)
            }
            DomainEvent::TeacherRemovedFromGroup { group_id, teacher_id } => {
                let recipients = teacher_user(store, teacher_id).await?;
                let body = format!("You no longer teach group {}.", group_name(store, group_id).await?);
                (recipients, NotificationKind::Roster, "Teaching assignment".to_owned(), body)
            }
            DomainEvent::GradeCreated {
                journal_id,
                student_id,
                date,
                grade,
            } => {
                let recipients = student_user(store, student_id).await?;
                let subject = match records::fetch_optional::<Journal>(store, journal_id).await? {
                    Some(journal) => records::fetch_optional::<Subject>(store, &journal.subject_id)
                        .await?
                        .map(|subject| subject.name),
                    None => None,
                };
                let body = match subject {
                    Some(subject) => format!("You received {} in {} for {}.", grade, subject, date),
                    None => format!("You received {} for {}.", grade, date),
                };
                (recipients, NotificationKind::Grade, "New grade".to_owned(), body)
            }
            DomainEvent::MessagePosted { recipients, .. } => (
                recipients.clone(),
                NotificationKind::Message,
                "New message".to_owned(),
                "You have a new chat message.".to_owned(),
            ),
            DomainEvent::NewsPublished { title, .. } => {
                let active = store
                    .find(User::COLLECTION, &Filter::all().eq("status", status_value(UserStatus::Active)?))
                    .await?;
                let recipients = active
                    .iter()
                    .filter_map(|user| user.get("id").and_then(|id| id.as_str()).map(str::to_owned))
                    .collect::<Vec<String>>();
                (recipients, NotificationKind::News, "News".to_owned(), title.clone())
            }
        };

        let created_at = Utc::now();
        let mut written = 0;
        for chunk in recipients.chunks(FAN_OUT_BATCH) {
            let ops = chunk
                .iter()
                .map(|recipient_id| {
                    records::put(&Notification {
                        id: new_id(),
                        recipient_id: recipient_id.clone(),
                        kind,
                        title: title.clone(),
                        body: body.clone(),
                        read: false,
                        created_at,
                    })
                })
                .collect::<Result<Vec<WriteOp>, CampusError>>()?;
            store.commit(ops).await?;
            written += chunk.len();
        }
        Ok(written)
    }
}

async fn student_user(store: &dyn DocumentStore, student_id: &str) -> Result<Vec<String>, CampusError> {
    match records::fetch_optional::<StudentProfile>(store, student_id).await? {
        Some(student) => Ok(vec![student.user_id]),
        None => {
            tracing::warn!(student_id, "No student profile to notify (PartialCascadeGap).");
            Ok(Vec::new())
        }
    }
}

async fn teacher_user(store: &dyn DocumentStore, teacher_id: &str) -> Result<Vec<String>, CampusError> {
    match records::fetch_optional::<TeacherProfile>(store, teacher_id).await? {
        Some(teacher) => Ok(vec![teacher.user_id]),
        None => {
            tracing::warn!(teacher_id, "No teacher profile to notify (PartialCascadeGap).");
            Ok(Vec::new())
        }
    }
}

async fn group_name(store: &dyn DocumentStore, group_id: &str) -> Result<String, CampusError> {
    Ok(records::fetch_optional::<Group>(store, group_id)
        .await?
        .map(|group| group.name)
        .unwrap_or_else(|| group_id.to_owned()))
}

fn status_value(status: UserStatus) -> Result<serde_json::Value, StoreError> {
    Ok(serde_json::to_value(status)?)
}

/// Newest first.
pub async fn list_notifications(
    store: &dyn DocumentStore,
    recipient_id: &str,
    unread_only: bool,
) -> Result<Vec<Notification>, CampusError> {
    let mut filter = Filter::all()
        .eq("recipientId", recipient_id)
        .order_by("createdAt", Order::Descending);
    if unread_only {
        filter = filter.eq("read", false);
    }
    records::find(store, &filter).await
}

pub async fn mark_notification_read(store: &dyn DocumentStore, notification_id: &str) -> Result<(), CampusError> {
    store
        .commit(vec![records::update::<Notification>(
            notification_id,
            vec![FieldChange::Set("read".to_owned(), true.into())],
        )])
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::model::{Role, StudentStatus};
    use crate::store::MemoryStore;

    fn user(id: &str, status: UserStatus) -> User {
        User {
            id: id.to_owned(),
            first_name: "Olena".to_owned(),
            last_name: "Koval".to_owned(),
            email: format!("{id}@example.com"),
            role: Role::Student,
            status,
            group_id: String::new(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn new_store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::new())
    }

    async fn seed_student(store: &MemoryStore) {
        let student = StudentProfile {
            id: "s-1".to_owned(),
            user_id: "u-1".to_owned(),
            group_id: String::new(),
            card_number: String::new(),
            enrollment_date: None,
            birth_date: None,
            status: StudentStatus::Active,
            updated_at: None,
        };
        store
            .commit(vec![
                records::put(&user("u-1", UserStatus::Active)).unwrap(),
                records::put(&student).unwrap(),
            ])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn grade_notifies_the_students_user() {
        let store = new_store();
        seed_student(&store).await;
        let notifier = Notifier::new(store.clone());

        let written = notifier
            .handle(&DomainEvent::GradeCreated {
                journal_id: "j-404".to_owned(),
                student_id: "s-1".to_owned(),
                date: NaiveDate::from_ymd(2024, 3, 1),
                grade: 95,
            })
            .await
            .unwrap();

        assert_eq!(written, 1);
        let notifications = list_notifications(store.as_ref(), "u-1", true).await.unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::Grade);
        assert_eq!(notifications[0].body, "You received 95 for 2024-03-01.");
    }

    #[tokio::test]
    async fn missing_profile_writes_nothing() {
        let store = new_store();
        let notifier = Notifier::new(store.clone());

        let written = notifier
            .handle(&DomainEvent::StudentAddedToGroup {
                group_id: "g-1".to_owned(),
                student_id: "s-404".to_owned(),
            })
            .await
            .unwrap();

        assert_eq!(written, 0);
    }

    #[tokio::test]
    async fn news_fans_out_to_active_users_only() {
        let store = new_store();
        let mut ops = Vec::new();
        for idx in 0..30 {
            ops.push(records::put(&user(&format!("u-{idx}"), UserStatus::Active)).unwrap());
        }
        ops.push(records::put(&user("u-suspended", UserStatus::Suspended)).unwrap());
        store.commit(ops).await.unwrap();

        let written = Notifier::new(store.clone())
            .handle(&DomainEvent::NewsPublished {
                news_id: "n-1".to_owned(),
                title: "Exam week".to_owned(),
            })
            .await
            .unwrap();

        assert_eq!(written, 30);
        assert!(list_notifications(store.as_ref(), "u-suspended", false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn read_notifications_drop_out_of_unread() {
        let store = new_store();
        seed_student(&store).await;
        Notifier::new(store.clone())
            .handle(&DomainEvent::MessagePosted {
                chat_id: "c-1".to_owned(),
                message_id: "m-1".to_owned(),
                author_id: "u-2".to_owned(),
                recipients: vec!["u-1".to_owned()],
            })
            .await
            .unwrap();
        let unread = list_notifications(store.as_ref(), "u-1", true).await.unwrap();

        mark_notification_read(store.as_ref(), &unread[0].id).await.unwrap();

        assert!(list_notifications(store.as_ref(), "u-1", true).await.unwrap().is_empty());
        assert_eq!(list_notifications(store.as_ref(), "u-1", false).await.unwrap().len(), 1);
    }
}
