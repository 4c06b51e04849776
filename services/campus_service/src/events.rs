//! Domain events emitted by successful writes.
//!
//! Operations publish to an [`EventBus`] after their primary write committed; consumers such as
//! the [`crate::notifications::Notifier`] run on their own and can never undo that write.

use chrono::NaiveDate;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Clone, Debug, PartialEq)]
pub enum DomainEvent {
    StudentAddedToGroup {
        group_id: String,
        student_id: String,
    },
    StudentRemovedFromGroup {
        group_id: String,
        student_id: String,
    },
    TeacherAssignedToGroup {
        group_id: String,
        teacher_id: String,
    },
    TeacherRemovedFromGroup {
        group_id: String,
        teacher_id: String,
    },
    GradeCreated {
        journal_id: String,
        student_id: String,
        date: NaiveDate,
        grade: u8,
    },
    MessagePosted {
        chat_id: String,
        message_id: String,
        author_id: String,
        /// User IDs of every participant but the author.
        recipients: Vec<String>,
    },
    NewsPublished {
        news_id: String,
        title: String,
    },
}

#[derive(Clone, Debug)]
pub struct EventBus {
    tx: UnboundedSender<DomainEvent>,
}

impl EventBus {
    pub fn new() -> (Self, UnboundedReceiver<DomainEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Fire and forget. A bus nobody listens to anymore only produces a warning.
    pub fn publish(&self, event: DomainEvent) {
        if let Err(err) = self.tx.send(event) {
            tracing::warn!(event = ?err.0, "No consumer for domain event, dropping it.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_without_consumer_is_harmless() {
        let (bus, rx) = EventBus::new();
        drop(rx);

        bus.publish(DomainEvent::NewsPublished {
            news_id: "n-1".to_owned(),
            title: "Exams".to_owned(),
        });
    }

    #[tokio::test]
    async fn events_arrive_in_order() {
        let (bus, mut rx) = EventBus::new();
        let first = DomainEvent::StudentAddedToGroup {
            group_id: "g-1".to_owned(),
            student_id: "s-1".to_owned(),
        };
        let second = DomainEvent::StudentRemovedFromGroup {
            group_id: "g-1".to_owned(),
            student_id: "s-1".to_owned(),
        };

        bus.publish(first.clone());
        bus.publish(second.clone());

        assert_eq!(rx.recv().await, Some(first));
        assert_eq!(rx.recv().await, Some(second));
    }
}
