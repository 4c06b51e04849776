//! Group membership of students and teachers.
//!
//! Each operation commits both sides of the membership in one batch through [`crate::relation`],
//! then announces the change on the event bus. Requests that leave the membership as it was
//! announce nothing.

use crate::error::CampusError;
use crate::events::{DomainEvent, EventBus};
use crate::relation::{self, STUDENT_GROUP, TEACHER_GROUP};
use crate::store::DocumentStore;

/// Puts the student into the group, moving them out of their previous group if any.
#[tracing::instrument(skip(store, events))]
pub async fn add_student_to_group(
    store: &dyn DocumentStore,
    events: &EventBus,
    group_id: &str,
    student_id: &str,
) -> Result<(), CampusError> {
    let outcome = relation::link(store, &STUDENT_GROUP, group_id, student_id).await?;

    if let Some(previous) = outcome.previous_parent {
        events.publish(DomainEvent::StudentRemovedFromGroup {
            group_id: previous,
            student_id: student_id.to_owned(),
        });
    }
    if outcome.changed {
        events.publish(DomainEvent::StudentAddedToGroup {
            group_id: group_id.to_owned(),
            student_id: student_id.to_owned(),
        });
    }
    Ok(())
}

#[tracing::instrument(skip(store, events))]
pub async fn remove_student_from_group(
    store: &dyn DocumentStore,
    events: &EventBus,
    group_id: &str,
    student_id: &str,
) -> Result<(), CampusError> {
    if relation::unlink(store, &STUDENT_GROUP, group_id, student_id).await? {
        events.publish(DomainEvent::StudentRemovedFromGroup {
            group_id: group_id.to_owned(),
            student_id: student_id.to_owned(),
        });
    }
    Ok(())
}

#[tracing::instrument(skip(store, events))]
pub async fn assign_teacher_to_group(
    store: &dyn DocumentStore,
    events: &EventBus,
    group_id: &str,
    teacher_id: &str,
) -> Result<(), CampusError> {
    if relation::link(store, &TEACHER_GROUP, group_id, teacher_id).await?.changed {
        events.publish(DomainEvent::TeacherAssignedToGroup {
            group_id: group_id.to_owned(),
            teacher_id: teacher_id.to_owned(),
        });
    }
    Ok(())
}

#[tracing::instrument(skip(store, events))]
pub async fn remove_teacher_from_group(
    store: &dyn DocumentStore,
    events: &EventBus,
    group_id: &str,
    teacher_id: &str,
) -> Result<(), CampusError> {
    if relation::unlink(store, &TEACHER_GROUP, group_id, teacher_id).await? {
        events.publish(DomainEvent::TeacherRemovedFromGroup {
            group_id: group_id.to_owned(),
            teacher_id: teacher_id.to_owned(),
        });
    }
    Ok(())
}
