use typed_builder::TypedBuilder;
use validator::Validate;

use crate::error::CampusError;
use crate::model::{new_id, Group, StudentProfile};
use crate::records::{self, string};
use crate::store::{DocumentStore, FieldChange, Filter, Order};

#[derive(Clone, Debug, Validate, TypedBuilder)]
pub struct NewGroup {
    #[builder(setter(into))]
    #[validate(length(min = 1, max = 50, message = "is required"))]
    pub name: String,
    #[validate(range(min = 1, max = 6, message = "must be between 1 and 6"))]
    pub year: u16,
    #[builder(default, setter(into))]
    pub specialization: String,
    #[builder(default, setter(strip_option, into))]
    pub curator_id: Option<String>,
}

/// Fields of a group an administrator may edit. `None` leaves a field untouched.
#[derive(Clone, Debug, Default, Validate)]
pub struct GroupChanges {
    #[validate(length(min = 1, max = 50, message = "is required"))]
    pub name: Option<String>,
    #[validate(range(min = 1, max = 6, message = "must be between 1 and 6"))]
    pub year: Option<u16>,
    pub specialization: Option<String>,
    /// An empty string removes the curator.
    pub curator_id: Option<String>,
}

/// References to a deleted group that are still around.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeletedGroup {
    pub orphaned_students: Vec<String>,
    pub orphaned_teachers: Vec<String>,
}

#[tracing::instrument(skip(store, new_group), fields(name = %new_group.name))]
pub async fn create_group(store: &dyn DocumentStore, new_group: NewGroup) -> Result<Group, CampusError> {
    new_group.validate()?;

    let group = Group {
        id: new_id(),
        name: new_group.name.trim().to_owned(),
        year: new_group.year,
        specialization: new_group.specialization,
        curator_id: new_group.curator_id.filter(|id| !id.is_empty()),
        students: Vec::new(),
        teachers: Vec::new(),
        schedule_id: None,
        updated_at: None,
    };
    store.commit(vec![records::put(&group)?]).await?;
    Ok(group)
}

#[tracing::instrument(skip(store))]
pub async fn update_group(store: &dyn DocumentStore, group_id: &str, changes: GroupChanges) -> Result<(), CampusError> {
    changes.validate()?;

    let mut field_changes = Vec::new();
    if let Some(name) = changes.name {
        field_changes.push(FieldChange::Set("name".to_owned(), string(name.trim())));
    }
    if let Some(year) = changes.year {
        field_changes.push(FieldChange::Set("year".to_owned(), year.into()));
    }
    if let Some(specialization) = changes.specialization {
        field_changes.push(FieldChange::Set("specialization".to_owned(), string(&specialization)));
    }
    match changes.curator_id.as_deref() {
        Some("") => field_changes.push(FieldChange::Clear("curatorId".to_owned())),
        Some(curator_id) => field_changes.push(FieldChange::Set("curatorId".to_owned(), string(curator_id))),
        None => {}
    }
    if field_changes.is_empty() {
        return Ok(());
    }

    store.commit(vec![records::update::<Group>(group_id, field_changes)]).await?;
    Ok(())
}

/// Deletes the group document. Members keep pointing at it; those references are reported.
#[tracing::instrument(skip(store))]
pub async fn delete_group(store: &dyn DocumentStore, group_id: &str) -> Result<DeletedGroup, CampusError> {
    let group: Group = records::fetch(store, group_id).await?;

    let mut orphaned_students = group.students.clone();
    for student in records::find::<StudentProfile>(store, &Filter::all().eq("groupId", group_id)).await? {
        if !orphaned_students.contains(&student.id) {
            orphaned_students.push(student.id);
        }
    }
    let report = DeletedGroup {
        orphaned_students,
        orphaned_teachers: group.teachers,
    };
    if !report.orphaned_students.is_empty() || !report.orphaned_teachers.is_empty() {
        tracing::warn!(
            students = ?report.orphaned_students,
            teachers = ?report.orphaned_teachers,
            "Members still reference the deleted group (PartialCascadeGap)."
        );
    }

    store.commit(vec![records::delete::<Group>(group_id)]).await?;
    Ok(report)
}

pub async fn list_groups(store: &dyn DocumentStore) -> Result<Vec<Group>, CampusError> {
    records::find(store, &Filter::all().order_by("name", Order::Ascending)).await
}
