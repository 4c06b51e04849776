use typed_builder::TypedBuilder;
use validator::Validate;

use crate::error::CampusError;
use crate::lookup;
use crate::model::{new_id, Group, Record, Subject, TeacherProfile};
use crate::records;
use crate::store::{DocumentStore, Filter, Order};

#[derive(Clone, Debug, Validate, TypedBuilder)]
pub struct NewSubject {
    #[builder(setter(into))]
    #[validate(length(min = 1, max = 100, message = "is required"))]
    pub name: String,
    #[builder(default)]
    #[validate(range(max = 30, message = "must not exceed 30"))]
    pub credits: u16,
    #[builder(default)]
    pub hours: u16,
    #[builder(default, setter(strip_option, into))]
    pub teacher_id: Option<String>,
    #[builder(default)]
    pub groups: Vec<String>,
}

/// Creates a subject. The teacher and every group, when given, must exist.
#[tracing::instrument(skip(store, new_subject), fields(name = %new_subject.name))]
pub async fn create_subject(store: &dyn DocumentStore, new_subject: NewSubject) -> Result<Subject, CampusError> {
    new_subject.validate()?;

    if let Some(teacher_id) = new_subject.teacher_id.as_deref() {
        records::fetch::<TeacherProfile>(store, teacher_id).await?;
    }
    let found: Vec<Group> = lookup::fetch_by_ids(store, &new_subject.groups).await?;
    if let Some(missing) = new_subject.groups.iter().find(|id| !found.iter().any(|g| &g.id == *id)) {
        return Err(CampusError::not_found(Group::COLLECTION, missing.clone()));
    }

    let subject = Subject {
        id: new_id(),
        name: new_subject.name.trim().to_owned(),
        credits: new_subject.credits,
        hours: new_subject.hours,
        teacher_id: new_subject.teacher_id,
        groups: new_subject.groups,
    };
    store.commit(vec![records::put(&subject)?]).await?;
    Ok(subject)
}

pub async fn list_subjects_for_teacher(store: &dyn DocumentStore, teacher_id: &str) -> Result<Vec<Subject>, CampusError> {
    records::find(
        store,
        &Filter::all().eq("teacherId", teacher_id).order_by("name", Order::Ascending),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::groups::{create_group, NewGroup};
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn unknown_group_is_rejected() {
        let store = MemoryStore::new();
        let subject = NewSubject::builder()
            .name("Databases")
            .groups(vec!["g-404".to_owned()])
            .build();

        let err = create_subject(&store, subject).await.unwrap_err();

        assert!(matches!(err, CampusError::NotFound { ref id, .. } if id == "g-404"));
    }

    #[tokio::test]
    async fn subjects_are_listed_per_teacher() {
        let store = MemoryStore::new();
        let group = create_group(&store, NewGroup::builder().name("SE-21").year(2).build())
            .await
            .unwrap();
        let teacher = TeacherProfile {
            id: "t-1".to_owned(),
            user_id: "u-1".to_owned(),
            groups: Vec::new(),
            specialization: String::new(),
            experience: None,
            education: None,
            updated_at: None,
        };
        store.commit(vec![records::put(&teacher).unwrap()]).await.unwrap();

        for name in ["Operating Systems", "Algorithms"] {
            let subject = NewSubject::builder()
                .name(name)
                .credits(5)
                .teacher_id("t-1")
                .groups(vec![group.id.clone()])
                .build();
            create_subject(&store, subject).await.unwrap();
        }
        create_subject(&store, NewSubject::builder().name("Physics").build())
            .await
            .unwrap();

        let names: Vec<String> = list_subjects_for_teacher(&store, "t-1")
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();

        assert_eq!(names, vec!["Algorithms", "Operating Systems"]);
    }
}
