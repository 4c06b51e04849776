use service_core::endpoint_error::EndpointError;

use super::{require, EndpointResult};
use crate::context::Context;
use crate::groups::{self, GroupChanges, NewGroup};
use crate::pb::{
    CreateGroupInput, CreateGroupOutput, CreateSubjectInput, CreateSubjectOutput, DeleteGroupInput, DeleteGroupOutput,
    DescribeRosterInput, DescribeRosterOutput, ListGroupsInput, ListGroupsOutput, ListSubjectsForTeacherInput,
    ListSubjectsForTeacherOutput, MembershipInput, MembershipOutput, UpdateGroupInput, UpdateGroupOutput,
};
use crate::subjects::{self, NewSubject};
use crate::{lookup, roster};

fn small(field: &str, value: u32) -> EndpointResult<u16> {
    u16::try_from(value).map_err(|_| EndpointError::validation(format!("{} is out of range.", field)))
}

pub(crate) async fn create_group(ctx: &Context, input: CreateGroupInput) -> EndpointResult<CreateGroupOutput> {
    let new_group = NewGroup {
        name: input.name,
        year: small("Year", input.year)?,
        specialization: input.specialization,
        curator_id: Some(input.curator_id).filter(|id| !id.is_empty()),
    };

    let group = groups::create_group(ctx.store.as_ref(), new_group).await?;
    Ok(CreateGroupOutput { group_id: group.id })
}

pub(crate) async fn update_group(ctx: &Context, input: UpdateGroupInput) -> EndpointResult<UpdateGroupOutput> {
    let group_id = require("Group ID", &input.group_id)?;
    let changes = GroupChanges {
        name: input.name,
        year: input.year.map(|year| small("Year", year)).transpose()?,
        specialization: input.specialization,
        curator_id: input.curator_id,
    };

    groups::update_group(ctx.store.as_ref(), group_id, changes).await?;
    Ok(UpdateGroupOutput {})
}

pub(crate) async fn delete_group(ctx: &Context, input: DeleteGroupInput) -> EndpointResult<DeleteGroupOutput> {
    let group_id = require("Group ID", &input.group_id)?;

    let deleted = groups::delete_group(ctx.store.as_ref(), group_id).await?;
    Ok(DeleteGroupOutput {
        orphaned_students: deleted.orphaned_students,
        orphaned_teachers: deleted.orphaned_teachers,
    })
}

pub(crate) async fn list_groups(ctx: &Context, _input: ListGroupsInput) -> EndpointResult<ListGroupsOutput> {
    let groups = groups::list_groups(ctx.store.as_ref()).await?;
    Ok(ListGroupsOutput {
        groups: groups.into_iter().map(Into::into).collect(),
    })
}

/// Which side of a group membership a [`MembershipInput`] changes.
#[derive(Clone, Copy, Debug)]
pub(crate) enum MembershipChange {
    AddStudent,
    RemoveStudent,
    AssignTeacher,
    RemoveTeacher,
}

pub(crate) async fn change_membership(
    ctx: &Context,
    change: MembershipChange,
    input: MembershipInput,
) -> EndpointResult<MembershipOutput> {
    let group_id = require("Group ID", &input.group_id)?;
    let member_id = require("Member ID", &input.member_id)?;
    let (store, events) = (ctx.store.as_ref(), &ctx.events);

    match change {
        MembershipChange::AddStudent => roster::add_student_to_group(store, events, group_id, member_id).await?,
        MembershipChange::RemoveStudent => roster::remove_student_from_group(store, events, group_id, member_id).await?,
        MembershipChange::AssignTeacher => roster::assign_teacher_to_group(store, events, group_id, member_id).await?,
        MembershipChange::RemoveTeacher => roster::remove_teacher_from_group(store, events, group_id, member_id).await?,
    }
    Ok(MembershipOutput {})
}

pub(crate) async fn describe_roster(ctx: &Context, input: DescribeRosterInput) -> EndpointResult<DescribeRosterOutput> {
    let group_id = require("Group ID", &input.group_id)?;

    let (group, rows) = lookup::group_roster(ctx.store.as_ref(), group_id).await?;
    Ok(DescribeRosterOutput {
        group: Some(group.into()),
        students: rows.into_iter().map(Into::into).collect(),
    })
}

pub(crate) async fn create_subject(ctx: &Context, input: CreateSubjectInput) -> EndpointResult<CreateSubjectOutput> {
    let new_subject = NewSubject {
        name: input.name,
        credits: small("Credits", input.credits)?,
        hours: small("Hours", input.hours)?,
        teacher_id: Some(input.teacher_id).filter(|id| !id.is_empty()),
        groups: input.groups,
    };

    let subject = subjects::create_subject(ctx.store.as_ref(), new_subject).await?;
    Ok(CreateSubjectOutput { subject_id: subject.id })
}

pub(crate) async fn list_subjects_for_teacher(
    ctx: &Context,
    input: ListSubjectsForTeacherInput,
) -> EndpointResult<ListSubjectsForTeacherOutput> {
    let teacher_id = require("Teacher ID", &input.teacher_id)?;

    let subjects = subjects::list_subjects_for_teacher(ctx.store.as_ref(), teacher_id).await?;
    Ok(ListSubjectsForTeacherOutput {
        subjects: subjects.into_iter().map(Into::into).collect(),
    })
}
