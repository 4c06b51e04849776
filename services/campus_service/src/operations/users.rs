use service_core::endpoint_error::EndpointError;

use super::{require, EndpointResult};
use crate::context::Context;
use crate::pb::conversion::{role_from_pb, user_status_from_pb};
use crate::pb::{
    CreateUserInput, CreateUserOutput, DeleteUserInput, DeleteUserOutput, ListUsersInput, ListUsersOutput,
    UpdateUserRoleInput, UpdateUserRoleOutput, UpdateUserStatusInput, UpdateUserStatusOutput,
};
use crate::users::{self, NewUser};

pub(crate) async fn create_user(ctx: &Context, input: CreateUserInput) -> EndpointResult<CreateUserOutput> {
    let role = role_from_pb(input.role).ok_or_else(|| EndpointError::validation("Invalid role provided."))?;
    let new_user = NewUser::builder()
        .first_name(input.first_name)
        .last_name(input.last_name)
        .email(input.email)
        .role(role)
        .card_number(input.card_number)
        .specialization(input.specialization)
        .build();

    let created = users::create_user(ctx.store.as_ref(), new_user).await?;

    Ok(CreateUserOutput {
        user_id: created.user.id,
        profile_id: created.profile_id.unwrap_or_default(),
    })
}

pub(crate) async fn update_user_status(
    ctx: &Context,
    input: UpdateUserStatusInput,
) -> EndpointResult<UpdateUserStatusOutput> {
    let user_id = require("User ID", &input.user_id)?;
    let status =
        user_status_from_pb(input.status).ok_or_else(|| EndpointError::validation("Invalid user status provided."))?;

    users::update_user_status(ctx.store.as_ref(), user_id, status).await?;
    Ok(UpdateUserStatusOutput {})
}

pub(crate) async fn update_user_role(ctx: &Context, input: UpdateUserRoleInput) -> EndpointResult<UpdateUserRoleOutput> {
    let user_id = require("User ID", &input.user_id)?;
    let role = role_from_pb(input.role).ok_or_else(|| EndpointError::validation("Invalid role provided."))?;

    users::update_user_role(ctx.store.as_ref(), user_id, role).await?;
    Ok(UpdateUserRoleOutput {})
}

pub(crate) async fn delete_user(ctx: &Context, input: DeleteUserInput) -> EndpointResult<DeleteUserOutput> {
    let user_id = require("User ID", &input.user_id)?;

    let deleted = users::delete_user(ctx.store.as_ref(), user_id).await?;
    Ok(DeleteUserOutput {
        orphaned_profiles: deleted.orphaned_profiles,
    })
}

pub(crate) async fn list_users(ctx: &Context, input: ListUsersInput) -> EndpointResult<ListUsersOutput> {
    let users = users::list_users(ctx.store.as_ref(), role_from_pb(input.role)).await?;
    Ok(ListUsersOutput {
        users: users.into_iter().map(Into::into).collect(),
    })
}
