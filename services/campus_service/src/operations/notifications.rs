use super::{require, EndpointResult};
use crate::context::Context;
use crate::notifications;
use crate::pb::{ListNotificationsInput, ListNotificationsOutput, MarkNotificationReadInput, MarkNotificationReadOutput};

pub(crate) async fn list_notifications(
    ctx: &Context,
    input: ListNotificationsInput,
) -> EndpointResult<ListNotificationsOutput> {
    let recipient_id = require("Recipient ID", &input.recipient_id)?;

    let notifications = notifications::list_notifications(ctx.store.as_ref(), recipient_id, input.unread_only).await?;
    Ok(ListNotificationsOutput {
        notifications: notifications.into_iter().map(Into::into).collect(),
    })
}

pub(crate) async fn mark_notification_read(
    ctx: &Context,
    input: MarkNotificationReadInput,
) -> EndpointResult<MarkNotificationReadOutput> {
    let notification_id = require("Notification ID", &input.notification_id)?;

    notifications::mark_notification_read(ctx.store.as_ref(), notification_id).await?;
    Ok(MarkNotificationReadOutput {})
}
