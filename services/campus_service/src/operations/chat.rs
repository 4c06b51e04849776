use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::Status;

use super::{require, EndpointResult};
use crate::chat;
use crate::context::Context;
use crate::model::Chat;
use crate::pb::{
    ChatMessage, CreateChatInput, CreateChatOutput, ListMessagesInput, ListMessagesOutput, PostMessageInput,
    PostMessageOutput, SubscribeChatInput,
};
use crate::records;

/// Messages buffered per streaming client.
const STREAM_BUFFER: usize = 16;

pub type ChatStream = ReceiverStream<Result<ChatMessage, Status>>;

pub(crate) async fn create_chat(ctx: &Context, input: CreateChatInput) -> EndpointResult<CreateChatOutput> {
    let chat = chat::create_chat(ctx.store.as_ref(), input.participants).await?;
    Ok(CreateChatOutput { chat_id: chat.id })
}

pub(crate) async fn post_message(ctx: &Context, input: PostMessageInput) -> EndpointResult<PostMessageOutput> {
    let chat_id = require("Chat ID", &input.chat_id)?;
    let author_id = require("Author ID", &input.author_id)?;

    let message = chat::post_message(
        ctx.store.as_ref(),
        &ctx.events,
        &ctx.chat_hub,
        chat_id,
        author_id,
        &input.text,
    )
    .await?;
    Ok(PostMessageOutput {
        message: Some(message.into()),
    })
}

pub(crate) async fn list_messages(ctx: &Context, input: ListMessagesInput) -> EndpointResult<ListMessagesOutput> {
    let chat_id = require("Chat ID", &input.chat_id)?;

    let messages = chat::list_messages(ctx.store.as_ref(), chat_id).await?;
    Ok(ListMessagesOutput {
        messages: messages.into_iter().map(Into::into).collect(),
    })
}

/// Streams new messages of the chat until the client goes away.
///
/// The forwarding task owns the [`chat::ChatSubscription`], so a closed client stream ends the
/// task and drops the subscription with it.
pub(crate) async fn subscribe_chat(ctx: &Context, input: SubscribeChatInput) -> EndpointResult<ChatStream> {
    let chat_id = require("Chat ID", &input.chat_id)?;
    records::fetch::<Chat>(ctx.store.as_ref(), chat_id).await?;

    let mut subscription = ctx.chat_hub.subscribe(chat_id);
    let (tx, rx) = mpsc::channel(STREAM_BUFFER);
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                message = subscription.recv() => match message {
                    Some(message) => {
                        if tx.send(Ok(ChatMessage::from(message))).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }
        tracing::debug!(chat_id = subscription.chat_id(), "Chat stream closed.");
    });

    Ok(ReceiverStream::new(rx))
}
