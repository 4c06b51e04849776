//! Chats between users, with live delivery of new messages to subscribers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::error::CampusError;
use crate::events::{DomainEvent, EventBus};
use crate::lookup;
use crate::model::{new_id, Chat, Message, Record, User};
use crate::records;
use crate::store::{DocumentStore, Filter, Order};

/// Messages buffered per chat for slow subscribers.
const CHANNEL_CAPACITY: usize = 64;
const MAX_MESSAGE_LEN: usize = 4000;

type Channels = HashMap<String, broadcast::Sender<Message>>;

/// Fan-out of freshly posted messages to live subscribers, one channel per chat.
#[derive(Clone, Default)]
pub struct ChatHub {
    channels: Arc<Mutex<Channels>>,
}

/// Live feed of one chat. Dropping it unsubscribes; the chat's channel goes away with its last
/// subscriber.
pub struct ChatSubscription {
    chat_id: String,
    receiver: Option<broadcast::Receiver<Message>>,
    hub: ChatHub,
}

impl ChatHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn channels(&self) -> MutexGuard<'_, Channels> {
        self.channels.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn subscribe(&self, chat_id: &str) -> ChatSubscription {
        let receiver = self
            .channels()
            .entry(chat_id.to_owned())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe();
        tracing::debug!(chat_id, "Chat subscriber attached.");

        ChatSubscription {
            chat_id: chat_id.to_owned(),
            receiver: Some(receiver),
            hub: self.clone(),
        }
    }

    /// Hands `message` to every live subscriber of its chat and returns how many there were.
    pub fn publish(&self, message: &Message) -> usize {
        match self.channels().get(&message.chat_id) {
            Some(sender) => sender.send(message.clone()).unwrap_or(0),
            None => 0,
        }
    }

    pub fn listener_count(&self, chat_id: &str) -> usize {
        self.channels()
            .get(chat_id)
            .map(broadcast::Sender::receiver_count)
            .unwrap_or(0)
    }

    pub fn active_chats(&self) -> usize {
        self.channels().len()
    }
}

impl ChatSubscription {
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    /// Next message of the chat. Messages missed by a lagging subscriber are skipped.
    pub async fn recv(&mut self) -> Option<Message> {
        let receiver = self.receiver.as_mut()?;
        loop {
            match receiver.recv().await {
                Ok(message) => return Some(message),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(chat_id = %self.chat_id, skipped, "Chat subscriber lagged behind.");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for ChatSubscription {
    fn drop(&mut self) {
        drop(self.receiver.take());

        let mut channels = self.hub.channels();
        if channels
            .get(&self.chat_id)
            .map_or(false, |sender| sender.receiver_count() == 0)
        {
            channels.remove(&self.chat_id);
        }
        tracing::debug!(chat_id = %self.chat_id, "Chat subscriber detached.");
    }
}

/// Creates a chat between at least two distinct existing users.
#[tracing::instrument(skip(store))]
pub async fn create_chat(store: &dyn DocumentStore, participants: Vec<String>) -> Result<Chat, CampusError> {
    let mut unique: Vec<String> = Vec::with_capacity(participants.len());
    for participant in participants {
        if !participant.is_empty() && !unique.contains(&participant) {
            unique.push(participant);
        }
    }
    if unique.len() < 2 {
        return Err(CampusError::validation("participants", "needs at least two distinct users"));
    }

    let users: Vec<User> = lookup::fetch_by_ids(store, &unique).await?;
    if let Some(missing) = unique.iter().find(|id| !users.iter().any(|u| &u.id == *id)) {
        return Err(CampusError::not_found(User::COLLECTION, missing.clone()));
    }

    let chat = Chat {
        id: new_id(),
        participants: unique,
        created_at: Utc::now(),
    };
    store.commit(vec![records::put(&chat)?]).await?;
    Ok(chat)
}

/// Stores the message, then notifies the other participants and pushes it to live subscribers.
#[tracing::instrument(skip(store, events, hub, text))]
pub async fn post_message(
    store: &dyn DocumentStore,
    events: &EventBus,
    hub: &ChatHub,
    chat_id: &str,
    author_id: &str,
    text: &str,
) -> Result<Message, CampusError> {
    let text = text.trim();
    if text.is_empty() || text.chars().count() > MAX_MESSAGE_LEN {
        return Err(CampusError::validation(
            "text",
            format!("must be between 1 and {} characters", MAX_MESSAGE_LEN),
        ));
    }
    let chat: Chat = records::fetch(store, chat_id).await?;
    if !chat.participants.iter().any(|p| p == author_id) {
        return Err(CampusError::validation("authorId", "is not a participant of the chat"));
    }

    let message = Message {
        id: new_id(),
        chat_id: chat.id.clone(),
        author_id: author_id.to_owned(),
        text: text.to_owned(),
        created_at: Utc::now(),
    };
    store.commit(vec![records::put(&message)?]).await?;

    events.publish(DomainEvent::MessagePosted {
        chat_id: chat.id,
        message_id: message.id.clone(),
        author_id: author_id.to_owned(),
        recipients: chat.participants.into_iter().filter(|p| p != author_id).collect(),
    });
    let delivered = hub.publish(&message);
    tracing::debug!(delivered, "Message posted.");
    Ok(message)
}

/// Oldest first.
pub async fn list_messages(store: &dyn DocumentStore, chat_id: &str) -> Result<Vec<Message>, CampusError> {
    records::fetch::<Chat>(store, chat_id).await?;
    records::find(
        store,
        &Filter::all().eq("chatId", chat_id).order_by("createdAt", Order::Ascending),
    )
    .await
}
