use chrono::Utc;

use crate::error::CampusError;
use crate::events::{DomainEvent, EventBus};
use crate::model::{new_id, Comment, News, User};
use crate::records;
use crate::store::{DocumentStore, Filter, Order};

const MAX_TITLE_LEN: usize = 200;

#[tracing::instrument(skip(store, events, body))]
pub async fn publish_news(
    store: &dyn DocumentStore,
    events: &EventBus,
    author_id: &str,
    title: &str,
    body: &str,
) -> Result<News, CampusError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
        return Err(CampusError::validation(
            "title",
            format!("must be between 1 and {} characters", MAX_TITLE_LEN),
        ));
    }
    records::fetch::<User>(store, author_id).await?;

    let news = News {
        id: new_id(),
        author_id: author_id.to_owned(),
        title: title.to_owned(),
        body: body.to_owned(),
        published_at: Utc::now(),
    };
    store.commit(vec![records::put(&news)?]).await?;

    events.publish(DomainEvent::NewsPublished {
        news_id: news.id.clone(),
        title: news.title.clone(),
    });
    Ok(news)
}

/// Newest first.
pub async fn list_news(store: &dyn DocumentStore, limit: Option<usize>) -> Result<Vec<News>, CampusError> {
    let mut filter = Filter::all().order_by("publishedAt", Order::Descending);
    if let Some(limit) = limit {
        filter = filter.limit(limit);
    }
    records::find(store, &filter).await
}

#[tracing::instrument(skip(store, text))]
pub async fn comment_on_news(
    store: &dyn DocumentStore,
    news_id: &str,
    author_id: &str,
    text: &str,
) -> Result<Comment, CampusError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(CampusError::validation("text", "is required"));
    }
    records::fetch::<News>(store, news_id).await?;

    let comment = Comment {
        id: new_id(),
        target_id: news_id.to_owned(),
        author_id: author_id.to_owned(),
        text: text.to_owned(),
        created_at: Utc::now(),
    };
    store.commit(vec![records::put(&comment)?]).await?;
    Ok(comment)
}

/// Oldest first.
pub async fn list_comments(store: &dyn DocumentStore, news_id: &str) -> Result<Vec<Comment>, CampusError> {
    records::find(
        store,
        &Filter::all().eq("targetId", news_id).order_by("createdAt", Order::Ascending),
    )
    .await
}
