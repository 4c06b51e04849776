use super::{require, EndpointResult};
use crate::context::Context;
use crate::news;
use crate::pb::{
    CommentOnNewsInput, CommentOnNewsOutput, ListCommentsInput, ListCommentsOutput, ListNewsInput, ListNewsOutput,
    PublishNewsInput, PublishNewsOutput,
};

pub(crate) async fn publish_news(ctx: &Context, input: PublishNewsInput) -> EndpointResult<PublishNewsOutput> {
    let author_id = require("Author ID", &input.author_id)?;

    let news = news::publish_news(ctx.store.as_ref(), &ctx.events, author_id, &input.title, &input.body).await?;
    Ok(PublishNewsOutput { news_id: news.id })
}

pub(crate) async fn list_news(ctx: &Context, input: ListNewsInput) -> EndpointResult<ListNewsOutput> {
    let limit = Some(input.limit as usize).filter(|limit| *limit > 0);

    let news = news::list_news(ctx.store.as_ref(), limit).await?;
    Ok(ListNewsOutput {
        news: news.into_iter().map(Into::into).collect(),
    })
}

pub(crate) async fn comment_on_news(ctx: &Context, input: CommentOnNewsInput) -> EndpointResult<CommentOnNewsOutput> {
    let news_id = require("News ID", &input.news_id)?;
    let author_id = require("Author ID", &input.author_id)?;

    let comment = news::comment_on_news(ctx.store.as_ref(), news_id, author_id, &input.text).await?;
    Ok(CommentOnNewsOutput { comment_id: comment.id })
}

pub(crate) async fn list_comments(ctx: &Context, input: ListCommentsInput) -> EndpointResult<ListCommentsOutput> {
    let news_id = require("News ID", &input.news_id)?;

    let comments = news::list_comments(ctx.store.as_ref(), news_id).await?;
    Ok(ListCommentsOutput {
        comments: comments.into_iter().map(Into::into).collect(),
    })
}
