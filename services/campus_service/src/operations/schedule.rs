use service_core::endpoint_error::EndpointError;

use super::{require, EndpointResult};
use crate::context::Context;
use crate::pb::{CreateLessonInput, CreateLessonOutput, ListLessonsInput, ListLessonsOutput};
use crate::schedule::{self, NewLesson};

pub(crate) async fn create_lesson(ctx: &Context, input: CreateLessonInput) -> EndpointResult<CreateLessonOutput> {
    let new_lesson = NewLesson {
        group_id: require("Group ID", &input.group_id)?.to_owned(),
        subject_id: require("Subject ID", &input.subject_id)?.to_owned(),
        teacher_id: require("Teacher ID", &input.teacher_id)?.to_owned(),
        day_of_week: u8::try_from(input.day_of_week)
            .map_err(|_| EndpointError::validation("Day of week is out of range."))?,
        start_time: input.start_time,
        end_time: input.end_time,
        room: input.room,
        weekly: input.weekly,
    };

    let lesson = schedule::create_lesson(ctx.store.as_ref(), new_lesson).await?;
    Ok(CreateLessonOutput { lesson_id: lesson.id })
}

pub(crate) async fn list_lessons(ctx: &Context, input: ListLessonsInput) -> EndpointResult<ListLessonsOutput> {
    let group_id = require("Group ID", &input.group_id)?;

    let lessons = schedule::list_lessons_for_group(ctx.store.as_ref(), group_id).await?;
    Ok(ListLessonsOutput {
        lessons: lessons.into_iter().map(Into::into).collect(),
    })
}
