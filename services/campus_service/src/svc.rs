use tonic::{Request, Response, Status};

use crate::context::Context;
use crate::operations::chat::ChatStream;
use crate::operations::groups::MembershipChange;
use crate::operations::{chat, groups, journal, news, notifications, schedule, users};
use crate::pb::campus_service_server::CampusService;
use crate::pb::*;

pub struct CampusServiceImpl {
    pub ctx: Context,
}

impl CampusServiceImpl {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }
}

#[tonic::async_trait]
impl CampusService for CampusServiceImpl {
    async fn create_user(&self, request: Request<CreateUserInput>) -> Result<Response<CreateUserOutput>, Status> {
        users::create_user(&self.ctx, request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| err.into())
    }

    async fn update_user_status(
        &self,
        request: Request<UpdateUserStatusInput>,
    ) -> Result<Response<UpdateUserStatusOutput>, Status> {
        users::update_user_status(&self.ctx, request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| err.into())
    }

    async fn update_user_role(
        &self,
        request: Request<UpdateUserRoleInput>,
    ) -> Result<Response<UpdateUserRoleOutput>, Status> {
        users::update_user_role(&self.ctx, request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| err.into())
    }

    async fn delete_user(&self, request: Request<DeleteUserInput>) -> Result<Response<DeleteUserOutput>, Status> {
        users::delete_user(&self.ctx, request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| err.into())
    }

    async fn list_users(&self, request: Request<ListUsersInput>) -> Result<Response<ListUsersOutput>, Status> {
        users::list_users(&self.ctx, request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| err.into())
    }

    async fn create_group(&self, request: Request<CreateGroupInput>) -> Result<Response<CreateGroupOutput>, Status> {
        groups::create_group(&self.ctx, request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| err.into())
    }

    async fn update_group(&self, request: Request<UpdateGroupInput>) -> Result<Response<UpdateGroupOutput>, Status> {
        groups::update_group(&self.ctx, request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| err.into())
    }

    async fn delete_group(&self, request: Request<DeleteGroupInput>) -> Result<Response<DeleteGroupOutput>, Status> {
        groups::delete_group(&self.ctx, request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| err.into())
    }

    async fn list_groups(&self, request: Request<ListGroupsInput>) -> Result<Response<ListGroupsOutput>, Status> {
        groups::list_groups(&self.ctx, request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| err.into())
    }

    async fn add_student_to_group(
        &self,
        request: Request<MembershipInput>,
    ) -> Result<Response<MembershipOutput>, Status> {
        groups::change_membership(&self.ctx, MembershipChange::AddStudent, request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| err.into())
    }

    async fn remove_student_from_group(
        &self,
        request: Request<MembershipInput>,
    ) -> Result<Response<MembershipOutput>, Status> {
        groups::change_membership(&self.ctx, MembershipChange::RemoveStudent, request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| err.into())
    }

    async fn assign_teacher_to_group(
        &self,
        request: Request<MembershipInput>,
    ) -> Result<Response<MembershipOutput>, Status> {
        groups::change_membership(&self.ctx, MembershipChange::AssignTeacher, request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| err.into())
    }

    async fn remove_teacher_from_group(
        &self,
        request: Request<MembershipInput>,
    ) -> Result<Response<MembershipOutput>, Status> {
        groups::change_membership(&self.ctx, MembershipChange::RemoveTeacher, request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| err.into())
    }

    async fn describe_roster(
        &self,
        request: Request<DescribeRosterInput>,
    ) -> Result<Response<DescribeRosterOutput>, Status> {
        groups::describe_roster(&self.ctx, request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| err.into())
    }

    async fn create_subject(
        &self,
        request: Request<CreateSubjectInput>,
    ) -> Result<Response<CreateSubjectOutput>, Status> {
        groups::create_subject(&self.ctx, request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| err.into())
    }

    async fn list_subjects_for_teacher(
        &self,
        request: Request<ListSubjectsForTeacherInput>,
    ) -> Result<Response<ListSubjectsForTeacherOutput>, Status> {
        groups::list_subjects_for_teacher(&self.ctx, request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| err.into())
    }

    async fn create_lesson(&self, request: Request<CreateLessonInput>) -> Result<Response<CreateLessonOutput>, Status> {
        schedule::create_lesson(&self.ctx, request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| err.into())
    }

    async fn list_lessons(&self, request: Request<ListLessonsInput>) -> Result<Response<ListLessonsOutput>, Status> {
        schedule::list_lessons(&self.ctx, request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| err.into())
    }

    async fn create_journal(
        &self,
        request: Request<CreateJournalInput>,
    ) -> Result<Response<CreateJournalOutput>, Status> {
        journal::create_journal(&self.ctx, request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| err.into())
    }

    async fn get_journal_day(
        &self,
        request: Request<GetJournalDayInput>,
    ) -> Result<Response<GetJournalDayOutput>, Status> {
        journal::get_journal_day(&self.ctx, request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| err.into())
    }

    async fn save_journal_day(
        &self,
        request: Request<SaveJournalDayInput>,
    ) -> Result<Response<SaveJournalDayOutput>, Status> {
        journal::save_journal_day(&self.ctx, request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| err.into())
    }

    async fn remove_journal_day(
        &self,
        request: Request<RemoveJournalDayInput>,
    ) -> Result<Response<RemoveJournalDayOutput>, Status> {
        journal::remove_journal_day(&self.ctx, request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| err.into())
    }

    async fn publish_news(&self, request: Request<PublishNewsInput>) -> Result<Response<PublishNewsOutput>, Status> {
        news::publish_news(&self.ctx, request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| err.into())
    }

    async fn list_news(&self, request: Request<ListNewsInput>) -> Result<Response<ListNewsOutput>, Status> {
        news::list_news(&self.ctx, request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| err.into())
    }

    async fn comment_on_news(
        &self,
        request: Request<CommentOnNewsInput>,
    ) -> Result<Response<CommentOnNewsOutput>, Status> {
        news::comment_on_news(&self.ctx, request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| err.into())
    }

    async fn list_comments(&self, request: Request<ListCommentsInput>) -> Result<Response<ListCommentsOutput>, Status> {
        news::list_comments(&self.ctx, request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| err.into())
    }

    async fn list_notifications(
        &self,
        request: Request<ListNotificationsInput>,
    ) -> Result<Response<ListNotificationsOutput>, Status> {
        notifications::list_notifications(&self.ctx, request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| err.into())
    }

    async fn mark_notification_read(
        &self,
        request: Request<MarkNotificationReadInput>,
    ) -> Result<Response<MarkNotificationReadOutput>, Status> {
        notifications::mark_notification_read(&self.ctx, request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| err.into())
    }

    async fn create_chat(&self, request: Request<CreateChatInput>) -> Result<Response<CreateChatOutput>, Status> {
        chat::create_chat(&self.ctx, request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| err.into())
    }

    async fn post_message(&self, request: Request<PostMessageInput>) -> Result<Response<PostMessageOutput>, Status> {
        chat::post_message(&self.ctx, request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| err.into())
    }

    async fn list_messages(&self, request: Request<ListMessagesInput>) -> Result<Response<ListMessagesOutput>, Status> {
        chat::list_messages(&self.ctx, request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| err.into())
    }

    type SubscribeChatStream = ChatStream;

    async fn subscribe_chat(
        &self,
        request: Request<SubscribeChatInput>,
    ) -> Result<Response<Self::SubscribeChatStream>, Status> {
        chat::subscribe_chat(&self.ctx, request.into_inner())
            .await
            .map(Response::new)
            .map_err(|err| err.into())
    }
}
