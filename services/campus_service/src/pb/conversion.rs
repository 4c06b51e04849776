use chrono::{DateTime, Utc};

use crate::journal::DayRow;
use crate::lookup::RosterRow;
use crate::model::schedule::hh_mm;
use crate::model::{
    AttendanceStatus, Comment as CommentModel, Group as GroupModel, Lesson as LessonModel, Message,
    News as NewsModel, Notification as NotificationModel, NotificationKind, Role as RoleModel, Subject as SubjectModel,
    User as UserModel, UserStatus as UserStatusModel,
};

use super::{
    Attendance, ChatMessage, Comment, Group, JournalRow, Lesson, News, Notification, Role, RosterEntry, Subject,
    User, UserStatus,
};

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339()
}

impl From<RoleModel> for Role {
    fn from(role: RoleModel) -> Self {
        match role {
            RoleModel::Student => Role::Student,
            RoleModel::Teacher => Role::Teacher,
            RoleModel::Admin => Role::Admin,
            RoleModel::PendingApproval => Role::PendingApproval,
        }
    }
}

/// `None` for [`Role::Unspecified`].
pub fn role_from_pb(raw: i32) -> Option<RoleModel> {
    match Role::from_i32(raw)? {
        Role::Unspecified => None,
        Role::Student => Some(RoleModel::Student),
        Role::Teacher => Some(RoleModel::Teacher),
        Role::Admin => Some(RoleModel::Admin),
        Role::PendingApproval => Some(RoleModel::PendingApproval),
    }
}

impl From<UserStatusModel> for UserStatus {
    fn from(status: UserStatusModel) -> Self {
        match status {
            UserStatusModel::Active => UserStatus::Active,
            UserStatusModel::Suspended => UserStatus::Suspended,
            UserStatusModel::PendingApproval => UserStatus::PendingApproval,
        }
    }
}

pub fn user_status_from_pb(raw: i32) -> Option<UserStatusModel> {
    match UserStatus::from_i32(raw)? {
        UserStatus::Unspecified => None,
        UserStatus::Active => Some(UserStatusModel::Active),
        UserStatus::Suspended => Some(UserStatusModel::Suspended),
        UserStatus::PendingApproval => Some(UserStatusModel::PendingApproval),
    }
}

impl From<AttendanceStatus> for Attendance {
    fn from(status: AttendanceStatus) -> Self {
        match status {
            AttendanceStatus::Present => Attendance::Present,
            AttendanceStatus::Absent => Attendance::Absent,
            AttendanceStatus::Late => Attendance::Late,
            AttendanceStatus::Excused => Attendance::Excused,
        }
    }
}

pub fn attendance_from_pb(raw: i32) -> Option<AttendanceStatus> {
    Some(match Attendance::from_i32(raw)? {
        Attendance::Present => AttendanceStatus::Present,
        Attendance::Absent => AttendanceStatus::Absent,
        Attendance::Late => AttendanceStatus::Late,
        Attendance::Excused => AttendanceStatus::Excused,
    })
}

impl From<UserModel> for User {
    fn from(user: UserModel) -> Self {
        User {
            role: Role::from(user.role) as i32,
            status: UserStatus::from(user.status) as i32,
            created_at: timestamp(&user.created_at),
            user_id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            group_id: user.group_id,
        }
    }
}

impl From<GroupModel> for Group {
    fn from(group: GroupModel) -> Self {
        Group {
            group_id: group.id,
            name: group.name,
            year: group.year.into(),
            specialization: group.specialization,
            curator_id: group.curator_id.unwrap_or_default(),
            students: group.students,
            teachers: group.teachers,
        }
    }
}

impl From<RosterRow> for RosterEntry {
    fn from(row: RosterRow) -> Self {
        RosterEntry {
            display_name: row.display_name(),
            student_id: row.student_id,
            user_id: row.user_id,
            email: row.email,
            card_number: row.card_number,
        }
    }
}

impl From<SubjectModel> for Subject {
    fn from(subject: SubjectModel) -> Self {
        Subject {
            subject_id: subject.id,
            name: subject.name,
            credits: subject.credits.into(),
            hours: subject.hours.into(),
            groups: subject.groups,
        }
    }
}

impl From<LessonModel> for Lesson {
    fn from(lesson: LessonModel) -> Self {
        Lesson {
            lesson_id: lesson.id,
            subject_id: lesson.subject_id,
            teacher_id: lesson.teacher_id,
            day_of_week: lesson.day_of_week.into(),
            start_time: lesson.start_time.format(hh_mm::FORMAT).to_string(),
            end_time: lesson.end_time.format(hh_mm::FORMAT).to_string(),
            room: lesson.room,
            weekly: lesson.weekly,
        }
    }
}

impl From<DayRow> for JournalRow {
    fn from(row: DayRow) -> Self {
        JournalRow {
            attendance: Attendance::from(row.attendance) as i32,
            grade: row.grade.map(u32::from),
            student_id: row.student_id,
            display_name: row.display_name,
            comment: row.comment,
        }
    }
}

impl From<NewsModel> for News {
    fn from(news: NewsModel) -> Self {
        News {
            published_at: timestamp(&news.published_at),
            news_id: news.id,
            author_id: news.author_id,
            title: news.title,
            body: news.body,
        }
    }
}

impl From<CommentModel> for Comment {
    fn from(comment: CommentModel) -> Self {
        Comment {
            created_at: timestamp(&comment.created_at),
            comment_id: comment.id,
            author_id: comment.author_id,
            text: comment.text,
        }
    }
}

impl From<NotificationModel> for Notification {
    fn from(notification: NotificationModel) -> Self {
        let kind = match notification.kind {
            NotificationKind::Grade => "grade",
            NotificationKind::Message => "message",
            NotificationKind::News => "news",
            NotificationKind::Roster => "roster",
        };
        Notification {
            kind: kind.to_owned(),
            created_at: timestamp(&notification.created_at),
            notification_id: notification.id,
            title: notification.title,
            body: notification.body,
            read: notification.read,
        }
    }
}

impl From<Message> for ChatMessage {
    fn from(message: Message) -> Self {
        ChatMessage {
            created_at: timestamp(&message.created_at),
            message_id: message.id,
            chat_id: message.chat_id,
            author_id: message.author_id,
            text: message.text,
        }
    }
}
