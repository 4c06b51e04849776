mod common;

use std::sync::Arc;

use campus_service::context::Context;
use campus_service::error::CampusError;
use campus_service::events::{DomainEvent, EventBus};
use campus_service::journal::{
    journal_day, remove_journal_entries_for_date, save_journal_day, Confirmation, EntryInput,
};
use campus_service::model::{AttendanceStatus, JournalDay};
use campus_service::pb::campus_service_server::CampusService;
use campus_service::pb::{GetJournalDayInput, RemoveJournalDayInput};
use campus_service::records;
use campus_service::roster::add_student_to_group;
use campus_service::svc::CampusServiceImpl;
use campus_service::store::{Collection, MemoryStore};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use rstest::rstest;
use tokio::sync::mpsc::UnboundedReceiver;
use tonic::{Code, Request};

struct Fixture {
    store: Arc<MemoryStore>,
    events: EventBus,
    rx: UnboundedReceiver<DomainEvent>,
    journal_id: String,
    students: Vec<String>,
}

async fn fixture(size: usize) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let (events, rx) = EventBus::new();
    let group = common::group(&store, "KN-21").await;
    let mut students = Vec::with_capacity(size);
    for idx in 0..size {
        let student = common::student(&store, "Student", &format!("N{idx:02}")).await;
        add_student_to_group(store.as_ref(), &events, &group.id, &student.id)
            .await
            .unwrap();
        students.push(student.id);
    }
    let journal = common::journal(&store, &group.id).await;

    let mut fixture = Fixture {
        store,
        events,
        rx,
        journal_id: journal.id,
        students,
    };
    fixture.drain();
    fixture
}

impl Fixture {
    fn drain(&mut self) -> Vec<DomainEvent> {
        std::iter::from_fn(|| self.rx.try_recv().ok()).collect()
    }

    async fn stored(&self, date: NaiveDate) -> Option<JournalDay> {
        records::fetch_optional(self.store.as_ref(), &JournalDay::key(&self.journal_id, date))
            .await
            .unwrap()
    }
}

fn entries(students: &[String], grades: &[Option<i64>]) -> Vec<EntryInput> {
    students
        .iter()
        .zip(grades)
        .map(|(student_id, grade)| EntryInput {
            student_id: student_id.clone(),
            attendance: AttendanceStatus::Present,
            grade: *grade,
            comment: String::new(),
        })
        .collect()
}

fn at(raw: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(raw).unwrap()
}

#[tokio::test]
async fn entries_saved_at_midnight_are_read_back_later_that_day() {
    let fx = fixture(3).await;
    let grades = [Some(90), None, Some(75)];

    save_journal_day(
        fx.store.as_ref(),
        &fx.events,
        &fx.journal_id,
        &at("2024-03-01T00:00:00+00:00"),
        entries(&fx.students, &grades),
    )
    .await
    .unwrap();

    let sheet = journal_day(fx.store.as_ref(), &fx.journal_id, &at("2024-03-01T15:42:00+00:00"))
        .await
        .unwrap();

    assert_eq!(sheet.date, NaiveDate::from_ymd(2024, 3, 1));
    let by_student: Vec<(String, Option<u8>)> = sheet.rows.into_iter().map(|r| (r.student_id, r.grade)).collect();
    assert_eq!(
        by_student,
        vec![
            (fx.students[0].clone(), Some(90)),
            (fx.students[1].clone(), None),
            (fx.students[2].clone(), Some(75)),
        ]
    );
}

#[tokio::test]
async fn day_follows_the_callers_offset() {
    let fx = fixture(1).await;
    let kyiv = FixedOffset::east(2 * 3600);
    let late_evening = kyiv.ymd(2024, 3, 1).and_hms(23, 30, 0);

    save_journal_day(
        fx.store.as_ref(),
        &fx.events,
        &fx.journal_id,
        &late_evening,
        entries(&fx.students, &[Some(60)]),
    )
    .await
    .unwrap();

    assert!(fx.stored(NaiveDate::from_ymd(2024, 3, 1)).await.is_some());
    assert!(fx.stored(NaiveDate::from_ymd(2024, 3, 2)).await.is_none());
}

#[tokio::test]
async fn students_without_entries_default_to_present() {
    let fx = fixture(2).await;

    let sheet = journal_day(fx.store.as_ref(), &fx.journal_id, &Utc::now()).await.unwrap();

    assert_eq!(sheet.rows.len(), 2);
    assert!(sheet
        .rows
        .iter()
        .all(|row| row.attendance == AttendanceStatus::Present && row.grade.is_none() && row.comment.is_empty()));
}

#[tokio::test]
async fn saving_replaces_the_day_and_announces_only_changed_grades() {
    let mut fx = fixture(5).await;
    let day = at("2024-03-01T09:00:00+00:00");
    let first = [Some(80), Some(81), Some(82), Some(83), Some(84)];
    let second = [Some(80), Some(81), Some(95), Some(83), Some(84)];

    save_journal_day(fx.store.as_ref(), &fx.events, &fx.journal_id, &day, entries(&fx.students, &first))
        .await
        .unwrap();
    assert_eq!(fx.drain().len(), 5);

    save_journal_day(fx.store.as_ref(), &fx.events, &fx.journal_id, &day, entries(&fx.students, &second))
        .await
        .unwrap();

    let stored = fx.stored(NaiveDate::from_ymd(2024, 3, 1)).await.unwrap();
    assert_eq!(stored.entries.len(), 5);
    assert_eq!(stored.entries[2].grade, Some(95));
    assert_eq!(
        fx.drain(),
        vec![DomainEvent::GradeCreated {
            journal_id: fx.journal_id.clone(),
            student_id: fx.students[2].clone(),
            date: NaiveDate::from_ymd(2024, 3, 1),
            grade: 95,
        }]
    );
}

#[tokio::test]
async fn a_shorter_save_drops_the_missing_entries() {
    let fx = fixture(3).await;
    let day = at("2024-03-01T09:00:00+00:00");

    save_journal_day(
        fx.store.as_ref(),
        &fx.events,
        &fx.journal_id,
        &day,
        entries(&fx.students, &[Some(70), Some(71), Some(72)]),
    )
    .await
    .unwrap();
    save_journal_day(
        fx.store.as_ref(),
        &fx.events,
        &fx.journal_id,
        &day,
        entries(&fx.students[..1], &[Some(70)]),
    )
    .await
    .unwrap();

    let stored = fx.stored(NaiveDate::from_ymd(2024, 3, 1)).await.unwrap();
    assert_eq!(stored.entries.len(), 1);
}

#[rstest]
#[case(150)]
#[case(-5)]
#[case(101)]
#[tokio::test]
async fn out_of_range_grades_leave_the_day_untouched(#[case] grade: i64) {
    let mut fx = fixture(2).await;
    let day = at("2024-03-01T09:00:00+00:00");
    save_journal_day(
        fx.store.as_ref(),
        &fx.events,
        &fx.journal_id,
        &day,
        entries(&fx.students, &[Some(50), Some(60)]),
    )
    .await
    .unwrap();
    fx.drain();
    let before = fx.stored(NaiveDate::from_ymd(2024, 3, 1)).await;

    let err = save_journal_day(
        fx.store.as_ref(),
        &fx.events,
        &fx.journal_id,
        &day,
        entries(&fx.students, &[Some(55), Some(grade)]),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CampusError::Validation { ref field, .. } if field == "grade"));
    assert_eq!(fx.stored(NaiveDate::from_ymd(2024, 3, 1)).await, before);
    assert!(fx.drain().is_empty());
}

#[tokio::test]
async fn declined_confirmation_keeps_the_entries() {
    let fx = fixture(2).await;
    let day = at("2024-03-01T09:00:00+00:00");
    save_journal_day(
        fx.store.as_ref(),
        &fx.events,
        &fx.journal_id,
        &day,
        entries(&fx.students, &[Some(50), Some(60)]),
    )
    .await
    .unwrap();

    let mut asked = None;
    let token = Confirmation::request("Remove the day?", |prompt| {
        asked = Some(prompt.to_owned());
        false
    });

    assert!(token.is_none());
    assert_eq!(asked.as_deref(), Some("Remove the day?"));
    assert!(fx.stored(NaiveDate::from_ymd(2024, 3, 1)).await.is_some());
}

#[tokio::test]
async fn confirmed_removal_clears_only_that_day() {
    let fx = fixture(1).await;
    for raw in ["2024-03-01T09:00:00+00:00", "2024-03-02T09:00:00+00:00"] {
        save_journal_day(
            fx.store.as_ref(),
            &fx.events,
            &fx.journal_id,
            &at(raw),
            entries(&fx.students, &[Some(50)]),
        )
        .await
        .unwrap();
    }

    let token = Confirmation::request("Remove the day?", |_| true).unwrap();
    let removed = remove_journal_entries_for_date(
        fx.store.as_ref(),
        &fx.journal_id,
        &at("2024-03-01T18:00:00+00:00"),
        token,
    )
    .await
    .unwrap();

    assert!(removed);
    assert!(fx.stored(NaiveDate::from_ymd(2024, 3, 1)).await.is_none());
    assert!(fx.stored(NaiveDate::from_ymd(2024, 3, 2)).await.is_some());

    let token = Confirmation::request("Remove the day?", |_| true).unwrap();
    let removed_again = remove_journal_entries_for_date(
        fx.store.as_ref(),
        &fx.journal_id,
        &at("2024-03-01T18:00:00+00:00"),
        token,
    )
    .await
    .unwrap();
    assert!(!removed_again);
}

#[tokio::test]
async fn unconfirmed_remove_request_is_rejected() {
    let fx = fixture(2).await;
    save_journal_day(
        fx.store.as_ref(),
        &fx.events,
        &fx.journal_id,
        &at("2024-03-01T09:00:00+00:00"),
        entries(&fx.students, &[Some(50), Some(60)]),
    )
    .await
    .unwrap();
    let (ctx, _rx) = Context::with_store(fx.store.clone());
    let service = CampusServiceImpl::new(ctx);

    let status = service
        .remove_journal_day(Request::new(RemoveJournalDayInput {
            journal_id: fx.journal_id.clone(),
            date: "2024-03-01".to_owned(),
            confirmed: false,
        }))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::InvalidArgument);
    let sheet = service
        .get_journal_day(Request::new(GetJournalDayInput {
            journal_id: fx.journal_id.clone(),
            date: "2024-03-01".to_owned(),
        }))
        .await
        .unwrap()
        .into_inner();
    let grades: Vec<Option<u32>> = sheet.rows.iter().map(|row| row.grade).collect();
    assert_eq!(grades, vec![Some(50), Some(60)]);
}

async fn assert_save_rejected_for(fx: &mut Fixture, stranger: String) {
    let students = vec![fx.students[0].clone(), stranger];

    let err = save_journal_day(
        fx.store.as_ref(),
        &fx.events,
        &fx.journal_id,
        &at("2024-03-01T09:00:00+00:00"),
        entries(&students, &[Some(80), Some(90)]),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CampusError::Validation { ref field, .. } if field == "studentId"));
    assert!(fx.stored(NaiveDate::from_ymd(2024, 3, 1)).await.is_none());
    assert!(fx.drain().is_empty());
}

#[tokio::test]
async fn entries_for_unknown_students_are_rejected() {
    let mut fx = fixture(1).await;

    assert_save_rejected_for(&mut fx, "s-nobody".to_owned()).await;
}

#[tokio::test]
async fn entries_for_students_of_another_group_are_rejected() {
    let mut fx = fixture(1).await;
    let other = common::group(&fx.store, "KN-22").await;
    let outsider = common::student(&fx.store, "Petro", "Bondar").await;
    add_student_to_group(fx.store.as_ref(), &fx.events, &other.id, &outsider.id)
        .await
        .unwrap();
    fx.drain();

    assert_save_rejected_for(&mut fx, outsider.id).await;
}

#[tokio::test]
async fn removing_a_day_of_an_unknown_journal_is_not_found() {
    let fx = fixture(0).await;
    let token = Confirmation::request("Remove the day?", |_| true).unwrap();

    let err = remove_journal_entries_for_date(
        fx.store.as_ref(),
        "j-404",
        &at("2024-03-01T09:00:00+00:00"),
        token,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CampusError::NotFound { collection: Collection::Journals, .. }));
}
