use service_core::endpoint_error::EndpointError;

use super::{parse_day, require, EndpointResult};
use crate::context::Context;
use crate::journal::{self, Confirmation, EntryInput};
use crate::pb::conversion::attendance_from_pb;
use crate::pb::{
    CreateJournalInput, CreateJournalOutput, GetJournalDayInput, GetJournalDayOutput, RemoveJournalDayInput,
    RemoveJournalDayOutput, SaveJournalDayInput, SaveJournalDayOutput,
};

pub(crate) async fn create_journal(ctx: &Context, input: CreateJournalInput) -> EndpointResult<CreateJournalOutput> {
    let group_id = require("Group ID", &input.group_id)?;
    let subject_id = require("Subject ID", &input.subject_id)?;
    let teacher_id = require("Teacher ID", &input.teacher_id)?;

    let journal =
        journal::create_journal(ctx.store.as_ref(), group_id, subject_id, teacher_id, &input.semester_id).await?;
    Ok(CreateJournalOutput { journal_id: journal.id })
}

pub(crate) async fn get_journal_day(ctx: &Context, input: GetJournalDayInput) -> EndpointResult<GetJournalDayOutput> {
    let journal_id = require("Journal ID", &input.journal_id)?;
    let at = parse_day(&input.date)?;

    let sheet = journal::journal_day(ctx.store.as_ref(), journal_id, &at).await?;
    Ok(GetJournalDayOutput {
        date: sheet.date.format("%Y-%m-%d").to_string(),
        rows: sheet.rows.into_iter().map(Into::into).collect(),
    })
}

pub(crate) async fn save_journal_day(ctx: &Context, input: SaveJournalDayInput) -> EndpointResult<SaveJournalDayOutput> {
    let journal_id = require("Journal ID", &input.journal_id)?;
    let at = parse_day(&input.date)?;
    let entries = input
        .entries
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| {
            let attendance = attendance_from_pb(entry.attendance)
                .ok_or_else(|| EndpointError::validation(format!("Entry {} has an invalid attendance.", idx)))?;
            Ok(EntryInput {
                student_id: entry.student_id,
                attendance,
                grade: entry.grade,
                comment: entry.comment,
            })
        })
        .collect::<EndpointResult<Vec<_>>>()?;

    let day = journal::save_journal_day(ctx.store.as_ref(), &ctx.events, journal_id, &at, entries).await?;
    Ok(SaveJournalDayOutput {
        saved: day.entries.len() as u32,
    })
}

pub(crate) async fn remove_journal_day(
    ctx: &Context,
    input: RemoveJournalDayInput,
) -> EndpointResult<RemoveJournalDayOutput> {
    let journal_id = require("Journal ID", &input.journal_id)?;
    let at = parse_day(&input.date)?;

    let prompt = format!("Remove every entry of journal {} for {}?", journal_id, input.date);
    let confirmed = Confirmation::request(&prompt, |_| input.confirmed)
        .ok_or_else(|| EndpointError::validation("Removal must be explicitly confirmed."))?;

    let removed = journal::remove_journal_entries_for_date(ctx.store.as_ref(), journal_id, &at, confirmed).await?;
    Ok(RemoveJournalDayOutput { removed })
}
