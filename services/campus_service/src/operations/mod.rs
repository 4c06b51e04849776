//! gRPC endpoints. Each function validates the wire input, calls into the domain modules and
//! maps [`CampusError`] onto [`EndpointError`].

pub mod chat;
pub mod groups;
pub mod journal;
pub mod news;
pub mod notifications;
pub mod schedule;
pub mod users;

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use service_core::endpoint_error::EndpointError;
use service_core::operation_error::OperationError;
use thiserror::Error;

use crate::error::CampusError;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CampusOperationError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("{0}")]
    Conflict(String),
}

impl OperationError for CampusOperationError {
    fn code(&self) -> tonic::Code {
        match self {
            Self::NotFound(_) => tonic::Code::NotFound,
            Self::AlreadyExists(_) => tonic::Code::AlreadyExists,
            Self::Conflict(_) => tonic::Code::Aborted,
        }
    }
}

pub type EndpointResult<T> = Result<T, EndpointError<CampusOperationError>>;

impl From<CampusError> for EndpointError<CampusOperationError> {
    fn from(err: CampusError) -> Self {
        match err {
            CampusError::Validation { .. } => EndpointError::validation(err.to_string()),
            CampusError::NotFound { .. } => EndpointError::operation(CampusOperationError::NotFound(err.to_string())),
            CampusError::AlreadyExists(msg) => EndpointError::operation(CampusOperationError::AlreadyExists(msg)),
            CampusError::Conflict(msg) => EndpointError::operation(CampusOperationError::Conflict(msg)),
            CampusError::Remote(err) => {
                log::error!("Store operation failed. Original error: {:?}.", err);
                EndpointError::internal()
            }
        }
    }
}

pub(crate) fn require<'a>(field: &str, value: &'a str) -> EndpointResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(EndpointError::validation(format!("{} is required.", field)));
    }
    Ok(value)
}

/// Accepts `YYYY-MM-DD` (read as UTC midnight) or an RFC 3339 timestamp, whose own offset decides
/// the calendar day.
pub(crate) fn parse_day(raw: &str) -> EndpointResult<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at);
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| EndpointError::validation(format!("Invalid date '{}'.", raw)))?;
    Ok(FixedOffset::east(0).from_utc_datetime(&date.and_hms(0, 0, 0)))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::journal::normalize_day;
    use crate::store::{Collection, StoreError};

    #[rstest]
    #[case("2024-03-01", "2024-03-01")]
    #[case("2024-03-01T23:30:00+02:00", "2024-03-01")]
    #[case("2024-02-29T23:30:00-02:00", "2024-02-29")]
    fn days_parse_in_their_own_offset(#[case] raw: &str, #[case] expected: &str) {
        let day = normalize_day(&parse_day(raw).unwrap());
        assert_eq!(day.format("%Y-%m-%d").to_string(), expected);
    }

    #[test]
    fn garbage_date_is_a_validation_error() {
        assert!(matches!(parse_day("yesterday"), Err(EndpointError::Validation(_))));
    }

    #[rstest]
    #[case(CampusError::validation("grade", "is outside 0..=100"), tonic::Code::InvalidArgument)]
    #[case(CampusError::not_found(Collection::Groups, "g-1"), tonic::Code::NotFound)]
    #[case(CampusError::AlreadyExists("taken".to_owned()), tonic::Code::AlreadyExists)]
    #[case(CampusError::Remote(StoreError::Remote("timeout".into())), tonic::Code::Internal)]
    #[case(
        CampusError::from(StoreError::Conflict { collection: Collection::Groups, id: "g-1".to_owned() }),
        tonic::Code::Aborted
    )]
    fn campus_errors_map_to_codes(#[case] err: CampusError, #[case] code: tonic::Code) {
        assert_eq!(EndpointError::<CampusOperationError>::from(err).code(), code);
    }
}
