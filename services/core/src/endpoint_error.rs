use std::error::Error;
use std::fmt::Display;

use strum::AsRefStr;
use tonic::{Code, Status};

use crate::operation_error::OperationError;

/// Error returned by every gRPC endpoint.
///
/// Validation failures are reported before anything is written. Internal errors are logged by
/// whoever produces them and reach the caller without details.
#[derive(Debug, AsRefStr)]
pub enum EndpointError<E: OperationError> {
    Validation(String),
    Internal,
    Operation(E),
}

impl<E: OperationError> EndpointError<E> {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal() -> Self {
        Self::Internal
    }

    pub fn operation(err: E) -> Self {
        Self::Operation(err)
    }
}

impl<E: OperationError> OperationError for EndpointError<E> {
    fn code(&self) -> Code {
        match self {
            EndpointError::Validation(_) => Code::InvalidArgument,
            EndpointError::Internal => Code::Internal,
            EndpointError::Operation(e) => e.code(),
        }
    }
}

impl<E: OperationError> Error for EndpointError<E> {}

impl<E: OperationError> Display for EndpointError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind: &str = self.as_ref();
        let msg = match self {
            EndpointError::Validation(msg) => msg.clone(),
            EndpointError::Internal => String::from("Internal server error."),
            EndpointError::Operation(err) => err.to_string(),
        };

        write!(f, "{}: {}", kind, msg)
    }
}

impl<E: OperationError> From<EndpointError<E>> for Status {
    fn from(err: EndpointError<E>) -> Self {
        Status::new(err.code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("Group not found.")]
    struct GroupNotFound;

    impl OperationError for GroupNotFound {
        fn code(&self) -> Code {
            Code::NotFound
        }
    }

    #[rstest]
    #[case(EndpointError::validation("Grade out of range."), Code::InvalidArgument)]
    #[case(EndpointError::internal(), Code::Internal)]
    #[case(EndpointError::operation(GroupNotFound), Code::NotFound)]
    fn maps_to_grpc_code(#[case] err: EndpointError<GroupNotFound>, #[case] expected: Code) {
        let status: Status = err.into();
        assert_eq!(status.code(), expected);
    }

    #[test]
    fn message_carries_kind_and_detail() {
        let err: EndpointError<GroupNotFound> = EndpointError::validation("Grade out of range.");
        assert_eq!(err.to_string(), "Validation: Grade out of range.");

        let err: EndpointError<GroupNotFound> = EndpointError::operation(GroupNotFound);
        assert_eq!(err.to_string(), "Operation: Group not found.");
    }
}
