use std::error::Error;

use tonic::Code;

/// Failure specific to one service's operations, e.g. a missing document or a duplicate email.
///
/// Wrapped by [`crate::endpoint_error::EndpointError::Operation`], which asks it for the gRPC code.
pub trait OperationError: Error {
    fn code(&self) -> Code;
}
