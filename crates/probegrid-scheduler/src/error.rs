//! Scheduler error types.

use thiserror::Error;

/// Errors that can occur during scheduling operations.
///
/// Nothing here aborts a submission once a request ID is allocated: the
/// façade logs these and keeps going (dispatch) or answers empty (pulls).
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("no frontend registered for application: {0}")]
    UnknownApplication(String),

    #[error("no pending reservations for request: {0}")]
    UnknownRequest(String),

    #[error("invalid task placement for request {request_id}: {detail}")]
    Protocol { request_id: String, detail: String },

    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
