//! Shared error type across vitals crates.

use thiserror::Error;

/// Stable error codes (reported to the collector and used by tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid input / malformed payload or config.
    BadRequest,
    /// Not available on this platform or build.
    Unsupported,
    /// A raw counter read failed.
    Sampling,
    /// The profiler collaborator failed.
    Profiling,
    /// A CPU profile is already running.
    ProfilerBusy,
    /// Transport collaborator failed.
    Transport,
    /// No action registered under that name.
    UnknownAction,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in error reports.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::Unsupported => "UNSUPPORTED",
            ErrorCode::Sampling => "SAMPLING",
            ErrorCode::Profiling => "PROFILING",
            ErrorCode::ProfilerBusy => "PROFILER_BUSY",
            ErrorCode::Transport => "TRANSPORT",
            ErrorCode::UnknownAction => "UNKNOWN_ACTION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, VitalsError>;

/// Unified error type used by core and agent.
#[derive(Debug, Error)]
pub enum VitalsError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("sampling failed: {0}")]
    Sampling(String),
    #[error("profiling failed: {0}")]
    Profiling(String),
    #[error("cpu profiling already active")]
    ProfilerBusy,
    #[error("transport: {0}")]
    Transport(String),
    #[error("unknown action: {0}")]
    UnknownAction(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl VitalsError {
    /// Map the error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            VitalsError::BadRequest(_) => ErrorCode::BadRequest,
            VitalsError::Unsupported(_) => ErrorCode::Unsupported,
            VitalsError::Sampling(_) => ErrorCode::Sampling,
            VitalsError::Profiling(_) => ErrorCode::Profiling,
            VitalsError::ProfilerBusy => ErrorCode::ProfilerBusy,
            VitalsError::Transport(_) => ErrorCode::Transport,
            VitalsError::UnknownAction(_) => ErrorCode::UnknownAction,
            VitalsError::Internal(_) => ErrorCode::Internal,
        }
    }
}
