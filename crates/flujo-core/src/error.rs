//! The error taxonomy shared by every flujo crate.

use thiserror::Error;

/// Workspace-wide result alias.
pub type Result<T, E = FlowError> = std::result::Result<T, E>;

/// The fixed error taxonomy of the flujo engine.
///
/// Every fallible operation in the workspace reports one of these codes;
/// composite operations log and return the first error they hit. [`Eof`]
/// doubles as the end-of-stream sentinel returned by non-real-time
/// procedures when their input is exhausted.
///
/// [`Eof`]: FlowError::Eof
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// An argument value was out of range or malformed.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// A numeric identifier did not resolve.
    #[error("invalid id: {0}")]
    InvalidId(String),

    /// A labelled element lookup failed.
    #[error("element not found: {0}")]
    EleNotFound(String),

    /// An element with the same identity already exists.
    #[error("duplicate element: {0}")]
    Duplicate(String),

    /// A value could not be coerced to the destination type.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// The operation is not legal in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A resource allocation failed.
    #[error("allocation failed: {0}")]
    AllocFail(String),

    /// A bounded buffer or queue could not accept the payload.
    #[error("buffer too small: {0}")]
    BufTooSmall(String),

    /// A file or device could not be opened.
    #[error("open failed: {0}")]
    OpenFail(String),

    /// A read from a file or device failed.
    #[error("read failed: {0}")]
    ReadFail(String),

    /// A write to a file or device failed.
    #[error("write failed: {0}")]
    WriteFail(String),

    /// End of stream / end of program.
    #[error("end of stream")]
    Eof,

    /// Malformed configuration text.
    #[error("syntax error at {line}:{col}: {msg}")]
    Syntax {
        /// 1-based source line.
        line: u32,
        /// 1-based source column.
        col: u32,
        /// What was expected.
        msg: String,
    },

    /// A composite operation failed; the cause was already logged.
    #[error("operation failed: {0}")]
    OpFail(String),

    /// A reachable but unfinished path.
    #[error("not implemented: {0}")]
    NotImpl(String),
}

impl FlowError {
    /// A short stable code string, used by the CLI's one-line reports.
    pub fn code(&self) -> &'static str {
        match self {
            FlowError::InvalidArg(_) => "invalid-arg",
            FlowError::InvalidId(_) => "invalid-id",
            FlowError::EleNotFound(_) => "not-found",
            FlowError::Duplicate(_) => "duplicate",
            FlowError::TypeMismatch(_) => "type-mismatch",
            FlowError::InvalidState(_) => "invalid-state",
            FlowError::AllocFail(_) => "alloc-fail",
            FlowError::BufTooSmall(_) => "buf-too-small",
            FlowError::OpenFail(_) => "open-fail",
            FlowError::ReadFail(_) => "read-fail",
            FlowError::WriteFail(_) => "write-fail",
            FlowError::Eof => "eof",
            FlowError::Syntax { .. } => "syntax",
            FlowError::OpFail(_) => "op-fail",
            FlowError::NotImpl(_) => "not-impl",
        }
    }
}

impl From<flujo_cfg::CfgError> for FlowError {
    fn from(e: flujo_cfg::CfgError) -> Self {
        match e {
            flujo_cfg::CfgError::Syntax { line, col, msg } => FlowError::Syntax { line, col, msg },
            flujo_cfg::CfgError::NotFound(s) => FlowError::EleNotFound(s),
            flujo_cfg::CfgError::WrongType(s) => FlowError::TypeMismatch(s),
        }
    }
}
