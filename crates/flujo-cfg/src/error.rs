//! Error type for configuration parsing and tree access.

use thiserror::Error;

/// Errors produced by the configuration lexer, parser, and tree accessors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CfgError {
    /// Malformed configuration text.
    #[error("syntax error at {line}:{col}: {msg}")]
    Syntax {
        /// 1-based line of the offending token.
        line: u32,
        /// 1-based column of the offending token.
        col: u32,
        /// What the lexer or parser expected.
        msg: String,
    },

    /// A dictionary member lookup failed.
    #[error("element not found: {0}")]
    NotFound(String),

    /// A node held a different kind than the accessor asked for.
    #[error("type mismatch: {0}")]
    WrongType(String),
}

impl CfgError {
    /// Builds a syntax error at a source position.
    pub fn syntax(line: u32, col: u32, msg: impl Into<String>) -> Self {
        CfgError::Syntax {
            line,
            col,
            msg: msg.into(),
        }
    }
}
