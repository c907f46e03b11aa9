use thiserror::Error;

pub type CompileResult<T> = Result<T, CompileError>;

/// Malformed MDX. Always recoverable: the pipeline turns it into an inline message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Unterminated code fence opened on line {line}")]
    UnterminatedFence { line: usize },

    #[error("Unclosed tag <{name}> opened on line {line}")]
    UnclosedTag { name: String, line: usize },

    #[error("Expected closing tag </{expected}> on line {line}, found </{found}>")]
    MismatchedTag {
        expected: String,
        found: String,
        line: usize,
    },

    #[error("Unexpected closing tag </{name}> on line {line}")]
    UnexpectedClosingTag { name: String, line: usize },

    #[error("Unbalanced braces in expression starting on line {line}")]
    UnbalancedExpression { line: usize },

    #[error("Compiler failure: {0}")]
    Internal(String),
}

impl CompileError {
    /// Shift line numbers by the lines consumed before the compiled body
    pub fn offset_lines(self, offset: usize) -> Self {
        match self {
            Self::UnterminatedFence { line } => Self::UnterminatedFence { line: line + offset },
            Self::UnclosedTag { name, line } => Self::UnclosedTag {
                name,
                line: line + offset,
            },
            Self::MismatchedTag {
                expected,
                found,
                line,
            } => Self::MismatchedTag {
                expected,
                found,
                line: line + offset,
            },
            Self::UnexpectedClosingTag { name, line } => Self::UnexpectedClosingTag {
                name,
                line: line + offset,
            },
            Self::UnbalancedExpression { line } => Self::UnbalancedExpression { line: line + offset },
            Self::Internal(message) => Self::Internal(message),
        }
    }
}
