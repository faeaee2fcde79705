//! Error types for the parse and launch phases.

use nix::errno::Errno;
use std::{error, fmt};

/// Errors produced while turning a token sequence into a pipeline.
///
/// All variants except [`ParseError::EmptyCommand`] are syntax errors: the
/// line is malformed. `EmptyCommand` means the line was well-formed but
/// contained nothing to execute. Either way, zero processes are spawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// A pipe operator with no command on one side (`a | | b`, `| a`, `a |`).
    EmptyPipeSegment,
    /// More stages than the fixed pipeline maximum.
    PipelineTooLong,
    /// `<` or `>` at end of input, or followed by another operator.
    MissingRedirectTarget,
    /// A stage's argv exceeds the fixed argument maximum.
    TooManyArguments,
    /// `&` somewhere other than the final token.
    UnexpectedBackground,
    /// Tokens were present but no command formed (e.g. a bare `< file`).
    EmptyCommand,
}

impl ParseError {
    /// Whether this is a malformed-input error, as opposed to "nothing to
    /// do".
    pub fn is_syntax(&self) -> bool {
        !matches!(self, ParseError::EmptyCommand)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::EmptyPipeSegment => {
                write!(f, "syntax error: empty command between pipes")
            }
            ParseError::PipelineTooLong => {
                write!(f, "syntax error: too many pipeline stages")
            }
            ParseError::MissingRedirectTarget => {
                write!(f, "syntax error: redirection requires a file name")
            }
            ParseError::TooManyArguments => {
                write!(f, "syntax error: too many arguments in command")
            }
            ParseError::UnexpectedBackground => {
                write!(f, "syntax error: '&' is only allowed at the end of a command")
            }
            ParseError::EmptyCommand => write!(f, "no command to execute"),
        }
    }
}

impl error::Error for ParseError {}

/// Resource errors while materializing a pipeline as processes.
///
/// Either way nothing is left behind: pipe descriptors are released and any
/// children forked before the failure have been waited for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchError {
    /// A pipe could not be allocated; nothing was spawned.
    PipeAllocation(Errno),
    /// `fork` failed partway through the stage list.
    Fork(Errno),
}

impl fmt::Display for LaunchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchError::PipeAllocation(errno) => {
                write!(f, "cannot allocate pipe: {errno}")
            }
            LaunchError::Fork(errno) => write!(f, "cannot fork: {errno}"),
        }
    }
}

impl error::Error for LaunchError {}
