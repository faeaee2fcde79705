//! Pipeline parsing: token sequence → validated [`Pipeline`].
//!
//! Stages and pipelines are plain value types built by a pure function, so
//! everything up to the launch step runs without touching the OS.

use crate::error::ParseError;
use crate::lexer::Token;
use std::path::PathBuf;

/// Maximum number of stages in one pipeline.
pub const MAX_STAGES: usize = 16;
/// Maximum argv entries in one stage.
pub const MAX_ARGS: usize = 64;

/// One command within a pipeline: its argument vector plus optional
/// redirections. `argv` is non-empty once the stage is finalized; when a
/// redirection is given twice for the same direction, the last occurrence
/// wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stage {
    /// Command name and arguments, `argv[0]` being the program.
    pub argv: Vec<String>,
    /// Explicit stdin redirection (`< file`).
    pub infile: Option<PathBuf>,
    /// Explicit stdout redirection (`> file`).
    pub outfile: Option<PathBuf>,
}

/// An ordered chain of stages connected by inter-process pipes, with a flag
/// for background execution.
///
/// Invariant: 1..=[`MAX_STAGES`] stages, none with an empty argv.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
    /// Set by a trailing `&`: launch without waiting.
    pub background: bool,
}

struct PipelineBuilder {
    tokens: Vec<Token>,
    pos: usize,
    stages: Vec<Stage>,
    current: Stage,
    background: bool,
}

impl PipelineBuilder {
    fn from(tokens: Vec<Token>) -> Self {
        PipelineBuilder {
            tokens,
            pos: 0,
            stages: Vec::new(),
            current: Stage::default(),
            background: false,
        }
    }

    fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Close the current stage in front of a `|`.
    fn close_stage(&mut self) -> Result<(), ParseError> {
        if self.current.argv.is_empty() {
            return Err(ParseError::EmptyPipeSegment);
        }
        self.stages.push(std::mem::take(&mut self.current));
        // The pipe guarantees at least one more stage.
        if self.stages.len() == MAX_STAGES {
            return Err(ParseError::PipelineTooLong);
        }
        Ok(())
    }

    /// Consume the word following `<`/`>` as the redirect target.
    fn redirect_target(&mut self) -> Result<PathBuf, ParseError> {
        match self.consume() {
            Some(Token::Word(name)) => Ok(PathBuf::from(name)),
            _ => Err(ParseError::MissingRedirectTarget),
        }
    }

    fn build(mut self) -> Result<Pipeline, ParseError> {
        while let Some(token) = self.consume() {
            match token {
                Token::Word(word) => {
                    if self.current.argv.len() == MAX_ARGS {
                        return Err(ParseError::TooManyArguments);
                    }
                    self.current.argv.push(word);
                }
                Token::Pipe => self.close_stage()?,
                Token::RedirectIn => self.current.infile = Some(self.redirect_target()?),
                Token::RedirectOut => self.current.outfile = Some(self.redirect_target()?),
                Token::Background => {
                    if !self.at_end() {
                        return Err(ParseError::UnexpectedBackground);
                    }
                    self.background = true;
                }
            }
        }

        if self.current.argv.is_empty() {
            // `a |` leaves a dangling pipe; with no completed stage at all
            // there is simply nothing to run.
            if self.stages.is_empty() {
                return Err(ParseError::EmptyCommand);
            }
            return Err(ParseError::EmptyPipeSegment);
        }
        self.stages.push(self.current);

        Ok(Pipeline {
            stages: self.stages,
            background: self.background,
        })
    }
}

/// Parse an expanded token sequence into a [`Pipeline`].
///
/// The scan runs left to right, accumulating words into the current stage's
/// argv; `|` closes a stage, `<`/`>` consume exactly one following word as
/// the file name. Zero processes are spawned on any error.
pub fn parse(tokens: Vec<Token>) -> Result<Pipeline, ParseError> {
    PipelineBuilder::from(tokens).build()
}
