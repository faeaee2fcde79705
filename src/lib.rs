//! A small interactive shell built around a fork/pipe pipeline launcher.
//!
//! This crate provides the pieces of a classic Unix shell: a quote-aware
//! tokenizer, a variable expander, a pipeline parser, a launcher that wires
//! children together with pipes before forking, and a registry of
//! background jobs that is reaped without blocking.
//!
//! The main entry point is [`Shell`], which owns the session state and the
//! interactive loop. The lower layers are exposed as modules so the
//! pipeline machinery can be driven directly, which is how the integration
//! tests use it.

mod builtin;
pub mod env;
pub mod error;
pub mod exec;
mod expand;
pub mod history;
mod interpreter;
pub mod jobs;
pub mod lexer;
pub mod parser;

pub use exec::ExitCode;
pub use interpreter::Shell;
