//! Process launch: turning a validated [`Pipeline`] into an OS process
//! topology.
//!
//! The ordering discipline here is the heart of the shell. All connecting
//! pipes are allocated before the first fork, so every child can see every
//! descriptor it must wire up or close. Setup is all-or-nothing: a pipe
//! allocation failure releases everything and spawns nothing, and a fork
//! failure partway through closes the remaining descriptors and waits for
//! every child already forked, so no zombie or leaked descriptor survives a
//! partial launch.

use crate::error::LaunchError;
use crate::parser::{Pipeline, Stage};
use anyhow::Context;
use nix::libc::{STDIN_FILENO, STDOUT_FILENO};
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{self, ForkResult, Pid};
use std::convert::Infallible;
use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::os::fd::{AsRawFd, IntoRawFd, OwnedFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure,
/// mirroring the convention used by POSIX shells.
pub type ExitCode = i32;

/// Permission bits for files created by `>` redirection.
const REDIRECT_CREATE_MODE: u32 = 0o644;

/// Where a stage's standard input comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum StageInput {
    /// No pipe and no redirect: the shell's own stdin.
    Inherited,
    /// The read end of the pipe feeding this stage.
    Pipe(RawFd),
    /// Explicit `< file`; always wins over pipe wiring.
    File(PathBuf),
}

/// Where a stage's standard output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
enum StageOutput {
    /// No pipe and no redirect: the shell's own stdout.
    Inherited,
    /// The write end of the pipe draining this stage.
    Pipe(RawFd),
    /// Explicit `> file`; always wins over pipe wiring.
    File(PathBuf),
}

/// Decide a stage's stdin/stdout sources.
///
/// Pure decision table, so the precedence rule (explicit redirection beats
/// pipe wiring) is testable without forking anything. `pipes[i]` connects
/// stage `i` to stage `i + 1`.
fn wire_stage(
    index: usize,
    count: usize,
    stage: &Stage,
    pipes: &[(RawFd, RawFd)],
) -> (StageInput, StageOutput) {
    let input = match (&stage.infile, index) {
        (Some(path), _) => StageInput::File(path.clone()),
        (None, 0) => StageInput::Inherited,
        (None, i) => StageInput::Pipe(pipes[i - 1].0),
    };
    let output = match (&stage.outfile, index + 1 == count) {
        (Some(path), _) => StageOutput::File(path.clone()),
        (None, true) => StageOutput::Inherited,
        (None, false) => StageOutput::Pipe(pipes[index].1),
    };
    (input, output)
}

/// Child-side setup and exec. Only returns on failure.
fn wire_and_exec(
    stage: &Stage,
    input: StageInput,
    output: StageOutput,
    pipes: &[(RawFd, RawFd)],
) -> anyhow::Result<Infallible> {
    match input {
        StageInput::Inherited => {}
        StageInput::Pipe(fd) => {
            unistd::dup2(fd, STDIN_FILENO)?;
        }
        StageInput::File(path) => {
            let file = File::open(&path).with_context(|| path.display().to_string())?;
            let fd = file.into_raw_fd();
            unistd::dup2(fd, STDIN_FILENO)?;
            unistd::close(fd)?;
        }
    }
    match output {
        StageOutput::Inherited => {}
        StageOutput::Pipe(fd) => {
            unistd::dup2(fd, STDOUT_FILENO)?;
        }
        StageOutput::File(path) => {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(REDIRECT_CREATE_MODE)
                .open(&path)
                .with_context(|| path.display().to_string())?;
            let fd = file.into_raw_fd();
            unistd::dup2(fd, STDOUT_FILENO)?;
            unistd::close(fd)?;
        }
    }

    // Close every pipe end, used or not. A write end leaked into a
    // downstream reader keeps that reader from ever seeing end-of-input.
    for (read_fd, write_fd) in pipes {
        let _ = unistd::close(*read_fd);
        let _ = unistd::close(*write_fd);
    }

    let argv: Vec<CString> = stage
        .argv
        .iter()
        .map(|arg| CString::new(arg.as_str()))
        .collect::<Result<_, _>>()?;
    unistd::execvp(&argv[0], &argv)?;
    unreachable!("execvp returned without an error")
}

/// Replace this child's image with the stage's program. Never returns; on
/// any failure a diagnostic goes to stderr and the child exits 127.
fn exec_stage(stage: &Stage, input: StageInput, output: StageOutput, pipes: &[(RawFd, RawFd)]) -> ! {
    let err = match wire_and_exec(stage, input, output, pipes) {
        Err(err) => err,
        Ok(never) => match never {},
    };
    eprintln!("minish: {}: {err:#}", stage.argv[0]);
    std::process::exit(127);
}

/// Fork one child per stage, wired through freshly allocated pipes.
///
/// Returns the child pids in stage order without waiting for any of them;
/// the caller decides between foreground waiting and background
/// registration. On error nothing is left running and no descriptor stays
/// open.
pub fn launch(pipeline: &Pipeline) -> Result<Vec<Pid>, LaunchError> {
    let count = pipeline.stages.len();

    let mut pipes: Vec<(OwnedFd, OwnedFd)> = Vec::with_capacity(count.saturating_sub(1));
    for _ in 1..count {
        match unistd::pipe() {
            Ok(ends) => pipes.push(ends),
            // Dropping the vec closes every pipe allocated so far.
            Err(errno) => return Err(LaunchError::PipeAllocation(errno)),
        }
    }
    let raw: Vec<(RawFd, RawFd)> = pipes
        .iter()
        .map(|(r, w)| (r.as_raw_fd(), w.as_raw_fd()))
        .collect();

    let mut children: Vec<Pid> = Vec::with_capacity(count);
    for (index, stage) in pipeline.stages.iter().enumerate() {
        let (input, output) = wire_stage(index, count, stage, &raw);
        match unsafe { unistd::fork() } {
            Ok(ForkResult::Child) => exec_stage(stage, input, output, &raw),
            Ok(ForkResult::Parent { child }) => {
                log::debug!("stage {index} ({}) forked as pid {child}", stage.argv[0]);
                children.push(child);
            }
            Err(errno) => {
                // Close our pipe ends first so already-running children can
                // reach end-of-input, then wait for each of them.
                drop(pipes);
                for pid in &children {
                    let _ = waitpid(*pid, None);
                }
                return Err(LaunchError::Fork(errno));
            }
        }
    }

    // Once every stage holds its own copies, the parent's pipe ends only
    // stand in the way of end-of-file propagation.
    drop(pipes);
    Ok(children)
}

/// Block until every child of a foreground pipeline has terminated.
///
/// The pipeline's status is the final stage's exit status; earlier stages
/// are collected but their failures are not aggregated. A child killed by
/// a signal reports 128 plus the signal number.
pub fn wait_foreground(children: &[Pid]) -> ExitCode {
    let mut status: ExitCode = 0;
    for &pid in children {
        status = match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => code,
            Ok(WaitStatus::Signaled(_, signal, _)) => 128 + signal as ExitCode,
            Ok(_) | Err(_) => 1,
        };
    }
    status
}
