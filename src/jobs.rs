//! The background job registry.
//!
//! Background pipelines are tracked by pid so the interactive loop can reap
//! them opportunistically. Reaping is strictly non-blocking; the loop must
//! never stall behind a running job.

use nix::errno::Errno;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;

/// Fixed capacity of the job table. Exceeding it is non-fatal: the process
/// still runs, it is simply not listed by `jobs`.
pub const MAX_JOBS: usize = 32;

/// One tracked background process: its pid and the command line it came
/// from. An entry is removed exactly once, the moment the process is
/// observed as finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub pid: Pid,
    pub command: String,
}

/// Bounded registry of background jobs, kept dense on removal.
#[derive(Debug, Default)]
pub struct JobTable {
    entries: Vec<Job>,
}

impl JobTable {
    pub fn new() -> Self {
        JobTable {
            entries: Vec::new(),
        }
    }

    /// Track a freshly launched background process.
    ///
    /// At capacity this only emits a warning; the process keeps running
    /// untracked.
    pub fn add(&mut self, pid: Pid, command: &str) {
        if self.entries.len() == MAX_JOBS {
            log::warn!("job table full; pid {pid} runs untracked");
            eprintln!("minish: job table full; {pid} will not appear in jobs");
            return;
        }
        self.entries.push(Job {
            pid,
            command: command.to_string(),
        });
    }

    /// Drop the entry for `pid`, keeping the remaining entries dense.
    pub fn remove(&mut self, pid: Pid) -> Option<Job> {
        let index = self.entries.iter().position(|job| job.pid == pid)?;
        Some(self.entries.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Collect any finished children without blocking, announcing each
    /// tracked one. Called once per interactive iteration, before the
    /// prompt.
    pub fn reap(&mut self) {
        loop {
            match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) => break,
                Ok(status) => {
                    let Some(pid) = status.pid() else { break };
                    // Finished children not in the table were either
                    // squeezed out by a full-table warning or already
                    // handled; nothing more to do for them.
                    if let Some(job) = self.remove(pid) {
                        println!("[done] {} {}", job.pid, job.command);
                    }
                }
                Err(Errno::ECHILD) => break,
                Err(_) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(raw: i32) -> Pid {
        Pid::from_raw(raw)
    }

    #[test]
    fn add_then_remove_round_trips() {
        let mut table = JobTable::new();
        table.add(pid(100), "sleep 10 &");
        assert_eq!(table.len(), 1);

        let job = table.remove(pid(100)).unwrap();
        assert_eq!(job.command, "sleep 10 &");
        assert!(table.is_empty());
    }

    #[test]
    fn remove_unknown_pid_is_none() {
        let mut table = JobTable::new();
        table.add(pid(100), "a");
        assert_eq!(table.remove(pid(999)), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn removal_keeps_entries_dense_and_ordered() {
        let mut table = JobTable::new();
        table.add(pid(1), "a");
        table.add(pid(2), "b");
        table.add(pid(3), "c");
        table.remove(pid(2));

        let pids: Vec<i32> = table.iter().map(|job| job.pid.as_raw()).collect();
        assert_eq!(pids, [1, 3]);
    }

    #[test]
    fn full_table_drops_new_entries_without_failing() {
        let mut table = JobTable::new();
        for i in 0..MAX_JOBS as i32 {
            table.add(pid(1000 + i), "filler");
        }
        assert_eq!(table.len(), MAX_JOBS);

        table.add(pid(9999), "overflow");
        assert_eq!(table.len(), MAX_JOBS);
        assert_eq!(table.remove(pid(9999)), None);
    }
}
