//! Background launch and reaping.
//!
//! This lives in its own test binary on purpose: reaping waits on any child
//! of the process, so it must not share a process with tests that fork
//! their own foreground children.

use minish::Shell;
use std::time::{Duration, Instant};

#[test]
fn background_job_returns_immediately_and_is_reaped() {
    let mut shell = Shell::new();

    let status = shell.execute_line("sleep 0.3 &");
    assert_eq!(status, 0);
    // The call came back with the child still registered and unreaped,
    // which is exactly what a non-blocking launch looks like.
    assert_eq!(shell.jobs.len(), 1);
    let job = shell.jobs.iter().next().unwrap();
    assert_eq!(job.command, "sleep 0.3 &");

    // Poll the non-blocking reap until the child is collected.
    let deadline = Instant::now() + Duration::from_secs(5);
    while !shell.jobs.is_empty() {
        assert!(Instant::now() < deadline, "background job never reaped");
        shell.jobs.reap();
        std::thread::sleep(Duration::from_millis(20));
    }
}
