use crate::exec::ExitCode;
use crate::interpreter::Shell;
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed
/// directly in-process without spawning a child process. They run against
/// the shell's own state, which is how `cd` and `exit` can take effect at
/// all.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "cd" or "jobs".
    fn name() -> &'static str;

    /// Executes the command against the shell state, writing to `stdout`.
    ///
    /// Return value should follow shell conventions: 0 for success,
    /// non-zero for error.
    fn execute(self, shell: &mut Shell, stdout: &mut dyn Write) -> Result<ExitCode>;
}

fn run<T: BuiltinCommand>(shell: &mut Shell, name: &str, args: &[&str]) -> ExitCode {
    match T::from_args(&[name], args) {
        Ok(cmd) => match cmd.execute(shell, &mut std::io::stdout()) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("minish: {e:#}");
                1
            }
        },
        // argh reports both --help output and usage errors as EarlyExit.
        Err(EarlyExit { output, status }) => {
            if status.is_err() {
                eprintln!("{output}");
                1
            } else {
                println!("{output}");
                0
            }
        }
    }
}

/// Runs `argv` as a builtin if its name matches one, returning `None` for
/// external commands.
pub fn dispatch(shell: &mut Shell, argv: &[String]) -> Option<ExitCode> {
    let name = argv[0].as_str();
    let args: Vec<&str> = argv[1..].iter().map(String::as_str).collect();
    let code = if name == Cd::name() {
        run::<Cd>(shell, name, &args)
    } else if name == Pwd::name() {
        run::<Pwd>(shell, name, &args)
    } else if name == Exit::name() {
        run::<Exit>(shell, name, &args)
    } else if name == Help::name() {
        run::<Help>(shell, name, &args)
    } else if name == Jobs::name() {
        run::<Jobs>(shell, name, &args)
    } else if name == HistoryCmd::name() {
        run::<HistoryCmd>(shell, name, &args)
    } else if name == Set::name() {
        run::<Set>(shell, name, &args)
    } else {
        return None;
    };
    Some(code)
}

/// True when `name` would be handled by [`dispatch`].
pub fn is_builtin(name: &str) -> bool {
    matches!(
        name,
        "cd" | "pwd" | "exit" | "help" | "jobs" | "history" | "set"
    )
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME environment variable.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory. Defaults to $HOME when omitted.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, shell: &mut Shell, _stdout: &mut dyn Write) -> Result<ExitCode> {
        let target = match &self.target {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => {
                if let Some(home) = shell.env.get_var("HOME") {
                    PathBuf::from(home)
                } else {
                    return Err(anyhow::anyhow!("cd: no target and HOME not set"));
                }
            }
        };

        let new_dir = if target.is_absolute() {
            target
        } else {
            shell.env.current_dir.join(target)
        };

        let canonical = fs::canonicalize(&new_dir)
            .with_context(|| format!("cd: can't canonicalize {}", new_dir.display()))?;

        env::set_current_dir(&canonical)
            .with_context(|| format!("cd: can't chdir to {}", canonical.display()))?;
        shell.env.current_dir = canonical;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(self, shell: &mut Shell, stdout: &mut dyn Write) -> Result<ExitCode> {
        writeln!(stdout, "{}", shell.env.current_dir.to_string_lossy())?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Leave the shell after the current line finishes.
pub struct Exit {
    #[argh(positional)]
    /// exit status to report; defaults to 0.
    pub status: Option<i32>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, shell: &mut Shell, _stdout: &mut dyn Write) -> Result<ExitCode> {
        let status = self.status.unwrap_or(0);
        shell.exit_request = Some(status);
        Ok(status)
    }
}

#[derive(FromArgs)]
/// List the commands handled by the shell itself.
pub struct Help {}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn execute(self, _shell: &mut Shell, stdout: &mut dyn Write) -> Result<ExitCode> {
        writeln!(stdout, "minish, a small interactive shell")?;
        writeln!(stdout, "Type program names and arguments, and hit enter.")?;
        writeln!(stdout)?;
        writeln!(stdout, "The following are built in:")?;
        writeln!(stdout, "  cd [DIR]      change the working directory")?;
        writeln!(stdout, "  pwd           print the working directory")?;
        writeln!(stdout, "  exit [N]      leave the shell")?;
        writeln!(stdout, "  jobs          list background jobs")?;
        writeln!(stdout, "  history       list recent command lines (recall with !N)")?;
        writeln!(stdout, "  set           list shell variables")?;
        writeln!(stdout, "  help          show this text")?;
        writeln!(stdout)?;
        writeln!(stdout, "Use the man command for information on other programs.")?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// List background jobs still being tracked.
pub struct Jobs {}

impl BuiltinCommand for Jobs {
    fn name() -> &'static str {
        "jobs"
    }

    fn execute(self, shell: &mut Shell, stdout: &mut dyn Write) -> Result<ExitCode> {
        for job in shell.jobs.iter() {
            writeln!(stdout, "[{}] {}", job.pid, job.command)?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// List recently entered command lines with their numbers.
pub struct HistoryCmd {}

impl BuiltinCommand for HistoryCmd {
    fn name() -> &'static str {
        "history"
    }

    fn execute(self, shell: &mut Shell, stdout: &mut dyn Write) -> Result<ExitCode> {
        for (number, line) in shell.history.iter() {
            writeln!(stdout, "{number:5}  {line}")?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// List shell variables as NAME=VALUE, sorted by name.
pub struct Set {}

impl BuiltinCommand for Set {
    fn name() -> &'static str {
        "set"
    }

    fn execute(self, shell: &mut Shell, stdout: &mut dyn Write) -> Result<ExitCode> {
        let mut names: Vec<&String> = shell.env.vars.keys().collect();
        names.sort();
        for name in names {
            writeln!(stdout, "{}={}", name, shell.env.vars[name])?;
        }
        Ok(0)
    }
}
