use crate::builtin;
use crate::env::Environment;
use crate::exec::{self, ExitCode};
use crate::expand;
use crate::history::History;
use crate::jobs::JobTable;
use crate::lexer;
use crate::parser::{self, Pipeline};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

/// Split a line on `;` separators, honoring quote spans the same way the
/// tokenizer does, so a quoted `;` stays part of its word.
fn split_segments(line: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;
    for (i, ch) in line.char_indices() {
        match quote {
            Some(closing) if ch == closing => quote = None,
            Some(_) => {}
            None => match ch {
                '\'' | '"' => quote = Some(ch),
                ';' => {
                    segments.push(&line[start..i]);
                    start = i + 1;
                }
                _ => {}
            },
        }
    }
    segments.push(&line[start..]);
    segments
}

/// The interactive shell: session state plus the read-eval loop.
///
/// One `Shell` owns the variable environment, the background job table and
/// the command history for a whole session. Lines can also be fed to it
/// directly with [`Shell::execute_line`], which is how `-c` and the tests
/// drive it.
pub struct Shell {
    pub env: Environment,
    pub jobs: JobTable,
    pub history: History,
    /// Set by the `exit` builtin; checked between segments and before each
    /// prompt.
    pub exit_request: Option<ExitCode>,
}

impl Shell {
    pub fn new() -> Self {
        Shell {
            env: Environment::new(),
            jobs: JobTable::new(),
            history: History::new(),
            exit_request: None,
        }
    }

    /// Execute one input line, which may chain several commands with `;`.
    ///
    /// Returns the exit status of the last command run. Errors in one
    /// segment are reported and do not stop the following segments, but an
    /// `exit` request does.
    pub fn execute_line(&mut self, line: &str) -> ExitCode {
        let mut status = 0;
        for segment in split_segments(line) {
            status = self.execute_segment(segment);
            if self.exit_request.is_some() {
                break;
            }
        }
        status
    }

    fn execute_segment(&mut self, segment: &str) -> ExitCode {
        let tokens = lexer::split_into_tokens(segment);
        if tokens.is_empty() {
            return 0;
        }
        let tokens = expand::expand(tokens, &mut self.env);
        // A line of nothing but assignments mutates the environment and
        // runs no command.
        if tokens.is_empty() {
            return 0;
        }
        let pipeline = match parser::parse(tokens) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                eprintln!("minish: {e}");
                return if e.is_syntax() { 2 } else { 1 };
            }
        };
        log::debug!(
            "pipeline of {} stage(s), background={}",
            pipeline.stages.len(),
            pipeline.background
        );
        self.run_pipeline(&pipeline, segment.trim())
    }

    fn run_pipeline(&mut self, pipeline: &Pipeline, text: &str) -> ExitCode {
        if let Some(code) = self.try_fast_path(pipeline) {
            return code;
        }
        let children = match exec::launch(pipeline) {
            Ok(children) => children,
            Err(e) => {
                eprintln!("minish: {e}");
                return 1;
            }
        };
        if pipeline.background {
            for pid in &children {
                self.jobs.add(*pid, text);
            }
            0
        } else {
            exec::wait_foreground(&children)
        }
    }

    /// Run a lone, unredirected builtin in-process.
    ///
    /// This is the only way `cd`, `exit` and friends can touch shell state.
    /// A builtin inside a pipeline or behind a redirection goes through the
    /// general launch path and runs in a child, where it affects nothing.
    fn try_fast_path(&mut self, pipeline: &Pipeline) -> Option<ExitCode> {
        let [stage] = pipeline.stages.as_slice() else {
            return None;
        };
        if stage.infile.is_some() || stage.outfile.is_some() {
            return None;
        }
        builtin::dispatch(self, &stage.argv)
    }

    /// Recall history entry `!n`, echoing the expanded line the way the
    /// interactive loop would before running it.
    fn recall(&mut self, line: &str) -> Option<String> {
        // Whitespace between `!` and the number is tolerated.
        let request = line.trim().strip_prefix('!')?.trim();
        let n: usize = match request.parse() {
            Ok(n) => n,
            Err(_) => {
                eprintln!("minish: !{request}: event not found");
                return None;
            }
        };
        match self.history.get(n) {
            Some(entry) => Some(entry.to_string()),
            None => {
                eprintln!("minish: !{n}: event not found");
                None
            }
        }
    }

    /// The interactive read-eval loop. Returns the session's exit status.
    pub fn repl(&mut self) -> anyhow::Result<ExitCode> {
        let mut rl = DefaultEditor::new()?;
        loop {
            self.jobs.reap();
            match rl.readline("minish> ") {
                Ok(line) => {
                    let line = if line.trim_start().starts_with('!') {
                        match self.recall(&line) {
                            Some(expanded) => {
                                println!("{expanded}");
                                expanded
                            }
                            None => continue,
                        }
                    } else {
                        line
                    };
                    rl.add_history_entry(line.as_str())?;
                    self.history.add(&line);
                    self.execute_line(&line);
                    if let Some(status) = self.exit_request {
                        return Ok(status);
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => return Ok(0),
                Err(err) => return Err(err.into()),
            }
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_line_is_a_silent_success() {
        let mut shell = Shell::new();
        assert_eq!(shell.execute_line(""), 0);
        assert_eq!(shell.execute_line("   \t "), 0);
    }

    #[test]
    fn pure_assignment_mutates_env_and_runs_nothing() {
        let mut shell = Shell::new();
        assert_eq!(shell.execute_line("GREETING=hello"), 0);
        assert_eq!(shell.env.get_var("GREETING"), Some("hello".to_string()));
    }

    #[test]
    fn syntax_error_reports_status_two() {
        let mut shell = Shell::new();
        assert_eq!(shell.execute_line("| cat"), 2);
    }

    #[test]
    fn quoted_semicolon_is_not_a_separator() {
        let mut shell = Shell::new();
        assert_eq!(shell.execute_line("X='a;b'"), 0);
        assert_eq!(shell.env.get_var("X"), Some("a;b".to_string()));

        assert_eq!(shell.execute_line("Y=\"1;2\"; Z=3"), 0);
        assert_eq!(shell.env.get_var("Y"), Some("1;2".to_string()));
        assert_eq!(shell.env.get_var("Z"), Some("3".to_string()));
    }

    #[test]
    fn segment_split_honors_quote_spans() {
        assert_eq!(split_segments("a; b ;c"), ["a", " b ", "c"]);
        assert_eq!(split_segments("echo 'a;b'"), ["echo 'a;b'"]);
        assert_eq!(split_segments("echo \"x;y\"; pwd"), ["echo \"x;y\"", " pwd"]);
        // An unterminated quote consumes to end of line, as in the lexer.
        assert_eq!(split_segments("echo 'a;b"), ["echo 'a;b"]);
    }

    #[test]
    fn semicolon_chains_run_every_segment() {
        let mut shell = Shell::new();
        let status = shell.execute_line("A=1; B=2");
        assert_eq!(status, 0);
        assert_eq!(shell.env.get_var("A"), Some("1".to_string()));
        assert_eq!(shell.env.get_var("B"), Some("2".to_string()));
    }

    #[test]
    fn exit_stops_remaining_segments() {
        let mut shell = Shell::new();
        shell.execute_line("exit 7; A=after");
        assert_eq!(shell.exit_request, Some(7));
        assert_eq!(shell.env.vars.get("A"), None);
    }

    #[test]
    fn builtin_fast_path_reaches_shell_state() {
        let mut shell = Shell::new();
        let before = shell.env.current_dir.clone();
        assert_eq!(shell.execute_line("pwd"), 0);
        assert_eq!(shell.env.current_dir, before);
    }

    #[test]
    fn recall_finds_existing_entry() {
        let mut shell = Shell::new();
        shell.history.add("echo hi");
        assert_eq!(shell.recall("!1"), Some("echo hi".to_string()));
        assert_eq!(shell.recall("! 1"), Some("echo hi".to_string()));
        assert_eq!(shell.recall("!2"), None);
        assert_eq!(shell.recall("!nope"), None);
    }
}
