use argh::FromArgs;
use minish::Shell;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

#[derive(FromArgs)]
/// A small interactive shell.
struct Args {
    /// run a single command line instead of starting the interactive loop
    #[argh(option, short = 'c')]
    command: Option<String>,

    /// enable debug logging to stderr
    #[argh(switch, short = 'v')]
    verbose: bool,
}

fn main() {
    let args: Args = argh::from_env();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );

    let mut shell = Shell::new();
    let status = match args.command {
        Some(line) => {
            let code = shell.execute_line(&line);
            shell.exit_request.unwrap_or(code)
        }
        None => match shell.repl() {
            Ok(code) => code,
            Err(e) => {
                eprintln!("minish: {e:#}");
                1
            }
        },
    };
    std::process::exit(status);
}
