use argh::FromArgs;
use log::debug;
use quill_shell::Interpreter;
use std::process::ExitCode;

#[derive(FromArgs)]
/// Interactive command interpreter with a few built-ins (exit, echo, type, pwd, cd).
/// Set RUST_LOG=debug to trace command resolution on stderr.
struct Cli {
    #[argh(option, short = 'c')]
    /// evaluate a single line instead of starting the interactive loop
    command: Option<String>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli: Cli = argh::from_env();
    let mut sh = Interpreter::default();

    if let Some(line) = cli.command {
        debug!("running one-shot command {line:?}");
        return match sh.eval_line(&line) {
            Ok(_) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("{err:#}");
                ExitCode::FAILURE
            }
        };
    }

    match sh.repl() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
