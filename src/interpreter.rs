use crate::builtin;
use crate::command::{CommandFactory, ExitCode, NOT_EXECUTABLE, NOT_FOUND};
use crate::env::Environment;
use crate::error::ShellError;
use crate::external::ExternalCommand;
use crate::lexer::tokenize;
use log::{debug, warn};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, IsTerminal, Write};

/// Text written before every line is read.
pub const PROMPT: &str = "$ ";

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate: built-ins and `ExternalCommand`.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// A minimal shell-like interpreter that can execute built-in and external commands.
///
/// The interpreter owns an [`Environment`] (working directory, variable overrides,
/// exit flag) and a list of [`CommandFactory`] objects that are queried in order to
/// create commands by name. See [`Default`] for the factories included out of the box.
///
/// Example
/// ```
/// use quill_shell::Interpreter;
/// let mut sh = Interpreter::default();
/// let mut out = Vec::new();
/// let code = sh.eval_line_to("echo hello   'big  world'", &mut out).unwrap();
/// assert_eq!(code, 0);
/// assert_eq!(out, b"hello big  world\n");
/// ```
pub struct Interpreter {
    env: Environment,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self {
            env: Environment::new(),
            commands,
        }
    }

    /// Create an interpreter with the default commands over a prepared environment.
    pub fn with_environment(env: Environment) -> Self {
        Self {
            env,
            ..Self::default()
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// True once `exit` has run.
    pub fn should_exit(&self) -> bool {
        self.env.should_exit
    }

    /// Run a single command invocation by name with arguments, writing to stdout.
    pub fn run(&mut self, name: &str, args: &[&str]) -> anyhow::Result<ExitCode> {
        self.run_to(name, args, &mut io::stdout())
    }

    /// Run a single command invocation by name with arguments.
    ///
    /// Built-ins are tried first, then the search path. Lookup and spawn failures are
    /// reported on `out` and turned into a non-zero status; the returned `Err` is only
    /// for failures to write to `out` itself.
    pub fn run_to(
        &mut self,
        name: &str,
        args: &[&str],
        out: &mut dyn Write,
    ) -> anyhow::Result<ExitCode> {
        let Some(cmd) = self
            .commands
            .iter()
            .find_map(|factory| factory.try_create(&self.env, name, args))
        else {
            debug!("{name:?} is neither a builtin nor on PATH");
            writeln!(out, "{}", ShellError::CommandNotFound(name.to_string()))?;
            return Ok(NOT_FOUND);
        };

        debug!("dispatching {name:?} with {args:?}");
        match cmd.execute(out, &mut self.env) {
            Ok(code) => Ok(code),
            Err(err) => match err.downcast_ref::<ShellError>() {
                Some(spawn_err @ ShellError::SpawnFailed { .. }) => {
                    warn!("failed to run {name:?}: {err:#}");
                    writeln!(out, "{spawn_err}")?;
                    Ok(NOT_EXECUTABLE)
                }
                _ => Err(err),
            },
        }
    }

    /// Dispatch an already tokenized command line, writing to stdout.
    pub fn dispatch(&mut self, args: &[String]) -> anyhow::Result<ExitCode> {
        self.dispatch_to(args, &mut io::stdout())
    }

    /// Dispatch an already tokenized command line: `args[0]` is the command name.
    ///
    /// An empty sequence does nothing.
    pub fn dispatch_to(
        &mut self,
        args: &[String],
        out: &mut dyn Write,
    ) -> anyhow::Result<ExitCode> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(0);
        };
        let rest: Vec<&str> = rest.iter().map(|s| s.as_str()).collect();
        self.run_to(name, &rest, out)
    }

    /// Trim, tokenize and dispatch one raw input line, writing to stdout.
    pub fn eval_line(&mut self, line: &str) -> anyhow::Result<ExitCode> {
        self.eval_line_to(line, &mut io::stdout())
    }

    /// Trim, tokenize and dispatch one raw input line. Blank lines are skipped.
    pub fn eval_line_to(
        &mut self,
        line: &str,
        out: &mut dyn Write,
    ) -> anyhow::Result<ExitCode> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(0);
        }
        let args = tokenize(line);
        self.dispatch_to(&args, out)
    }

    /// Read-Eval-Print Loop.
    ///
    /// Prompts with [`PROMPT`], evaluates each line and stops on `exit` or end of input.
    /// Ctrl-C abandons the current line. History is kept in memory only.
    ///
    /// The line editor stays silent when stdin is not a terminal, so the prompt is
    /// written to stdout directly in that case.
    pub fn repl(&mut self) -> rustyline::Result<()> {
        let mut rl = DefaultEditor::new()?;
        let interactive = io::stdin().is_terminal();

        while !self.should_exit() {
            let prompt = if interactive {
                PROMPT
            } else {
                let mut stdout = io::stdout();
                write!(stdout, "{PROMPT}")?;
                stdout.flush()?;
                ""
            };
            match rl.readline(prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    // Exit codes are not carried between lines.
                    if let Err(err) = self.eval_line(&line) {
                        warn!("cannot write command output: {err:#}");
                        return Err(ReadlineError::Io(io::Error::other(err)));
                    }
                    io::stdout().flush()?;
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the default set of commands:
    /// - built-ins: `exit`, `echo`, `type`, `pwd`, `cd`
    /// - external command launcher
    fn default() -> Self {
        let mut commands = builtin::registry();
        commands.push(Box::new(Factory::<ExternalCommand>::default()));
        Self::new(commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn shell_in(dir: &std::path::Path) -> Interpreter {
        Interpreter::with_environment(Environment::with_current_dir(dir))
    }

    fn eval(sh: &mut Interpreter, line: &str) -> (ExitCode, String) {
        let mut out = Vec::new();
        let code = sh.eval_line_to(line, &mut out).unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    fn canonical_temp() -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let canonical = fs::canonicalize(temp.path()).unwrap();
        (temp, canonical)
    }

    #[test]
    fn test_echo_through_tokenizer() {
        let mut sh = shell_in(std::path::Path::new("/"));
        assert_eq!(eval(&mut sh, "echo a b"), (0, "a b\n".to_string()));
        assert_eq!(eval(&mut sh, r#"echo "a  b""#), (0, "a  b\n".to_string()));
        assert_eq!(eval(&mut sh, r"echo foo\ bar"), (0, "foo bar\n".to_string()));
        assert_eq!(eval(&mut sh, "echo 'it''s'"), (0, "its\n".to_string()));
    }

    #[test]
    fn test_blank_lines_do_nothing() {
        let mut sh = shell_in(std::path::Path::new("/"));
        assert_eq!(eval(&mut sh, ""), (0, String::new()));
        assert_eq!(eval(&mut sh, "   \t "), (0, String::new()));
        assert_eq!(sh.dispatch_to(&[], &mut io::sink()).unwrap(), 0);
    }

    #[test]
    fn test_unknown_command_reports_not_found() {
        let (_temp, dir) = canonical_temp();
        let mut sh = shell_in(&dir);
        sh.env_mut().set_var("PATH", "/nowhere");

        assert_eq!(
            eval(&mut sh, "frobnicate --all"),
            (NOT_FOUND, "frobnicate: command not found\n".to_string())
        );
        assert_eq!(sh.env().current_dir, dir);
        assert!(!sh.should_exit());
    }

    #[test]
    fn test_type_through_dispatch() {
        let mut sh = shell_in(std::path::Path::new("/"));
        sh.env_mut().set_var("PATH", "/nowhere");
        assert_eq!(
            eval(&mut sh, "type cd").1,
            "cd is a shell builtin\n".to_string()
        );
        assert_eq!(
            eval(&mut sh, "type nonexistent_cmd_xyz").1,
            "nonexistent_cmd_xyz: not found\n".to_string()
        );
    }

    #[test]
    fn test_failed_cd_keeps_previous_directory() {
        let (_temp, dir) = canonical_temp();
        let mut sh = shell_in(&dir);

        let (code, out) = eval(&mut sh, "cd /nonexistent/path");
        assert_eq!(code, 1);
        assert_eq!(out, "cd: /nonexistent/path: No such file or directory\n");
        assert_eq!(eval(&mut sh, "pwd").1, format!("{}\n", dir.display()));
    }

    #[test]
    fn test_cd_parent_then_pwd() {
        let (_temp, dir) = canonical_temp();
        let child = dir.join("child dir");
        fs::create_dir(&child).unwrap();
        let mut sh = shell_in(&dir);

        eval(&mut sh, "cd 'child dir'");
        assert_eq!(eval(&mut sh, "pwd").1, format!("{}\n", child.display()));

        eval(&mut sh, "cd ..");
        assert_eq!(eval(&mut sh, "pwd").1, format!("{}\n", dir.display()));
    }

    #[test]
    fn test_exit_sets_flag() {
        let mut sh = shell_in(std::path::Path::new("/"));
        assert_eq!(eval(&mut sh, "exit 3"), (0, String::new()));
        assert!(sh.should_exit());
    }

    #[test]
    fn test_builtins_shadow_path() {
        let (_temp, dir) = canonical_temp();
        let mut sh = shell_in(&dir);
        sh.env_mut().set_var("PATH", "/bin:/usr/bin");
        // /bin/echo exists too, but the builtin must answer.
        assert_eq!(
            eval(&mut sh, "type echo").1,
            "echo is a shell builtin\n".to_string()
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_external_command_runs_in_shell_directory() {
        let (_temp, dir) = canonical_temp();
        fs::create_dir(dir.join("work")).unwrap();
        let mut sh = shell_in(&dir);

        eval(&mut sh, "cd work");
        let (code, out) = eval(&mut sh, "sh -c 'touch created; exit 4'");

        assert_eq!(code, 4);
        assert_eq!(out, "");
        assert!(dir.join("work").join("created").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_spawn_failure_is_reported() {
        use std::os::unix::fs::PermissionsExt;

        let (_temp, dir) = canonical_temp();
        // Executable bit set, but the kernel cannot run it.
        let bogus = dir.join("bogus");
        fs::write(&bogus, [0u8, 1, 2, 3]).unwrap();
        fs::set_permissions(&bogus, fs::Permissions::from_mode(0o755)).unwrap();

        let mut sh = shell_in(&dir);
        sh.env_mut().set_var("PATH", dir.to_string_lossy());

        let (code, out) = eval(&mut sh, "bogus");
        assert_eq!(code, NOT_EXECUTABLE);
        assert_eq!(out, "Error executing: bogus\n");
    }
}
