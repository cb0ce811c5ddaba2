use crate::command::{CommandFactory, ExecutableCommand, ExitCode, NOT_FOUND};
use crate::env::Environment;
use crate::error::ShellError;
use crate::external::find_command_path;
use crate::interpreter::Factory;
use anyhow::Result;
use log::debug;
use std::io::Write;
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are executed directly in-process without spawning a child process and
/// never consult the search path to find themselves.
pub(crate) trait BuiltinCommand: Sized {
    /// Canonical name of the command, e.g. "echo" or "cd".
    fn name() -> &'static str;

    /// Builds the command from the words following its name.
    fn parse(args: &[&str]) -> Self;

    /// Executes the command using the provided output stream and environment.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        match BuiltinCommand::execute(*self, stdout, env) {
            Ok(x) => Ok(x),
            Err(e) => {
                writeln!(stdout, "{e}")?;
                Ok(1)
            }
        }
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        if name == T::name() {
            Some(Box::new(T::parse(args)))
        } else {
            None
        }
    }

    fn builtin_name(&self) -> Option<&'static str> {
        Some(T::name())
    }
}

/// The built-in table, one factory per built-in.
pub(crate) fn registry() -> Vec<Box<dyn CommandFactory>> {
    vec![
        Box::new(Factory::<Exit>::default()),
        Box::new(Factory::<Echo>::default()),
        Box::new(Factory::<Type>::default()),
        Box::new(Factory::<Pwd>::default()),
        Box::new(Factory::<Cd>::default()),
    ]
}

/// Whether `name` is one of the shell's built-ins.
pub fn is_builtin(name: &str) -> bool {
    registry()
        .iter()
        .any(|factory| factory.builtin_name() == Some(name))
}

fn first_arg(args: &[&str]) -> Option<String> {
    args.first().map(|arg| arg.to_string())
}

/// Stop the shell with status 0. Arguments are ignored.
pub struct Exit;

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn parse(_args: &[&str]) -> Self {
        Exit
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        env.should_exit = true;
        Ok(0)
    }
}

/// Write the arguments to standard output, separated by spaces, with a trailing newline.
pub struct Echo {
    pub args: Vec<String>,
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn parse(args: &[&str]) -> Self {
        Echo {
            args: args.iter().map(|arg| arg.to_string()).collect(),
        }
    }

    fn execute(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        writeln!(stdout, "{}", self.args.join(" "))?;
        Ok(0)
    }
}

/// Tell how a name would be interpreted: built-in, executable on PATH, or nothing.
pub struct Type {
    pub target: Option<String>,
}

impl BuiltinCommand for Type {
    fn name() -> &'static str {
        "type"
    }

    fn parse(args: &[&str]) -> Self {
        Type {
            target: first_arg(args),
        }
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let Some(target) = self.target else {
            return Ok(0);
        };

        if is_builtin(&target) {
            writeln!(stdout, "{target} is a shell builtin")?;
            return Ok(0);
        }

        match find_command_path(env, &target) {
            Some(path) => {
                writeln!(stdout, "{target} is {}", path.display())?;
                Ok(0)
            }
            None => {
                writeln!(stdout, "{target}: not found")?;
                Ok(NOT_FOUND)
            }
        }
    }
}

/// Print the current working directory to standard output.
pub struct Pwd;

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn parse(_args: &[&str]) -> Self {
        Pwd
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        writeln!(stdout, "{}", env.current_dir.display())?;
        Ok(0)
    }
}

/// Change the current working directory.
///
/// With no target, or with `~`, changes to the home directory. Other targets are
/// absolute or relative to the current directory and are normalized before use.
pub struct Cd {
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn parse(args: &[&str]) -> Self {
        Cd {
            target: first_arg(args),
        }
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let (shown, target) = match self.target {
            None => home_target(env)?,
            Some(t) if t == "~" => home_target(env)?,
            Some(t) => {
                let path = PathBuf::from(&t);
                (t, path)
            }
        };

        let new_dir = env.absolutize(&target);
        if !new_dir.is_dir() {
            return Err(ShellError::NoSuchDirectory(shown).into());
        }

        debug!(
            "cd: {} -> {}",
            env.current_dir.display(),
            new_dir.display()
        );
        env.current_dir = new_dir;
        Ok(0)
    }
}

fn home_target(env: &Environment) -> Result<(String, PathBuf), ShellError> {
    let home = env.home_dir().ok_or(ShellError::HomeNotSet)?;
    Ok((home.display().to_string(), home))
}
