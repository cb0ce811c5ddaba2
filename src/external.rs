use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::error::ShellError;
use crate::interpreter::Factory;
use anyhow::Result;
use log::{debug, trace};
use std::ffi::{OsStr, OsString};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

/// Command that is not a builtin.
///
/// `name` is the word the user typed and becomes the child's `argv[0]`;
/// `program` is the resolved absolute path that actually gets executed.
pub struct ExternalCommand {
    name: OsString,
    program: PathBuf,
    args: Vec<OsString>,
}

impl ExternalCommand {
    pub fn new(name: OsString, program: PathBuf, args: Vec<OsString>) -> Self {
        Self {
            name,
            program,
            args,
        }
    }
}

impl CommandFactory for Factory<ExternalCommand> {
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        let program = find_command_path(env, name)?;
        Some(Box::new(ExternalCommand::new(
            name.into(),
            program,
            args.iter().map(|x| x.into()).collect(),
        )))
    }
}

impl ExecutableCommand for ExternalCommand {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        // The child shares our stdout; anything buffered must land before its output.
        stdout.flush()?;

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&env.current_dir);
        set_argv0(&mut cmd, &self.name);

        debug!("spawning {} as {:?}", self.program.display(), self.name);
        let spawn_failed = |source: std::io::Error| ShellError::SpawnFailed {
            name: self.name.to_string_lossy().into_owned(),
            source,
        };
        let mut child = cmd.spawn().map_err(spawn_failed)?;
        let exit_status = child.wait().map_err(spawn_failed)?;
        debug!("{:?} finished with {exit_status}", self.name);

        match exit_status.code() {
            Some(x) => Ok(x),
            None => Ok(terminated_by_signal(exit_status)),
        }
    }
}

#[cfg(unix)]
fn set_argv0(cmd: &mut Command, name: &OsStr) {
    use std::os::unix::process::CommandExt;
    cmd.arg0(name);
}

#[cfg(not(unix))]
fn set_argv0(_cmd: &mut Command, _name: &OsStr) {}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

/// Resolve a command name to the absolute path of an executable.
///
/// Behavior:
/// - Empty name: `None`.
/// - Name containing a path separator (`/bin/sh`, `./run`, `bin/tool`): resolved against
///   the working directory, returned if it is executable. PATH is not consulted.
///   This goes beyond plain `<dir>/<name>` lookup on purpose, matching POSIX shells.
/// - Bare name: each directory of `PATH` is tried in listed order and the first
///   executable `<dir>/<name>` wins. Relative directories are taken relative to the
///   working directory. An absent `PATH` never resolves.
///
/// `PATH` is read on every call.
pub fn find_command_path(env: &Environment, name: &str) -> Option<PathBuf> {
    let path = Path::new(name);
    let mut components = path.components();
    match (components.next(), components.next()) {
        (None, _) => None,
        (Some(_), None) if !path.is_absolute() => {
            let search_paths = env.get_var("PATH");
            if search_paths.is_none() {
                debug!("PATH is not set, cannot resolve {name:?}");
            }
            find_in_path(env, OsStr::new(&search_paths?), path.as_os_str())
        }
        _ => find_by_path(&env.absolutize(path)),
    }
}

fn find_in_path(env: &Environment, search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    for dir in std::env::split_paths(search_paths) {
        if dir.as_os_str().is_empty() {
            continue;
        }
        let candidate = env.absolutize(&dir).join(cmd);
        if let Some(found) = find_by_path(&candidate) {
            trace!("{cmd:?} resolved to {}", found.display());
            return Some(found);
        }
    }
    trace!("{cmd:?} not found in {search_paths:?}");
    None
}

fn find_by_path(path: &Path) -> Option<PathBuf> {
    if is_executable(path) {
        Some(path.to_owned())
    } else {
        None
    }
}

/// A regular file with at least one execute bit set.
#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    match path.metadata() {
        Ok(metadata) => metadata.is_file() && metadata.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
