use std::collections::HashMap;
use std::env as stdenv;
use std::path::{Component, MAIN_SEPARATOR_STR, Path, PathBuf};

/// Mutable, user-level view of the process environment used by the interpreter.
///
/// The environment contains:
/// - `vars`: variable overrides layered on top of the process environment. They are
///   consulted first on lookup and passed to every spawned child.
/// - `current_dir`: the shell's working directory. Always absolute and normalized.
///   Only `cd` changes it; the process-wide current directory is never touched.
/// - `should_exit`: set by the `exit` built-in; the read loop stops once it is true.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Variable overrides (e.g., PATH, HOME) visible to lookups and executed commands.
    pub vars: HashMap<String, String>,
    /// The current working directory for command execution.
    pub current_dir: PathBuf,
    /// When set to true, indicates that the interactive loop should exit.
    pub should_exit: bool,
}

impl Environment {
    /// Start from the process state: no overrides, working directory taken from
    /// `std::env::current_dir()`.
    pub fn new() -> Self {
        let current_dir = stdenv::current_dir()
            .map(|dir| normalize(&dir))
            .unwrap_or_else(|_| PathBuf::from(MAIN_SEPARATOR_STR));
        Self::with_current_dir(current_dir)
    }

    /// Environment rooted at `dir`, with no overrides.
    pub fn with_current_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            vars: HashMap::new(),
            current_dir: dir.into(),
            should_exit: false,
        }
    }

    /// Get the value of an environment variable.
    ///
    /// Looks up the key in `self.vars` first, falling back to `std::env::var`.
    /// Nothing is cached, so changes to the process environment show up on the next call.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    /// Set or override an environment variable in `self.vars`.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Home directory: `HOME` whenever it is set (even to an empty string, which then
    /// names the working directory), else the platform's notion of it.
    pub fn home_dir(&self) -> Option<PathBuf> {
        match self.get_var("HOME") {
            Some(home) => Some(PathBuf::from(home)),
            None => dirs::home_dir(),
        }
    }

    /// Make `path` absolute against the working directory and normalize it.
    pub fn absolutize(&self, path: impl AsRef<Path>) -> PathBuf {
        normalize(&self.current_dir.join(path))
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

/// Lexically normalize a path: drop `.` components, fold `..` into its parent and
/// collapse redundant separators. The filesystem is not consulted, so symlinks are
/// kept as written. `..` above the root stays at the root.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            Component::Normal(part) => out.push(part),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}
