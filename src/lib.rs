//! A small interactive command interpreter.
//!
//! Each input line is split into words by [`tokenize`] (honoring single quotes,
//! double quotes and backslash escapes) and handed to an [`Interpreter`], which runs
//! one of its built-ins (`exit`, `echo`, `type`, `pwd`, `cd`) or looks the command up
//! on `PATH` and runs it as a child process, waiting for it to finish.
//!
//! The public modules [`command`] and [`env`] expose the traits and types needed to
//! plug in your own commands and to prepare the environment an interpreter runs in.

mod builtin;
pub mod command;
pub mod env;
mod error;
mod external;
mod interpreter;
mod lexer;

pub use builtin::is_builtin;
pub use error::ShellError;
pub use external::find_command_path;
pub use interpreter::{Interpreter, PROMPT};
pub use lexer::tokenize;
