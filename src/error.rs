use std::io;
use thiserror::Error;

/// Failures the interpreter recovers from by printing a message and moving on.
///
/// The `Display` output of each variant is exactly the line shown to the user.
#[derive(Debug, Error)]
pub enum ShellError {
    /// Neither a built-in nor an executable on the search path.
    #[error("{0}: command not found")]
    CommandNotFound(String),

    /// The executable was located but the child could not be started.
    #[error("Error executing: {name}")]
    SpawnFailed {
        name: String,
        #[source]
        source: io::Error,
    },

    /// `cd` target does not name an existing directory.
    #[error("cd: {0}: No such file or directory")]
    NoSuchDirectory(String),

    /// `cd` to home with neither `HOME` nor a platform home directory.
    #[error("cd: HOME not set")]
    HomeNotSet,
}

#[cfg(test)]
mod tests {
    use super::ShellError;
    use std::io;

    #[test]
    fn test_messages_match_user_facing_text() {
        assert_eq!(
            ShellError::CommandNotFound("frob".into()).to_string(),
            "frob: command not found"
        );
        assert_eq!(
            ShellError::NoSuchDirectory("/no/where".into()).to_string(),
            "cd: /no/where: No such file or directory"
        );
        assert_eq!(ShellError::HomeNotSet.to_string(), "cd: HOME not set");
    }

    #[test]
    fn test_spawn_failure_keeps_source() {
        let err = ShellError::SpawnFailed {
            name: "tool".into(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.to_string(), "Error executing: tool");
        assert!(std::error::Error::source(&err).is_some());
    }
}
