use std::fs;
use std::io::Write;
use std::process::{Command, Output, Stdio};

fn shell() -> Command {
    Command::new(env!("CARGO_BIN_EXE_quill-shell"))
}

fn one_shot(line: &str) -> Output {
    shell().args(["-c", line]).output().expect("failed to run shell")
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_one_shot_echo_keeps_quoted_spacing() {
    let output = one_shot(r#"echo a   "b  c" d\ e"#);
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "a b  c d e\n");
}

#[test]
fn test_unknown_command_is_not_fatal() {
    let output = one_shot("nonexistent_cmd_xyz arg");
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "nonexistent_cmd_xyz: command not found\n");
}

#[test]
fn test_pwd_reports_starting_directory() {
    let temp = tempfile::TempDir::new().unwrap();
    let dir = fs::canonicalize(temp.path()).unwrap();
    let output = shell()
        .args(["-c", "pwd"])
        .current_dir(&dir)
        .output()
        .unwrap();
    assert_eq!(stdout_of(&output), format!("{}\n", dir.display()));
}

#[cfg(unix)]
#[test]
fn test_external_output_is_inherited() {
    let output = one_shot("sh -c 'echo from-child'");
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "from-child\n");
}

#[test]
fn test_piped_session_stops_at_exit() {
    let mut child = shell()
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"echo first\n\n   \ntype exit\nexit\necho never\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    assert_eq!(
        stdout_of(&output),
        "$ first\n$ $ $ exit is a shell builtin\n$ "
    );
}

#[test]
fn test_prompt_printed_before_end_of_input() {
    let output = shell().stdin(Stdio::null()).output().unwrap();
    assert_eq!(stdout_of(&output), "$ ");
}

#[test]
fn test_missing_path_resolves_nothing() {
    let output = shell()
        .env_remove("PATH")
        .args(["-c", "type sh"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "sh: not found\n");

    let output = shell().env_remove("PATH").args(["-c", "sh"]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "sh: command not found\n");
}

#[test]
fn test_end_of_input_exits_cleanly() {
    let output = shell().stdin(Stdio::null()).output().unwrap();
    assert!(output.status.success());
}
