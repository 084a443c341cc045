//! Default shell detection and shell command line parsing.

use std::{env, path::PathBuf};

use crate::models::ShellConfig;

/// Builds a `ShellConfig` from a command line such as `"bash --norc"`.
/// Returns `None` when the line cannot be split or names no program.
pub fn parse_shell_command_line(command_line: &str) -> Option<ShellConfig> {
    let mut parts = shlex::split(command_line.trim())?.into_iter();
    let program = parts.next()?;
    Some(ShellConfig {
        program: PathBuf::from(program),
        args: parts.collect(),
        ..Default::default()
    })
}

/// Checks whether `executable_name` is a file in one of the `PATH` directories.
pub fn is_executable_in_path(executable_name: &str) -> bool {
    if let Ok(path_var) = env::var("PATH") {
        for path in env::split_paths(&path_var) {
            if path.join(executable_name).is_file() {
                return true;
            }
        }
    }
    false
}

/// Picks the shell used when nothing is configured: `bash` when available, `sh` otherwise.
/// Sessions speak POSIX shell syntax, so Windows needs a `bash.exe` in `PATH`.
pub fn get_default_shell_name() -> &'static str {
    let bash = if cfg!(target_os = "windows") {
        "bash.exe"
    } else {
        "bash"
    };
    if is_executable_in_path(bash) { bash } else { "sh" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shell_command_line_splits_args() {
        let config = parse_shell_command_line("bash --norc --noprofile").unwrap();
        assert_eq!(config.program, PathBuf::from("bash"));
        assert_eq!(config.args, vec!["--norc", "--noprofile"]);
        assert!(config.working_dir.is_none());
    }

    #[test]
    fn test_parse_shell_command_line_honors_quotes() {
        let config = parse_shell_command_line(r#""/opt/my shell/sh" -e"#).unwrap();
        assert_eq!(config.program, PathBuf::from("/opt/my shell/sh"));
        assert_eq!(config.args, vec!["-e"]);
    }

    #[test]
    fn test_parse_shell_command_line_rejects_empty_and_unbalanced() {
        assert!(parse_shell_command_line("   ").is_none());
        assert!(parse_shell_command_line("bash \"unterminated").is_none());
    }

    #[test]
    fn test_unknown_executable_is_not_in_path() {
        assert!(!is_executable_in_path("definitely-not-a-real-shell-binary"));
    }
}
