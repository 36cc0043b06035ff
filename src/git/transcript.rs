//! A recorded sequence of git commands.
//!
//! Every command run through a [`Transcript`] is logged as a `$ git ...` line
//! followed by its combined output. The first failing command stops the
//! sequence and the whole transcript becomes the error, so a user can see
//! exactly what happened.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use super::{GitError, git_command};

#[derive(Debug)]
pub(crate) struct Transcript {
    workdir: PathBuf,
    envs: Vec<(&'static str, String)>,
    output: String,
}

impl Transcript {
    pub(crate) fn new(workdir: &Path) -> Self {
        Self {
            workdir: workdir.to_path_buf(),
            envs: Vec::new(),
            output: String::new(),
        }
    }

    /// Sets an environment variable for every later command.
    pub(crate) fn env(&mut self, key: &'static str, value: impl Into<String>) {
        self.envs.push((key, value.into()));
    }

    /// Runs a git command, recording it. Returns stdout with trailing
    /// whitespace trimmed.
    pub(crate) fn run(&mut self, args: &[&str]) -> Result<String, GitError> {
        self.record_command(args);
        let output = self.command(args).output()?;
        self.finish(output, true)
    }

    /// Runs a git command with `input` on stdin, recording it.
    pub(crate) fn run_with_stdin(&mut self, args: &[&str], input: &str) -> Result<String, GitError> {
        self.record_command(args);
        let mut child = self
            .command(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input.as_bytes())?;
        }
        let output = child.wait_with_output()?;
        self.finish(output, true)
    }

    /// Runs a read-only git command. Only failures are recorded.
    pub(crate) fn query(&mut self, args: &[&str]) -> Result<String, GitError> {
        let output = self.command(args).output()?;
        if !output.status.success() {
            self.record_command(args);
        }
        self.finish(output, false)
    }

    /// Appends a free-form line and fails the transcript with it.
    pub(crate) fn fail(mut self, message: &str) -> GitError {
        self.output.push_str(message);
        self.output.push('\n');
        GitError::Script {
            transcript: self.output,
        }
    }

    pub(crate) fn into_output(self) -> String {
        self.output
    }

    fn command(&self, args: &[&str]) -> std::process::Command {
        let mut cmd = git_command(&self.workdir);
        cmd.args(args);
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        cmd
    }

    fn record_command(&mut self, args: &[&str]) {
        self.output.push_str("$ ");
        self.output.push_str(&format_command_line(args));
        self.output.push('\n');
    }

    fn finish(&mut self, output: Output, always_record: bool) -> Result<String, GitError> {
        let failed = !output.status.success();
        if always_record || failed {
            self.output.push_str(&String::from_utf8_lossy(&output.stdout));
            self.output.push_str(&String::from_utf8_lossy(&output.stderr));
        }
        if failed {
            return Err(GitError::Script {
                transcript: self.output.clone(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .trim_end()
            .to_string())
    }
}

/// Formats `git <args>`, quoting any argument that contains whitespace.
pub(crate) fn format_command_line(args: &[&str]) -> String {
    let mut line = String::from("git");
    for arg in args {
        line.push(' ');
        if arg.contains([' ', '\t', '\r', '\n']) {
            line.push_str(&format!("{:?}", arg));
        } else {
            line.push_str(arg);
        }
    }
    line
}
