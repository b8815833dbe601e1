//! External command execution utilities.
//!
//! Template engines and third-party compressors are opaque CLIs. This module
//! gives them a small builder API with stdin piping and readable errors.
//!
//! # Examples
//!
//! ```ignore
//! use crate::utils::exec::Cmd;
//!
//! // Compile a file, output on stdout
//! let output = Cmd::new("sass").args(["--no-source-map", "app.scss"]).run()?;
//!
//! // Pipe content through a compressor
//! let output = Cmd::new("uglifyjs")
//!     .args(["--compress", "--mangle"])
//!     .stdin(source)
//!     .run()?;
//! ```

use anyhow::{Context, Result, bail};
use regex::Regex;
use std::{
    ffi::{OsStr, OsString},
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
    sync::OnceLock,
};

// ============================================================================
// Builder API
// ============================================================================

/// Command builder for external process execution.
#[derive(Debug, Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    stdin_data: Option<Vec<u8>>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Create from a command array (e.g., `["sass"]` or `["npx", "sass"]`).
    pub fn from_slice<S: AsRef<OsStr>>(cmd: &[S]) -> Self {
        let mut iter = cmd.iter();
        let program = iter
            .next()
            .map(|s| s.as_ref().to_owned())
            .unwrap_or_default();
        let args: Vec<_> = iter.map(|s| s.as_ref().to_owned()).collect();
        Self {
            program,
            args,
            ..Default::default()
        }
    }

    /// Add a single argument.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            let arg = arg.as_ref();
            if !arg.is_empty() {
                self.args.push(arg.to_owned());
            }
        }
        self
    }

    /// Set working directory.
    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    /// Set stdin data to pipe to the process.
    pub fn stdin<D: AsRef<[u8]>>(mut self, data: D) -> Self {
        self.stdin_data = Some(data.as_ref().to_vec());
        self
    }

    /// Whether the program can be found on `PATH`.
    pub fn is_installed(&self) -> bool {
        which::which(&self.program).is_ok()
    }

    /// Execute the command and return its output.
    ///
    /// A non-zero exit status is an error carrying the captured stderr.
    pub fn run(self) -> Result<Output> {
        let name = self.program_name();
        if !self.is_installed() {
            bail!("`{name}` not found, install it or pick another engine");
        }

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(if self.stdin_data.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn `{name}`"))?;

        // stdin is fed on its own thread while stdout and stderr drain
        let stdin = child.stdin.take();
        let (written, output) = std::thread::scope(|scope| {
            let writer = scope.spawn(|| match (stdin, &self.stdin_data) {
                (Some(mut stdin), Some(data)) => stdin.write_all(data),
                _ => Ok(()),
            });
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("stdin writer panicked")));
            (written, output)
        });
        let output = output.with_context(|| format!("Failed to wait for `{name}`"))?;

        if !output.status.success() {
            bail!(format_error(&name, &output));
        }
        // a child may exit successfully without reading all of its input
        if let Err(err) = written
            && err.kind() != std::io::ErrorKind::BrokenPipe
        {
            return Err(err).with_context(|| format!("Failed to write stdin to `{name}`"));
        }

        Ok(output)
    }

    /// Execute and return stdout as UTF-8.
    pub fn run_to_string(self) -> Result<String> {
        let name = self.program_name();
        let output = self.run()?;
        String::from_utf8(output.stdout).with_context(|| format!("`{name}` produced invalid UTF-8"))
    }

    /// Get the program name for error messages.
    fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Strip ANSI escape codes from string.
fn strip_ansi(s: &str) -> std::borrow::Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").expect("valid ansi regex"));
    re.replace_all(s, "")
}

/// Format error message for failed command.
fn format_error(name: &str, output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);

    let mut msg = format!("Command `{name}` failed with {}", output.status);
    let error_msg = strip_ansi(stderr.trim());
    if !error_msg.is_empty() {
        msg.push('\n');
        msg.push_str(&error_msg);
    }

    let stdout_trimmed = stdout.trim();
    if error_msg.is_empty() && !stdout_trimmed.is_empty() {
        msg.push_str("\nStdout:\n");
        msg.push_str(stdout_trimmed);
    }
    msg
}
