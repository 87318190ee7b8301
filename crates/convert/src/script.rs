//! Ad hoc script execution under the system command shell.
//!
//! Unrelated to [`Ghostscript`](crate::Ghostscript) conversions: this exists
//! so operators can run an arbitrary batch file (Windows) or shell script
//! (everywhere else) with the same capture semantics.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::instrument;

/// Captured result of a script run. A non-zero exit code is **not** an error
/// here; it is up to the caller to decide what it means.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptOutput {
    /// Exit code, or `None` if the script was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}
impl ScriptOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

#[cfg(windows)]
fn shell(script: &Path) -> Command {
    let mut command = Command::new("cmd.exe");
    command.arg("/C").arg(script);
    command
}

#[cfg(not(windows))]
fn shell(script: &Path) -> Command {
    let mut command = Command::new("sh");
    command.arg(script);
    command
}

/// Run `script` under the system shell from `working_dir`, appending `args`.
///
/// # Errors
/// - [`ErrorKind::ScriptNotFound`] if the script does not exist.
/// - [`ErrorKind::Launch`] if the shell could not be started.
#[instrument(skip(args), fields(script = %script.display(), dir = %working_dir.display()))]
pub fn run_script<I, S>(script: &Path, working_dir: &Path, args: I) -> Result<ScriptOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    if !script.is_file() {
        exn::bail!(ErrorKind::ScriptNotFound(script.to_path_buf()));
    }
    let output = shell(script)
        .args(args)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .output()
        .or_raise(|| ErrorKind::Launch(script.to_path_buf()))?;
    let output = ScriptOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    match output.success() {
        true => tracing::debug!("Script executed successfully"),
        false => tracing::warn!(code = ?output.code, stderr = %output.stderr.trim(), "Script exited unsuccessfully"),
    }
    Ok(output)
}
