use crate::Converter;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::instrument;

/// Executable names to search `PATH` for, in order of preference.
const EXECUTABLES: [&str; 3] = ["gswin64c", "gswin32c", "gs"];

/// A Ghostscript executable, used to render spooled PostScript into PDF.
#[derive(Clone, Debug)]
pub struct Ghostscript {
    executable: PathBuf,
}
impl Ghostscript {
    /// Search `PATH` for a Ghostscript console executable.
    pub fn discover() -> Result<Self> {
        for exe in EXECUTABLES {
            if let Ok(executable) = which::which(exe) {
                tracing::debug!(executable = %executable.display(), "Discovered Ghostscript");
                return Ok(Self { executable });
            }
        }
        tracing::info!("Ghostscript executable not found in PATH");
        exn::bail!(ErrorKind::GhostscriptNotFound);
    }

    /// Use an explicitly configured executable. The path must exist now, but
    /// it is checked again before every conversion because network shares
    /// come and go.
    pub fn with_executable(executable: impl Into<PathBuf>) -> Result<Self> {
        let executable = executable.into();
        if !executable.is_file() {
            exn::bail!(ErrorKind::ExecutableNotFound(executable));
        }
        Ok(Self { executable })
    }

    /// Use the configured executable if there is one, otherwise discover.
    pub fn new(configured: Option<impl Into<PathBuf>>) -> Result<Self> {
        match configured {
            Some(path) => Self::with_executable(path),
            None => Self::discover(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// `-q -dNOPAUSE -dBATCH -sDEVICE=pdfwrite -sOutputFile=<output> <input>`
    ///
    /// The input always comes last. Arguments are passed to the process
    /// directly (no shell), so paths containing spaces need no quoting.
    pub(crate) fn arguments(input: &Path, output: &Path) -> Vec<OsString> {
        let mut output_arg = OsString::from("-sOutputFile=");
        output_arg.push(output);
        vec![
            "-q".into(),
            "-dNOPAUSE".into(),
            "-dBATCH".into(),
            "-sDEVICE=pdfwrite".into(),
            output_arg,
            input.into(),
        ]
    }
}

impl Converter for Ghostscript {
    #[instrument(skip(self), fields(input = %input.display()))]
    fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        if !input.is_file() {
            exn::bail!(ErrorKind::InputNotFound(input.to_path_buf()));
        }
        if !self.executable.is_file() {
            exn::bail!(ErrorKind::ExecutableNotFound(self.executable.clone()));
        }
        let preexisting = output.exists();
        let result = Command::new(&self.executable)
            .args(Self::arguments(input, output))
            .stdin(Stdio::null())
            .output()
            .or_raise(|| ErrorKind::Launch(self.executable.clone()))?;

        if result.status.success() {
            tracing::debug!(output = %output.display(), "Ghostscript conversion complete");
            return Ok(());
        }
        // Ghostscript happily leaves a truncated PDF behind when it fails
        // half-way. Left alone, that file would look like a finished
        // conversion and get the source cleaned up on the next pass.
        if !preexisting
            && output.exists()
            && let Err(e) = std::fs::remove_file(output)
        {
            tracing::warn!(output = %output.display(), error = %e, "Could not remove partial output");
        }
        let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
        match result.status.code() {
            Some(code) => exn::bail!(ErrorKind::Failed { code, stderr }),
            None => exn::bail!(ErrorKind::Terminated(result.status.to_string())),
        }
    }
}
