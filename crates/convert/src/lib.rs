//! External conversion tooling.
//!
//! [`Ghostscript`] turns spooled PostScript into PDF by shelling out to the
//! Ghostscript console executable; [`run_script`] runs arbitrary batch files
//! for everything else. Both block until the child process exits, so async
//! callers should wrap them in `spawn_blocking`.

pub mod error;
mod ghostscript;
mod script;

use crate::error::Result;
pub use crate::ghostscript::Ghostscript;
pub use crate::script::{ScriptOutput, run_script};
use std::path::Path;
use std::sync::Arc;

/// Anything that can turn an input file into an output file.
///
/// Implementations must be synchronous and must never modify, rename or
/// delete `input`, whatever the outcome.
pub trait Converter: Send + Sync {
    /// Convert `input` into `output`, blocking until done. Returns an error
    /// for any failure, including a non-zero exit of an external process.
    fn convert(&self, input: &Path, output: &Path) -> Result<()>;
}

pub type ConverterHandle = Arc<dyn Converter + Send + Sync>;
