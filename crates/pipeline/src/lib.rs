//! The refile pipeline.
//!
//! A run walks every archive root and then pushes the discovered files
//! through four stages, strictly in order:
//!
//! 1. **Rename**: extensionless files get the extension their content
//!    implies ([`rename`]).
//! 2. **Pre-cleanup**: sources that already have a PDF sibling are deleted
//!    ([`cleanup`]).
//! 3. **Convert**: the remaining sources are converted to PDF ([`convert`]).
//! 4. **Post-cleanup**: sources that now have a PDF sibling are deleted.
//!
//! Each stage fans its files out in batches onto the blocking pool, bounded
//! by [`Context::concurrency`], and waits for every batch before the next
//! stage starts. Per-file failures never abort a run; they are logged and
//! collected into the [`RunSummary`].

pub mod cleanup;
pub mod convert;
mod dispatch;
pub mod error;
mod outcome;
mod record;
pub mod rename;
mod run;
#[cfg(test)]
mod testing;
pub mod walk;

pub use crate::outcome::{Action, Outcome, RunSummary, Skip, Stage, StageReport, Tally};
pub use crate::record::FileRecord;
pub use crate::run::Pipeline;
use refile_config::{Config, Extensions, UnknownPolicy};

/// Tunables shared by every stage of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Context {
    /// Files (or directories, during discovery) per dispatched batch.
    pub batch_size: usize,
    /// Batches in flight at once.
    pub concurrency: usize,
    pub unknown: UnknownPolicy,
    pub extensions: Extensions,
}

impl From<&Config> for Context {
    fn from(config: &Config) -> Self {
        Self {
            batch_size: config.batch_size,
            concurrency: config.concurrency,
            unknown: config.unknown,
            extensions: config.extensions.clone(),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}
