//! Conversion orchestration.
//!
//! Candidates are split into batches; each batch is further split into one
//! sub-task per extension family (source, binary) so a slow family never
//! holds up the other. Every sub-task runs on the blocking pool since the
//! converter waits on an external process.
//!
//! Only one input is ever converted into a given output: when `job.ps` and
//! `job.bin` (or `job.ps` and `job.PS`) are both present, the source family
//! wins and the rest are skipped with [`Skip::SiblingQueued`].

use crate::dispatch::fan_out;
use crate::error::ErrorKind;
use crate::outcome::Action;
use crate::{Context, FileRecord, Outcome, Skip};
use exn::ResultExt;
use refile_convert::{Converter, ConverterHandle};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// Convert a single file next to itself, unless its output already exists.
/// The input is never modified, whatever happens.
pub fn convert_file(record: &FileRecord, converter: &dyn Converter, ctx: &Context) -> Outcome {
    let input = record.path();
    let output = input.with_extension(&ctx.extensions.output);
    if !record.exists() {
        return Outcome::Skipped(input.to_path_buf(), Skip::Vanished);
    }
    if output.exists() {
        return Outcome::Skipped(input.to_path_buf(), Skip::OutputExists(output));
    }
    match converter.convert(input, &output).or_raise(|| ErrorKind::Convert(input.to_path_buf())) {
        Ok(()) => {
            tracing::info!(input = %input.display(), output = %output.display(), "Converted to PDF");
            Outcome::Success(Action::Converted { input: input.to_path_buf(), output })
        },
        Err(e) => {
            tracing::warn!(input = %input.display(), error = ?e, "Conversion failed; source left in place");
            Outcome::Failed(input.to_path_buf(), e)
        },
    }
}

/// Convert stage: every source- or binary-extension file in `files`.
/// One outcome per candidate.
pub async fn convert(files: &[FileRecord], converter: ConverterHandle, ctx: Arc<Context>) -> Vec<Outcome> {
    let clock = Instant::now();
    let extensions = &ctx.extensions;
    let (sources, binaries): (Vec<&FileRecord>, Vec<&FileRecord>) = files
        .iter()
        .filter(|f| f.has_extension_of(&extensions.source) || f.has_extension_of(&extensions.binary))
        .partition(|f| f.has_extension_of(&extensions.source));

    let mut claimed = HashSet::new();
    let mut candidates = Vec::new();
    let mut deferred = Vec::new();
    for record in sources.into_iter().chain(binaries) {
        let output = record.path().with_extension(&extensions.output);
        if claimed.insert(output.clone()) {
            candidates.push(record.clone());
        } else {
            tracing::debug!(input = %record.path().display(), output = %output.display(), "Output claimed by a sibling");
            deferred.push(Outcome::Skipped(record.path().to_path_buf(), Skip::SiblingQueued(output)));
        }
    }
    tracing::info!(candidates = candidates.len(), deferred = deferred.len(), "Conversion phase started");

    let mut jobs = Vec::new();
    for batch in candidates.chunks(ctx.batch_size.max(1)) {
        let (sources, binaries): (Vec<_>, Vec<_>) =
            batch.iter().cloned().partition(|f| f.has_extension_of(&extensions.source));
        for family in [sources, binaries] {
            if family.is_empty() {
                continue;
            }
            let (converter, ctx) = (Arc::clone(&converter), Arc::clone(&ctx));
            jobs.push(move || {
                family.iter().map(|record| convert_file(record, converter.as_ref(), &ctx)).collect::<Vec<_>>()
            });
        }
    }
    let mut outcomes: Vec<Outcome> = fan_out(ctx.concurrency, jobs).await.into_iter().flatten().collect();
    outcomes.extend(deferred);

    tracing::info!(elapsed = ?clock.elapsed(), "Conversion phase complete");
    outcomes
}
