use crate::dispatch::fan_out;
use crate::error::ErrorKind;
use crate::outcome::Action;
use crate::{Context, FileRecord, Outcome, Skip};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn delete_file(victim: PathBuf, counterpart: &Path) -> Outcome {
    // The file list can be minutes old by now; re-check right before
    // deleting anything.
    if !counterpart.is_file() {
        return Outcome::Skipped(victim, Skip::NoCounterpart(counterpart.to_path_buf()));
    }
    match fs::remove_file(&victim) {
        Ok(()) => {
            tracing::debug!(path = %victim.display(), pdf = %counterpart.display(), "Deleted converted source");
            Outcome::Success(Action::Deleted(victim))
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => Outcome::Skipped(victim, Skip::Vanished),
        Err(e) => {
            let err = ErrorKind::io(&victim, e);
            tracing::warn!(path = %victim.display(), error = ?err, "Could not delete converted source");
            Outcome::Failed(victim, err)
        },
    }
}

/// Cleanup stage: delete every source (or binary) file in `files` whose
/// PDF sibling is also in `files`. Siblings share everything but the
/// extension, which is compared case-insensitively.
///
/// Returns the file list minus whatever is now gone, and one outcome per
/// deletion attempted.
pub async fn cleanup(files: Vec<FileRecord>, ctx: Arc<Context>) -> (Vec<FileRecord>, Vec<Outcome>) {
    let extensions = &ctx.extensions;
    let doomed: Vec<(PathBuf, PathBuf)> = {
        let counterparts: HashMap<PathBuf, &Path> = files
            .iter()
            .filter(|f| f.has_extension_of(&extensions.output))
            .map(|f| (f.stem(), f.path()))
            .collect();
        files
            .iter()
            .filter(|f| f.has_extension_of(&extensions.source) || f.has_extension_of(&extensions.binary))
            .filter_map(|f| counterparts.get(&f.stem()).map(|pdf| (f.path().to_path_buf(), pdf.to_path_buf())))
            .collect()
    };
    if doomed.is_empty() {
        return (files, Vec::new());
    }

    let jobs = doomed.chunks(ctx.batch_size.max(1)).map(<[(PathBuf, PathBuf)]>::to_vec).map(|batch| {
        move || {
            batch
                .into_iter()
                .map(|(victim, counterpart)| delete_file(victim, &counterpart))
                .collect::<Vec<_>>()
        }
    });
    let outcomes: Vec<Outcome> = fan_out(ctx.concurrency, jobs).await.into_iter().flatten().collect();

    let files = {
        let removed: HashSet<&Path> = outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                Outcome::Success(Action::Deleted(path)) | Outcome::Skipped(path, Skip::Vanished) => Some(path.as_path()),
                _ => None,
            })
            .collect();
        files.into_iter().filter(|f| !removed.contains(f.path())).collect()
    };
    (files, outcomes)
}
