//! Extension recovery for files that lost theirs.
//!
//! Archive exports drop files with no extension at all. The first few bytes
//! are usually enough to tell what they are, and anything unrecognisable is
//! (by default) assumed to be a spooled print job.

use crate::dispatch::fan_out;
use crate::error::{ErrorKind, Result};
use crate::outcome::Action;
use crate::{Context, FileRecord, Outcome, Skip};
use refile_config::UnknownPolicy;
use refile_sniff::{Classification, SNIFF_LEN, classify, extension_for};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

/// Reads at most `bytes` from the start of the file. Shorter files produce
/// a shorter buffer, not an error.
pub(crate) fn read_head(path: &Path, bytes: usize) -> io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut buffer = Vec::with_capacity(bytes);
    file.take(bytes as u64).read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Give one extensionless file the extension its content implies.
///
/// Never overwrites: if the target name is taken, the file is left alone.
/// Files that already have an extension are never touched.
pub fn rename_file(record: &FileRecord, ctx: &Context) -> Outcome {
    let path = record.path();
    match rename_file_inner(record, ctx) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = ?e, "Could not restore file extension");
            Outcome::Failed(path.to_path_buf(), e)
        },
    }
}

fn rename_file_inner(record: &FileRecord, ctx: &Context) -> Result<Outcome> {
    let path = record.path();
    let skip = |reason| Ok(Outcome::Skipped(path.to_path_buf(), reason));
    if record.has_extension() {
        return skip(Skip::HasExtension);
    }
    if !record.exists() {
        return skip(Skip::Vanished);
    }

    let head = match read_head(path, SNIFF_LEN) {
        Ok(head) => head,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return skip(Skip::Vanished),
        Err(e) => return Err(ErrorKind::io(path, e)),
    };
    let extension = match classify(&head) {
        Classification::Known(label) => extension_for(label),
        Classification::Excluded(label) => return skip(Skip::Excluded(label)),
        Classification::Unknown => match ctx.unknown {
            UnknownPolicy::Spool => ctx.extensions.source.clone(),
            UnknownPolicy::Skip => return skip(Skip::Unrecognised),
        },
    };
    if extension.is_empty() {
        return skip(Skip::Unrecognised);
    }

    let target = path.with_extension(&extension);
    if target.exists() {
        return skip(Skip::TargetExists(target));
    }
    match fs::rename(path, &target) {
        Ok(()) => {
            tracing::debug!(from = %path.display(), to = %target.display(), "Restored file extension");
            Ok(Outcome::Success(Action::Renamed { from: path.to_path_buf(), to: target }))
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => skip(Skip::Vanished),
        Err(e) => Err(ErrorKind::io(path, e)),
    }
}

/// Rename stage: every extensionless file in `files` is classified and
/// renamed, in batches. Returns the file list as it stands afterwards
/// (renamed paths swapped in, vanished files dropped) together with one
/// outcome per extensionless file.
pub async fn rename(files: Vec<FileRecord>, ctx: Arc<Context>) -> (Vec<FileRecord>, Vec<Outcome>) {
    let (candidates, mut files): (Vec<_>, Vec<_>) = files.into_iter().partition(|f| !f.has_extension());
    let jobs = candidates.chunks(ctx.batch_size.max(1)).map(<[FileRecord]>::to_vec).map(|batch| {
        let ctx = Arc::clone(&ctx);
        move || batch.iter().map(|record| rename_file(record, &ctx)).collect::<Vec<_>>()
    });
    let outcomes: Vec<Outcome> = fan_out(ctx.concurrency, jobs).await.into_iter().flatten().collect();

    files.extend(outcomes.iter().filter_map(|outcome| match outcome {
        Outcome::Success(Action::Renamed { to, .. }) => Some(FileRecord::new(to.clone())),
        Outcome::Skipped(_, Skip::Vanished) => None,
        Outcome::Success(_) => None,
        Outcome::Skipped(path, _) | Outcome::Failed(path, _) => Some(FileRecord::new(path.clone())),
    }));
    (files, outcomes)
}
