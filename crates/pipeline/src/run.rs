use crate::error::{ErrorKind, Result};
use crate::{Action, Context, FileRecord, Outcome, RunSummary, Stage, StageReport, Tally, cleanup, convert, rename, walk};
use refile_config::Config;
use refile_convert::ConverterHandle;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use time::UtcDateTime;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Everything needed to run the pipeline over a fixed set of roots.
///
/// Cheap to share: wrap it in an `Arc` and hand it to whatever schedules
/// runs. It holds no per-run state, so consecutive runs start from scratch.
pub struct Pipeline {
    roots: Vec<PathBuf>,
    ctx: Arc<Context>,
    converter: ConverterHandle,
}

impl Pipeline {
    pub fn new(roots: Vec<PathBuf>, ctx: Context, converter: ConverterHandle) -> Self {
        Self { roots, ctx: Arc::new(ctx), converter }
    }

    pub fn from_config(config: &Config, converter: ConverterHandle) -> Self {
        Self::new(config.roots.clone(), Context::from(config), converter)
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Execute one full run.
    ///
    /// Cancellation is checked before the run starts and between stages; a
    /// stage that has started always finishes.
    ///
    /// # Errors
    /// Only [`ErrorKind::Cancelled`]. Everything that goes wrong with
    /// individual files ends up in the returned [`RunSummary`] instead.
    #[instrument(skip_all)]
    pub async fn run(&self, cancel: &CancellationToken) -> Result<RunSummary> {
        checkpoint(cancel)?;
        let started = UtcDateTime::now();
        let clock = Instant::now();
        tracing::info!(roots = self.roots.len(), "Started processing files");

        let directories = walk::directory_set(&self.roots, &self.ctx).await;
        let files = walk::list_files(&directories, &self.ctx).await;
        let discovery = clock.elapsed();
        let discovered = files.len();
        tracing::info!(directories = directories.len(), files = discovered, elapsed = ?discovery, "Discovery complete");

        let mut stages = Vec::with_capacity(4);

        checkpoint(cancel)?;
        let timer = Instant::now();
        let (files, outcomes) = rename::rename(files, Arc::clone(&self.ctx)).await;
        stages.push(report(Stage::Rename, timer, outcomes));

        checkpoint(cancel)?;
        let timer = Instant::now();
        let (mut files, outcomes) = cleanup::cleanup(files, Arc::clone(&self.ctx)).await;
        stages.push(report(Stage::PreCleanup, timer, outcomes));

        checkpoint(cancel)?;
        let timer = Instant::now();
        let outcomes = convert::convert(&files, Arc::clone(&self.converter), Arc::clone(&self.ctx)).await;
        files.extend(outcomes.iter().filter_map(|outcome| match outcome {
            Outcome::Success(Action::Converted { output, .. }) => Some(FileRecord::new(output.clone())),
            _ => None,
        }));
        stages.push(report(Stage::Convert, timer, outcomes));

        checkpoint(cancel)?;
        let timer = Instant::now();
        let (_, outcomes) = cleanup::cleanup(files, Arc::clone(&self.ctx)).await;
        stages.push(report(Stage::PostCleanup, timer, outcomes));

        let summary = RunSummary {
            started,
            elapsed: clock.elapsed(),
            directories: directories.len(),
            files: discovered,
            discovery,
            stages,
        };
        let tally = summary.tally();
        tracing::info!(
            succeeded = tally.succeeded,
            skipped = tally.skipped,
            failed = tally.failed,
            elapsed = ?summary.elapsed,
            "Finished processing files"
        );
        Ok(summary)
    }
}

fn checkpoint(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        exn::bail!(ErrorKind::Cancelled);
    }
    Ok(())
}

fn report(stage: Stage, timer: Instant, outcomes: Vec<Outcome>) -> StageReport {
    let report = StageReport::new(stage, timer.elapsed(), outcomes);
    let Tally { succeeded, skipped, failed } = report.tally;
    tracing::info!(%stage, succeeded, skipped, failed, elapsed = ?report.elapsed, "Stage complete");
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Skip;
    use crate::testing::{FakeConverter, PDF, PS, touch};
    use std::fs;
    use std::ops::Deref;
    use std::path::Path;

    fn pipeline(root: &Path, converter: Arc<FakeConverter>) -> Pipeline {
        Pipeline::new(vec![root.to_path_buf()], Context { batch_size: 3, ..Context::default() }, converter)
    }

    fn listing(root: &Path) -> Vec<String> {
        let mut names: Vec<String> = walk::subdirectories(root, walk::Traversal::Recursive)
            .into_iter()
            .chain([root.to_path_buf()])
            .flat_map(|dir| walk::files_in(&dir))
            .map(|f| f.path().strip_prefix(root).unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_extensionless_pdf_is_renamed() {
        let temp_dir = tempfile::tempdir().unwrap();
        touch(temp_dir.path(), "report", PDF);
        let converter = Arc::new(FakeConverter::default());

        let summary = pipeline(temp_dir.path(), converter.clone()).run(&CancellationToken::new()).await.unwrap();

        assert_eq!(listing(temp_dir.path()), ["report.pdf"]);
        assert!(converter.calls().is_empty());
        assert_eq!(summary.files, 1);
        assert_eq!(summary.stage(Stage::Rename).unwrap().tally.succeeded, 1);
    }

    #[tokio::test]
    async fn test_spooled_job_is_renamed_converted_and_cleaned() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp_dir.path().join("cdv3/bol/z1")).unwrap();
        touch(temp_dir.path(), "cdv3/bol/z1/spool001", PS);
        let converter = Arc::new(FakeConverter::default());

        let summary = pipeline(temp_dir.path(), converter.clone()).run(&CancellationToken::new()).await.unwrap();

        assert_eq!(listing(temp_dir.path()), ["cdv3/bol/z1/spool001.pdf"]);
        assert_eq!(converter.calls(), [temp_dir.path().join("cdv3/bol/z1/spool001.ps")]);
        let actions: Vec<_> = summary.stages.iter().flat_map(|report| report.actions()).collect();
        assert!(matches!(
            &actions[..],
            [Action::Renamed { .. }, Action::Converted { .. }, Action::Deleted(_)]
        ));
    }

    #[tokio::test]
    async fn test_existing_pdf_triggers_pre_cleanup() {
        let temp_dir = tempfile::tempdir().unwrap();
        touch(temp_dir.path(), "job.ps", PS);
        touch(temp_dir.path(), "job.pdf", PDF);
        let converter = Arc::new(FakeConverter::default());

        let summary = pipeline(temp_dir.path(), converter.clone()).run(&CancellationToken::new()).await.unwrap();

        assert_eq!(listing(temp_dir.path()), ["job.pdf"]);
        assert!(converter.calls().is_empty());
        assert_eq!(summary.stage(Stage::PreCleanup).unwrap().tally.succeeded, 1);
        assert_eq!(summary.stage(Stage::Convert).unwrap().tally.total(), 0);
    }

    #[tokio::test]
    async fn test_failed_conversion_keeps_source_and_retries_next_run() {
        let temp_dir = tempfile::tempdir().unwrap();
        touch(temp_dir.path(), "broken.ps", PS);
        touch(temp_dir.path(), "fine.ps", PS);
        let converter = Arc::new(FakeConverter::failing(["broken.ps"]));
        let pipeline = pipeline(temp_dir.path(), converter.clone());

        let summary = pipeline.run(&CancellationToken::new()).await.unwrap();
        assert_eq!(listing(temp_dir.path()), ["broken.ps", "fine.pdf"]);
        let failed = summary.stage(Stage::Convert).unwrap();
        assert_eq!(failed.tally.failed, 1);
        assert!(failed.outcomes.iter().any(|o| matches!(
            o,
            Outcome::Failed(path, err) if path.ends_with("broken.ps") && matches!(err.deref(), ErrorKind::Convert(_))
        )));

        pipeline.run(&CancellationToken::new()).await.unwrap();
        assert_eq!(listing(temp_dir.path()), ["broken.ps", "fine.pdf"]);
        assert_eq!(converter.calls().iter().filter(|p| p.ends_with("broken.ps")).count(), 2);
    }

    #[tokio::test]
    async fn test_second_run_is_a_no_op() {
        let temp_dir = tempfile::tempdir().unwrap();
        touch(temp_dir.path(), "report", PDF);
        touch(temp_dir.path(), "spool001", PS);
        touch(temp_dir.path(), "notes.txt", b"keep me");
        let converter = Arc::new(FakeConverter::default());
        let pipeline = pipeline(temp_dir.path(), converter.clone());

        pipeline.run(&CancellationToken::new()).await.unwrap();
        let after_first = listing(temp_dir.path());
        assert_eq!(after_first, ["notes.txt", "report.pdf", "spool001.pdf"]);

        let summary = pipeline.run(&CancellationToken::new()).await.unwrap();
        assert_eq!(listing(temp_dir.path()), after_first);
        assert_eq!(summary.tally().succeeded, 0);
        assert_eq!(converter.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_source_and_binary_siblings_share_one_conversion() {
        let temp_dir = tempfile::tempdir().unwrap();
        touch(temp_dir.path(), "job.bin", b"\x00\x01");
        touch(temp_dir.path(), "job.ps", PS);
        let converter = Arc::new(FakeConverter::default());

        let summary = pipeline(temp_dir.path(), converter.clone()).run(&CancellationToken::new()).await.unwrap();

        assert_eq!(converter.calls(), [temp_dir.path().join("job.ps")]);
        assert_eq!(listing(temp_dir.path()), ["job.pdf"]);
        let convert = summary.stage(Stage::Convert).unwrap();
        assert_eq!(convert.tally, Tally { succeeded: 1, skipped: 1, failed: 0 });
        assert_eq!(summary.stage(Stage::PostCleanup).unwrap().tally.succeeded, 2);
    }

    #[tokio::test]
    async fn test_excluded_content_survives_untouched() {
        let temp_dir = tempfile::tempdir().unwrap();
        touch(temp_dir.path(), "installer", b"MZ\x90\x00\x03");
        let converter = Arc::new(FakeConverter::default());

        let summary = pipeline(temp_dir.path(), converter).run(&CancellationToken::new()).await.unwrap();

        assert_eq!(listing(temp_dir.path()), ["installer"]);
        let rename = summary.stage(Stage::Rename).unwrap();
        assert!(matches!(&rename.outcomes[..], [Outcome::Skipped(_, Skip::Excluded("x-msdownload"))]));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let temp_dir = tempfile::tempdir().unwrap();
        touch(temp_dir.path(), "report", PDF);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = pipeline(temp_dir.path(), Arc::new(FakeConverter::default())).run(&cancel).await.unwrap_err();

        assert!(matches!(err.deref(), ErrorKind::Cancelled));
        assert_eq!(listing(temp_dir.path()), ["report"]);
    }

    #[tokio::test]
    async fn test_missing_roots_are_harmless() {
        let temp_dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(
            vec![temp_dir.path().join("offline-share")],
            Context::default(),
            Arc::new(FakeConverter::default()),
        );
        let summary = pipeline.run(&CancellationToken::new()).await.unwrap();
        assert_eq!(summary.directories, 0);
        assert_eq!(summary.files, 0);
        assert_eq!(summary.stages.len(), 4);
    }
}
