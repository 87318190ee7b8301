//! Fixed-interval scheduling with overlap protection.
//!
//! Runs over a network share can easily take longer than the interval. A
//! tick that arrives while a run is still going is dropped on the floor,
//! not queued: the next tick after the run finishes picks up anything new.

use refile_pipeline::Pipeline;
use refile_pipeline::error::ErrorKind as PipelineErrorKind;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub enum Trigger {
    /// A new run was spawned.
    Started(JoinHandle<()>),
    /// The previous run is still in flight; nothing was spawned.
    AlreadyRunning,
}

/// Clears the running flag however the run ends, panics included.
struct RunGuard(Arc<AtomicBool>);
impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Scheduler {
    pipeline: Arc<Pipeline>,
    period: Duration,
    running: Arc<AtomicBool>,
}

impl Scheduler {
    pub fn new(pipeline: Arc<Pipeline>, period: Duration) -> Self {
        Self { pipeline, period, running: Arc::new(AtomicBool::new(false)) }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Spawn a run unless one is already in flight.
    pub fn trigger(&self, cancel: &CancellationToken) -> Trigger {
        if self.running.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            tracing::info!("Previous run still in progress; skipping this tick");
            return Trigger::AlreadyRunning;
        }
        let guard = RunGuard(Arc::clone(&self.running));
        let pipeline = Arc::clone(&self.pipeline);
        let cancel = cancel.clone();
        Trigger::Started(tokio::spawn(async move {
            let _guard = guard;
            match pipeline.run(&cancel).await {
                Ok(_) => {},
                Err(e) if matches!(*e, PipelineErrorKind::Cancelled) => tracing::info!("Run cancelled"),
                Err(e) => tracing::error!(error = ?e, "Run aborted"),
            }
        }))
    }

    /// Tick until `cancel` fires, then wait for any in-flight run to reach
    /// its next stage boundary and stop. The first run starts immediately.
    pub async fn serve(&self, cancel: CancellationToken) {
        tracing::info!(period = ?self.period, roots = self.pipeline.roots().len(), "Scheduler started");
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut in_flight: Option<JoinHandle<()>> = None;
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if let Trigger::Started(handle) = self.trigger(&cancel) {
                        in_flight = Some(handle);
                    }
                },
            }
        }
        if self.is_running() {
            tracing::info!("Waiting for the current run to reach a stage boundary");
        }
        if let Some(handle) = in_flight
            && let Err(e) = handle.await
        {
            tracing::error!(error = %e, "Run task did not shut down cleanly");
        }
        tracing::info!("Scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refile_convert::Converter;
    use refile_pipeline::Context;
    use std::path::Path;
    use std::sync::Mutex;
    use std::sync::mpsc::{self, Receiver, Sender};

    /// Blocks every conversion until the test lets it through, announcing
    /// each one as it starts.
    struct GatedConverter {
        gate: Mutex<Receiver<()>>,
        entered: Mutex<Sender<()>>,
    }
    impl Converter for GatedConverter {
        fn convert(&self, _input: &Path, output: &Path) -> refile_convert::error::Result<()> {
            let _ = self.entered.lock().unwrap().send(());
            let _ = self.gate.lock().unwrap().recv();
            std::fs::write(output, b"%PDF-1.4\n").unwrap();
            Ok(())
        }
    }

    struct Harness {
        scheduler: Arc<Scheduler>,
        release: Sender<()>,
        entered: Receiver<()>,
    }

    fn harness(root: &Path, period: Duration) -> Harness {
        let (release, gate) = mpsc::channel();
        let (announce, entered) = mpsc::channel();
        let converter = GatedConverter { gate: Mutex::new(gate), entered: Mutex::new(announce) };
        let pipeline = Pipeline::new(vec![root.to_path_buf()], Context::default(), Arc::new(converter));
        Harness { scheduler: Arc::new(Scheduler::new(Arc::new(pipeline), period)), release, entered }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_overlapping_trigger_is_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("job.ps"), b"%!PS").unwrap();
        let Harness { scheduler, release, .. } = harness(temp_dir.path(), Duration::from_secs(60));
        let cancel = CancellationToken::new();

        let Trigger::Started(first) = scheduler.trigger(&cancel) else { panic!("first trigger should start a run") };
        assert!(scheduler.is_running());
        assert!(matches!(scheduler.trigger(&cancel), Trigger::AlreadyRunning));

        release.send(()).unwrap();
        first.await.unwrap();
        assert!(!scheduler.is_running());
        assert!(temp_dir.path().join("job.pdf").exists());
        assert!(!temp_dir.path().join("job.ps").exists());

        let Trigger::Started(second) = scheduler.trigger(&cancel) else { panic!("idle scheduler should start a run") };
        second.await.unwrap();
    }

    #[tokio::test]
    async fn test_serve_returns_once_cancelled() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("spool001"), b"%!PS").unwrap();
        let Harness { scheduler, .. } = harness(temp_dir.path(), Duration::from_secs(60));
        let cancel = CancellationToken::new();
        cancel.cancel();

        scheduler.serve(cancel).await;

        assert!(!scheduler.is_running());
        assert!(temp_dir.path().join("spool001").exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_serve_runs_immediately_and_stops_at_stage_boundary() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("job.ps"), b"%!PS").unwrap();
        let Harness { scheduler, release, entered } = harness(temp_dir.path(), Duration::from_secs(3600));
        let cancel = CancellationToken::new();

        let serving = tokio::spawn({
            let (scheduler, cancel) = (Arc::clone(&scheduler), cancel.clone());
            async move { scheduler.serve(cancel).await }
        });
        // Wait for the first run to reach the (gated) conversion stage.
        tokio::task::spawn_blocking(move || entered.recv()).await.unwrap().unwrap();
        assert!(scheduler.is_running());
        cancel.cancel();
        release.send(()).unwrap();
        serving.await.unwrap();

        // Conversion finished, but post-cleanup never started.
        assert!(!scheduler.is_running());
        assert!(temp_dir.path().join("job.pdf").exists());
        assert!(temp_dir.path().join("job.ps").exists());
    }
}
