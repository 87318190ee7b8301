use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::collections::VecDeque;
use tokio::task::JoinError;

/// Runs each blocking `job` on Tokio's blocking pool with at most `limit` in
/// flight, returning their results in submission order.
///
/// A job that panics loses its result; the panic is logged and the remaining
/// jobs carry on.
pub(crate) async fn fan_out<T, F>(limit: usize, jobs: impl IntoIterator<Item = F>) -> Vec<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let mut pending: VecDeque<_> = jobs.into_iter().enumerate().collect();
    let mut processing = FuturesUnordered::new();
    let spawn = |(index, job): (usize, F)| async move { (index, tokio::task::spawn_blocking(job).await) };

    while processing.len() < limit.max(1)
        && let Some(next) = pending.pop_front()
    {
        processing.push(spawn(next));
    }

    let mut results: Vec<(usize, T)> = Vec::with_capacity(pending.len() + processing.len());
    while let Some((index, joined)) = processing.next().await {
        match joined {
            Ok(result) => results.push((index, result)),
            Err(e) => log_join_error(index, &e),
        }
        // Pop-n-push, FIFO.
        if let Some(next) = pending.pop_front() {
            processing.push(spawn(next));
        }
    }

    results.sort_unstable_by_key(|(index, _)| *index);
    results.into_iter().map(|(_, result)| result).collect()
}

fn log_join_error(index: usize, e: &JoinError) {
    tracing::error!(task = index, error = %e, "Blocking task did not complete; its results are lost");
}
