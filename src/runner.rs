//! Bounded-concurrency fan-out over a list of inputs.
//!
//! [`run_all`] drives at most `concurrency` worker futures at a time. Each
//! worker's failure is logged against its input and dropped, so one bad page
//! never sinks the batch. Results come back through the return value in
//! completion order; nothing is accumulated in shared state.

use futures::stream::{self, StreamExt};
use std::fmt;
use std::future::Future;
use std::time::Instant;
use tracing::{debug, error, info, instrument};

/// Run `worker` over every input with at most `concurrency` in flight.
///
/// # Arguments
///
/// * `stage` - Name used in log lines (e.g. `"archive"`)
/// * `inputs` - Items to process; their `Display` form identifies failures
/// * `worker` - Async unary function producing a result or an error
/// * `concurrency` - Maximum number of concurrently running workers; `0` is
///   treated as `1`
///
/// # Returns
///
/// The successful results, in completion order. Returns only after every
/// input has finished.
#[instrument(level = "info", skip(inputs, worker), fields(total = inputs.len()))]
pub async fn run_all<T, R, E, F, Fut>(
    stage: &str,
    inputs: Vec<T>,
    worker: F,
    concurrency: usize,
) -> Vec<R>
where
    T: fmt::Display,
    E: fmt::Display,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    let t0 = Instant::now();
    let total = inputs.len();
    let worker = &worker;

    let results: Vec<R> = stream::iter(inputs)
        .map(|input| async move {
            let label = input.to_string();
            match worker(input).await {
                Ok(result) => {
                    debug!(stage, input = %label, "Worker succeeded");
                    Some(result)
                }
                Err(e) => {
                    error!(stage, input = %label, error = %e, "Worker failed; skipping input");
                    None
                }
            }
        })
        .buffer_unordered(concurrency.max(1))
        .filter_map(std::future::ready)
        .collect()
        .await;

    info!(
        stage,
        total,
        succeeded = results.len(),
        failed = total - results.len(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Stage complete"
    );
    results
}
