//! Concurrent fan-out of fetchers
//!
//! One blocking task per job, no concurrency cap. The scheduler returns once
//! every task has returned; outcomes come back in declared order.

use std::sync::Arc;

use tokio::task;

use super::{FetchContext, FetchJob, SourceOutcome};
use crate::event::EventSender;

/// Run every job concurrently and join them all
pub async fn run(
    jobs: Vec<FetchJob>,
    ctx: Arc<FetchContext>,
    events: EventSender,
) -> Vec<SourceOutcome> {
    let handles: Vec<_> = jobs
        .into_iter()
        .map(|job| {
            let ctx = Arc::clone(&ctx);
            let events = events.clone();
            let fallback = job.clone();
            let handle = task::spawn_blocking(move || super::run(job, &ctx, &events));
            (fallback, handle)
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for (job, handle) in handles {
        match handle.await {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                log::debug!("Fetcher for {} did not finish: {}", job.source, e);
                let mut outcome = SourceOutcome::new(job);
                outcome.abort(format!("fetcher did not finish: {e}"), &events);
                outcomes.push(outcome);
            }
        }
    }
    outcomes
}
