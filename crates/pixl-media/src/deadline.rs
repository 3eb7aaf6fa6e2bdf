//! Deadline racing.
//!
//! Races a unit of work against a timer. If the timer fires first the work
//! is abandoned, not stopped: dropping the future cancels anything that
//! honors drop (including `kill_on_drop` children), but native work that
//! does not is allowed to run on. The caller owns cleanup of any resources
//! tied to the abandoned work.

use std::future::Future;
use std::time::Duration;

use crate::error::{MediaError, MediaResult};

/// Run `work` with a wall-clock budget.
///
/// Returns `MediaError::Timeout` if the budget elapses before the work
/// completes.
pub async fn run_with_deadline<T, F>(work: F, budget: Duration) -> MediaResult<T>
where
    F: Future<Output = MediaResult<T>>,
{
    match tokio::time::timeout(budget, work).await {
        Ok(result) => result,
        Err(_) => Err(MediaError::Timeout(budget.as_secs())),
    }
}
