//! Parallel fan-out of several calculations with an explicit join policy.

use std::future::Future;

use futures::future::{join_all, try_join_all};

use crate::types::ApiResult;

/// How a tool combines the outcomes of concurrent calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinPolicy {
    /// Wait for every call; the first failure fails the whole join.
    All,
    /// Wait for every call; keep the successes and drop the failures.
    AllSettled,
}

/// Run `calls` concurrently and combine them according to `policy`.
///
/// Output order follows input order. Under [`JoinPolicy::AllSettled`] the
/// result never fails; failed calls are simply absent.
pub async fn join_calls<I, F, T>(policy: JoinPolicy, calls: I) -> ApiResult<Vec<T>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = ApiResult<T>>,
{
    match policy {
        JoinPolicy::All => try_join_all(calls).await,
        JoinPolicy::AllSettled => {
            let settled = join_all(calls).await;
            let total = settled.len();
            let kept: Vec<T> = settled
                .into_iter()
                .filter_map(|outcome| match outcome {
                    Ok(value) => Some(value),
                    Err(e) => {
                        tracing::debug!("dropping failed call: {e}");
                        None
                    }
                })
                .collect();
            if kept.len() < total {
                tracing::debug!(kept = kept.len(), total, "settled join dropped failures");
            }
            Ok(kept)
        }
    }
}
