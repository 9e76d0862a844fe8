//! Bounded fan-out shared by the collecting, fetching and judging phases.

use std::future::Future;

use futures::stream::{self, StreamExt};

/// Run `f` over `items` with at most `limit` futures in flight.
///
/// Results come back in the order of `items`, regardless of completion
/// order. A `limit` of zero is treated as one.
pub async fn run_bounded<T, R, F, Fut>(items: Vec<T>, limit: usize, mut f: F) -> Vec<R>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = R>,
{
    let mut indexed: Vec<(usize, R)> = stream::iter(items.into_iter().enumerate())
        .map(|(index, item)| {
            let fut = f(item);
            async move { (index, fut.await) }
        })
        .buffer_unordered(limit.max(1))
        .collect()
        .await;
    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, result)| result).collect()
}
