// src/crawl/queue.rs
// =============================================================================
// The frontier: the shared work queue the page workers pull from.
//
// How it works:
// 1. The seed is pushed as WorkItem { url, depth: 0 }
// 2. A worker calls `next()`, which pops an item and counts it as in flight
// 3. While processing, the worker pushes any follow-on items
// 4. Dropping the returned Dispatched marks the item finished
// 5. When nothing is pending and nothing is in flight, every waiting worker
//    gets None and the crawl is over
//
// The pending queue and the in-flight counter sit behind one lock, so "pop
// and count" and "finish and check for quiescence" are each a single step.
// Follow-on work is always pushed before the item that produced it finishes,
// so the counter can only reach zero once the crawl is really done.
// =============================================================================

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use url::Url;

/// A single unit of crawl work: a page and the depth it was found at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub url: Url,
    pub depth: usize,
}

#[derive(Debug, Default)]
struct State {
    pending: VecDeque<WorkItem>,
    in_flight: usize,
}

impl State {
    fn is_quiescent(&self) -> bool {
        self.pending.is_empty() && self.in_flight == 0
    }
}

/// FIFO work queue with quiescence detection
#[derive(Debug, Default)]
pub struct Frontier {
    state: Mutex<State>,
    changed: Notify,
}

/// An item handed to a worker. Dropping it marks the item finished.
#[derive(Debug)]
pub struct Dispatched<'a> {
    frontier: &'a Frontier,
    item: WorkItem,
}

impl Dispatched<'_> {
    pub fn item(&self) -> &WorkItem {
        &self.item
    }
}

impl Drop for Dispatched<'_> {
    fn drop(&mut self) {
        self.frontier.finish();
    }
}

enum Pop<'a> {
    Ready(Dispatched<'a>),
    Done,
    Wait,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking worker must not wedge the rest of the crawl,
    // so a poisoned lock is still used
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, item: WorkItem) {
        self.state().pending.push_back(item);
        self.changed.notify_waiters();
    }

    // Waits for the next item
    //
    // Returns None once the frontier is quiescent or `cancel` has fired.
    // Cancellation is checked before anything is popped, so a stopped crawl
    // leaves the remaining items pending instead of dispatching them.
    pub async fn next(&self, cancel: &CancellationToken) -> Option<Dispatched<'_>> {
        loop {
            if cancel.is_cancelled() {
                return None;
            }

            // Register interest before looking at the state so a push or
            // finish that happens in between still wakes us up
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.try_pop() {
                Pop::Ready(dispatched) => return Some(dispatched),
                Pop::Done => {
                    self.changed.notify_waiters();
                    return None;
                }
                Pop::Wait => {}
            }

            tokio::select! {
                _ = &mut notified => {}
                _ = cancel.cancelled() => return None,
            }
        }
    }

    fn try_pop(&self) -> Pop<'_> {
        let mut state = self.state();
        match state.pending.pop_front() {
            Some(item) => {
                state.in_flight += 1;
                Pop::Ready(Dispatched {
                    frontier: self,
                    item,
                })
            }
            None if state.in_flight == 0 => Pop::Done,
            None => Pop::Wait,
        }
    }

    fn finish(&self) {
        let quiescent = {
            let mut state = self.state();
            state.in_flight = state.in_flight.saturating_sub(1);
            state.is_quiescent()
        };
        if quiescent {
            self.changed.notify_waiters();
        }
    }

    pub fn pending_len(&self) -> usize {
        self.state().pending.len()
    }

    pub fn in_flight(&self) -> usize {
        self.state().in_flight
    }

    pub fn is_quiescent(&self) -> bool {
        self.state().is_quiescent()
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why not just check `queue.is_empty()` to know we're done?
//    - With several workers, the queue can be empty while another worker is
//      still fetching a page that will add ten more links
//    - So we also count items "in flight" and only stop when both are zero
//
// 2. What is Notify?
//    - A tokio primitive for "wake up whoever is waiting"
//    - notified() creates a future; enable() registers it right away so a
//      wake-up that happens before we start awaiting is not lost
//
// 3. Why does Dispatched implement Drop?
//    - Drop runs when the value goes out of scope, even on early return or
//      panic, so the in-flight counter can never be left too high
//
// 4. Why std::sync::Mutex inside async code?
//    - The lock is held for a few instructions and never across an .await
//    - That is cheaper than tokio::sync::Mutex and perfectly safe here
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn item(path: &str, depth: usize) -> WorkItem {
        WorkItem {
            url: Url::parse("https://example.com").unwrap().join(path).unwrap(),
            depth,
        }
    }

    #[tokio::test]
    async fn test_empty_frontier_is_done() {
        let frontier = Frontier::new();
        assert!(frontier.next(&CancellationToken::new()).await.is_none());
    }

    #[tokio::test]
    async fn test_dispatch_counts_in_flight() {
        let frontier = Frontier::new();
        let cancel = CancellationToken::new();
        frontier.push(item("/a", 0));

        let dispatched = frontier.next(&cancel).await.unwrap();
        assert_eq!(dispatched.item(), &item("/a", 0));
        assert_eq!(frontier.in_flight(), 1);
        assert!(!frontier.is_quiescent());

        drop(dispatched);
        assert_eq!(frontier.in_flight(), 0);
        assert!(frontier.is_quiescent());
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let frontier = Frontier::new();
        let cancel = CancellationToken::new();
        frontier.push(item("/a", 1));
        frontier.push(item("/b", 1));

        let first = frontier.next(&cancel).await.unwrap();
        assert_eq!(first.item().url.path(), "/a");
        let second = frontier.next(&cancel).await.unwrap();
        assert_eq!(second.item().url.path(), "/b");
    }

    #[tokio::test]
    async fn test_waiting_worker_gets_follow_on_work() {
        let frontier = Arc::new(Frontier::new());
        let cancel = CancellationToken::new();
        frontier.push(item("/seed", 0));

        let seed = frontier.next(&cancel).await.unwrap();

        // Queue is empty but the seed is in flight, so this worker must wait
        let waiter = {
            let frontier = frontier.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                frontier
                    .next(&cancel)
                    .await
                    .map(|dispatched| dispatched.item().clone())
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        frontier.push(item("/child", 1));
        drop(seed);

        assert_eq!(waiter.await.unwrap(), Some(item("/child", 1)));
    }

    #[tokio::test]
    async fn test_waiting_worker_released_on_quiescence() {
        let frontier = Arc::new(Frontier::new());
        let cancel = CancellationToken::new();
        frontier.push(item("/seed", 0));

        let seed = frontier.next(&cancel).await.unwrap();

        let waiter = {
            let frontier = frontier.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { frontier.next(&cancel).await.is_none() })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(seed);

        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn test_cancel_stops_dispatch() {
        let frontier = Frontier::new();
        let cancel = CancellationToken::new();
        frontier.push(item("/a", 0));
        cancel.cancel();

        assert!(frontier.next(&cancel).await.is_none());
        assert_eq!(frontier.pending_len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_wakes_waiting_worker() {
        let frontier = Arc::new(Frontier::new());
        let cancel = CancellationToken::new();
        frontier.push(item("/seed", 0));
        let _seed = frontier.next(&cancel).await.unwrap();

        let waiter = {
            let frontier = frontier.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { frontier.next(&cancel).await.is_none() })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        assert!(waiter.await.unwrap());
    }
}
