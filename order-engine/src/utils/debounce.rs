//! Search-term debouncing
//!
//! The filter pipeline itself is synchronous and pure; the timing contract
//! (>= 250 ms of quiescence before a search term reaches the pipeline)
//! belongs to the caller. [`Debouncer`] is the helper collaborators use to
//! honor it: every `call` supersedes the previous one, and only the last
//! call within the window fires.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Minimum quiescence window required by the search stage contract
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(250);

/// Trailing-edge debouncer backed by a generation counter
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Debouncer honoring the search contract window
    pub fn for_search() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }

    /// Schedule `f` to run after the quiescence window. A newer `call`
    /// before the window elapses cancels this one.
    pub fn call<F>(&self, f: F) -> JoinHandle<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let counter = self.generation.clone();
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if counter.load(Ordering::SeqCst) == generation {
                f();
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test(start_paused = true)]
    async fn test_single_call_fires() {
        let fired = Arc::new(AtomicUsize::new(0));
        let debouncer = Debouncer::new(Duration::from_millis(250));

        let counter = fired.clone();
        let handle = debouncer.call(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        handle.await.unwrap();

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_calls_collapse_to_last() {
        let fired = Arc::new(AtomicUsize::new(0));
        let debouncer = Debouncer::new(Duration::from_millis(250));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let counter = fired.clone();
            handles.push(debouncer.call(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Only the last call survives the window
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_calls_both_fire() {
        let fired = Arc::new(AtomicUsize::new(0));
        let debouncer = Debouncer::new(Duration::from_millis(250));

        let counter = fired.clone();
        let first = debouncer.call(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        first.await.unwrap();

        let counter = fired.clone();
        let second = debouncer.call(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        second.await.unwrap();

        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }
}
