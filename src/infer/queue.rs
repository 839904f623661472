//! Bounded drop-oldest submission queue
//!
//! The hand-off between a fast producer (the session loop) and a slow
//! worker (the model). When the queue is full, the oldest waiting item
//! is displaced to admit the new one, so the producer is never blocked
//! and memory stays bounded while the worker lags.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

/// Bounded queue that discards its oldest entry instead of blocking
pub struct SubmitQueue<T> {
    items: Mutex<VecDeque<T>>,
    notify: Notify,
    capacity: usize,
}

impl<T> SubmitQueue<T> {
    /// Create a queue with the given capacity (at least 1)
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            notify: Notify::new(),
            capacity: capacity.max(1),
        }
    }

    /// Enqueue an item, displacing the oldest if full
    ///
    /// Never blocks. Returns `true` when an older item was dropped to
    /// make room.
    pub fn push(&self, item: T) -> bool {
        let displaced = {
            let mut items = self.items.lock().unwrap();
            let displaced = if items.len() >= self.capacity {
                items.pop_front();
                true
            } else {
                false
            };
            items.push_back(item);
            displaced
        };

        self.notify.notify_one();
        displaced
    }

    /// Dequeue the oldest item, waiting up to `timeout`
    ///
    /// Returns `None` on timeout. The timeout is what makes the worker
    /// loop cancellable: it re-checks its run flag on every expiry.
    pub async fn recv_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;

        loop {
            // Register for wakeup before checking, so a push between the
            // check and the await is not lost
            let notified = self.notify.notified();

            if let Some(item) = self.try_pop() {
                return Some(item);
            }

            match tokio::time::timeout_at(deadline, notified).await {
                Ok(()) => continue,
                Err(_) => return self.try_pop(),
            }
        }
    }

    /// Dequeue the oldest item if one is waiting
    pub fn try_pop(&self) -> Option<T> {
        self.items.lock().unwrap().pop_front()
    }

    /// Number of items currently queued
    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.items.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_oldest_keeps_newest_two() {
        let queue = SubmitQueue::new(2);

        // Worker stalled; five submissions arrive
        assert!(!queue.push(1));
        assert!(!queue.push(2));
        assert!(queue.push(3));
        assert!(queue.push(4));
        assert!(queue.push(5));

        // Exactly the newest two remain, in order
        assert_eq!(queue.try_pop(), Some(4));
        assert_eq!(queue.try_pop(), Some(5));
        assert_eq!(queue.try_pop(), None);
    }

    #[tokio::test]
    async fn test_recv_times_out_when_empty() {
        let queue: SubmitQueue<u32> = SubmitQueue::new(2);

        let start = std::time::Instant::now();
        let got = queue.recv_timeout(Duration::from_millis(20)).await;

        assert_eq!(got, None);
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_recv_wakes_on_push() {
        use std::sync::Arc;

        let queue = Arc::new(SubmitQueue::new(2));
        let producer = Arc::clone(&queue);

        let consumer = tokio::spawn(async move {
            queue.recv_timeout(Duration::from_secs(5)).await
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        producer.push(42u32);

        let got = tokio::time::timeout(Duration::from_secs(1), consumer)
            .await
            .expect("consumer should wake promptly")
            .unwrap();
        assert_eq!(got, Some(42));
    }

    #[tokio::test]
    async fn test_push_before_recv_is_not_lost() {
        let queue = SubmitQueue::new(2);
        queue.push(7u32);

        let got = queue.recv_timeout(Duration::from_millis(5)).await;
        assert_eq!(got, Some(7));
    }

    #[test]
    fn test_capacity_floor_of_one() {
        let queue = SubmitQueue::new(0);
        queue.push(1u32);
        assert_eq!(queue.len(), 1);
        assert!(queue.push(2));
        assert_eq!(queue.try_pop(), Some(2));
    }
}
