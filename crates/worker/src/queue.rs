//! Unbounded FIFO of refresh requests.
//!
//! [`RefreshQueue`] is the cloneable producer half handed to request
//! handlers; [`QueueReceiver`] is owned by the single refresh worker.
//! Requests are not deduplicated here. The worker re-checks staleness
//! before every upstream call instead.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use playercache_core::types::PlayerId;
use tokio::sync::mpsc;

/// One queued refresh.
///
/// The requester fields are caller-supplied context for logs only. They are
/// never used for authorization or cache keying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshRequest {
    pub id: PlayerId,
    pub requester_name: Option<String>,
    pub requester_id: Option<String>,
}

impl RefreshRequest {
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            requester_name: None,
            requester_id: None,
        }
    }

    pub fn with_requester(mut self, name: impl Into<String>, id: impl Into<String>) -> Self {
        self.requester_name = Some(name.into());
        self.requester_id = Some(id.into());
        self
    }
}

/// Producer half of the refresh queue. Enqueueing never blocks.
#[derive(Debug, Clone)]
pub struct RefreshQueue {
    sender: mpsc::UnboundedSender<RefreshRequest>,
    depth: Arc<AtomicUsize>,
}

/// Consumer half, owned by the refresh worker.
#[derive(Debug)]
pub struct QueueReceiver {
    receiver: mpsc::UnboundedReceiver<RefreshRequest>,
    depth: Arc<AtomicUsize>,
}

impl RefreshQueue {
    /// Create a connected producer/consumer pair.
    pub fn channel() -> (RefreshQueue, QueueReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let depth = Arc::new(AtomicUsize::new(0));
        (
            RefreshQueue {
                sender,
                depth: Arc::clone(&depth),
            },
            QueueReceiver { receiver, depth },
        )
    }

    /// Append a request. Returns `false` once the worker has shut down.
    pub fn enqueue(&self, request: RefreshRequest) -> bool {
        // Count first so the consumer never sees the depth go negative.
        self.depth.fetch_add(1, Ordering::SeqCst);
        match self.sender.send(request) {
            Ok(()) => true,
            Err(mpsc::error::SendError(request)) => {
                self.depth.fetch_sub(1, Ordering::SeqCst);
                tracing::warn!(player_id = %request.id, "Refresh queue closed, request dropped");
                false
            }
        }
    }

    /// Requests waiting to be picked up by the worker.
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl QueueReceiver {
    /// Wait for the next request. `None` when every producer is gone.
    pub async fn recv(&mut self) -> Option<RefreshRequest> {
        let request = self.receiver.recv().await;
        if request.is_some() {
            self.depth.fetch_sub(1, Ordering::SeqCst);
        }
        request
    }

    /// Stop accepting requests and discard whatever is still queued.
    /// Returns how many requests were discarded.
    pub fn close_and_drain(&mut self) -> usize {
        self.receiver.close();
        let mut drained = 0;
        while let Ok(request) = self.receiver.try_recv() {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            tracing::debug!(player_id = %request.id, "Dropping queued refresh on shutdown");
            drained += 1;
        }
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> PlayerId {
        PlayerId::parse(&format!("00000000-0000-4000-8000-{n:012x}")).unwrap()
    }

    #[tokio::test]
    async fn fifo_with_duplicates() {
        let (queue, mut rx) = RefreshQueue::channel();
        assert!(queue.enqueue(RefreshRequest::new(id(1))));
        assert!(queue.enqueue(RefreshRequest::new(id(2))));
        assert!(queue.enqueue(RefreshRequest::new(id(1))));
        assert_eq!(queue.depth(), 3);

        assert_eq!(rx.recv().await.unwrap().id, id(1));
        assert_eq!(rx.recv().await.unwrap().id, id(2));
        assert_eq!(rx.recv().await.unwrap().id, id(1));
        assert_eq!(queue.depth(), 0);
    }

    #[tokio::test]
    async fn requester_context_is_carried() {
        let (queue, mut rx) = RefreshQueue::channel();
        queue.enqueue(RefreshRequest::new(id(7)).with_requester("Steve", "abc"));
        let request = rx.recv().await.unwrap();
        assert_eq!(request.requester_name.as_deref(), Some("Steve"));
        assert_eq!(request.requester_id.as_deref(), Some("abc"));
    }

    #[test]
    fn close_and_drain_rejects_new_requests() {
        let (queue, mut rx) = RefreshQueue::channel();
        queue.enqueue(RefreshRequest::new(id(1)));
        queue.enqueue(RefreshRequest::new(id(2)));

        assert_eq!(rx.close_and_drain(), 2);
        assert_eq!(queue.depth(), 0);
        assert!(!queue.enqueue(RefreshRequest::new(id(3))));
        assert_eq!(queue.depth(), 0);
    }
}
