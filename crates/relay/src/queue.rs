//! Unbounded FIFO of assembled posts.
//!
//! Denied items are re-inserted at the tail, so an item deferred for quiet
//! hours or rate limits may be overtaken by later arrivals.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct QueueItem {
    pub id: Uuid,
    /// Finished post, at most 280 characters.
    pub text: String,
    pub enqueued_at: DateTime<Utc>,
    /// Token and address fragment, for log lines.
    pub label: String,
    /// Times this item was deferred and re-enqueued.
    pub deferrals: u32,
}

impl QueueItem {
    pub fn new(text: impl Into<String>, label: impl Into<String>, enqueued_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            enqueued_at,
            label: label.into(),
            deferrals: 0,
        }
    }
}

#[derive(Default)]
pub struct PostQueue {
    items: Mutex<VecDeque<QueueItem>>,
    notify: Notify,
}

impl PostQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, item: QueueItem) {
        if let Ok(mut items) = self.items.lock() {
            items.push_back(item);
        }
        self.notify.notify_one();
    }

    /// Put a deferred item back at the tail.
    pub fn requeue(&self, mut item: QueueItem) {
        item.deferrals += 1;
        self.push(item);
    }

    pub fn try_pop(&self) -> Option<QueueItem> {
        self.items.lock().ok().and_then(|mut items| items.pop_front())
    }

    /// Wait for the next item.
    pub async fn pop(&self) -> QueueItem {
        loop {
            if let Some(item) = self.try_pop() {
                return item;
            }
            self.notify.notified().await;
        }
    }

    pub fn len(&self) -> usize {
        self.items.lock().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn item(text: &str) -> QueueItem {
        QueueItem::new(text, "$T", Utc::now())
    }

    #[test]
    fn fifo_order() {
        let queue = PostQueue::new();
        queue.push(item("a"));
        queue.push(item("b"));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.try_pop().unwrap().text, "a");
        assert_eq!(queue.try_pop().unwrap().text, "b");
        assert!(queue.try_pop().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn requeued_item_goes_behind_later_arrivals() {
        let queue = PostQueue::new();
        queue.push(item("first"));
        let deferred = queue.try_pop().unwrap();
        queue.push(item("second"));
        queue.requeue(deferred);

        assert_eq!(queue.try_pop().unwrap().text, "second");
        let back = queue.try_pop().unwrap();
        assert_eq!(back.text, "first");
        assert_eq!(back.deferrals, 1);
    }

    #[tokio::test]
    async fn pop_wakes_on_push() {
        let queue = Arc::new(PostQueue::new());
        let waiter = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.pop().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        queue.push(item("late"));
        assert_eq!(waiter.await.unwrap().text, "late");
    }
}
