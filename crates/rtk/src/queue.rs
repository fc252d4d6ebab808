//! Bounded event queue shared between tasks.
//!
//! The queue stores at most `N` items in FIFO order. Sending never blocks:
//! a full queue hands the item back to the producer. Receiving blocks up to
//! a caller-chosen timeout. The queue is split into a cloneable [`Sender`]
//! and a single [`Receiver`], so there is exactly one consumer.

use core::fmt;
use core::time::Duration;
use std::sync::Arc;
use std::time::Instant;

use heapless::Deque;
use parking_lot::{Condvar, Mutex};
use thiserror::Error;

struct EventQueue<T, const N: usize> {
    slots: Mutex<Deque<T, N>>,
    ready: Condvar,
}

/// Create a queue holding at most `N` items.
pub fn channel<T, const N: usize>() -> (Sender<T, N>, Receiver<T, N>) {
    let queue = Arc::new(EventQueue {
        slots: Mutex::new(Deque::new()),
        ready: Condvar::new(),
    });
    (
        Sender {
            queue: Arc::clone(&queue),
        },
        Receiver { queue },
    )
}

/// The queue was full; the rejected item is returned unchanged.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TrySendError<T>(pub T);

impl<T> TrySendError<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for TrySendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TrySendError(..)")
    }
}

impl<T> fmt::Display for TrySendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event queue is full")
    }
}

impl<T> std::error::Error for TrySendError<T> {}

/// Errors reported by [`Receiver::recv_timeout`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RecvError {
    #[error("no event received within {0:?}")]
    Timeout(Duration),
}

/// Producer handle.
pub struct Sender<T, const N: usize> {
    queue: Arc<EventQueue<T, N>>,
}

impl<T, const N: usize> Sender<T, N> {
    /// Post an item to the back of the queue without blocking.
    pub fn try_send(&self, item: T) -> Result<(), TrySendError<T>> {
        let mut slots = self.queue.slots.lock();
        slots.push_back(item).map_err(TrySendError)?;
        drop(slots);
        self.queue.ready.notify_one();
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.queue.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.slots.lock().is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.queue.slots.lock().is_full()
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<T, const N: usize> Clone for Sender<T, N> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
        }
    }
}

/// Consumer handle.
pub struct Receiver<T, const N: usize> {
    queue: Arc<EventQueue<T, N>>,
}

impl<T, const N: usize> Receiver<T, N> {
    /// Take the next item without blocking.
    pub fn try_recv(&self) -> Option<T> {
        self.queue.slots.lock().pop_front()
    }

    /// Take the next item, waiting at most `timeout` for one to arrive.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvError> {
        let deadline = Instant::now() + timeout;
        let mut slots = self.queue.slots.lock();
        loop {
            if let Some(item) = slots.pop_front() {
                return Ok(item);
            }
            if self.queue.ready.wait_until(&mut slots, deadline).timed_out() {
                return slots.pop_front().ok_or(RecvError::Timeout(timeout));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.queue.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.slots.lock().is_empty()
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn queue_is_fifo() {
        let (tx, rx) = channel::<u16, 4>();

        tx.try_send(10).unwrap();
        tx.try_send(20).unwrap();
        tx.try_send(30).unwrap();
        assert_eq!(tx.len(), 3);

        assert_eq!(rx.try_recv(), Some(10));
        assert_eq!(rx.try_recv(), Some(20));
        assert_eq!(rx.try_recv(), Some(30));
        assert_eq!(rx.try_recv(), None);
        assert!(rx.is_empty());
    }

    #[test]
    fn single_slot_rejects_second_send() {
        let (tx, rx) = channel::<&str, 1>();

        assert!(tx.try_send("first").is_ok());
        assert!(tx.is_full());

        let err = tx.try_send("second").unwrap_err();
        assert_eq!(err.to_string(), "event queue is full");
        assert_eq!(err.into_inner(), "second");

        // The first item is delivered untouched.
        assert_eq!(rx.try_recv(), Some("first"));
        assert!(tx.try_send("third").is_ok());
        assert_eq!(rx.try_recv(), Some("third"));
    }

    #[test]
    fn recv_times_out_on_empty_queue() {
        let (_tx, rx) = channel::<u8, 1>();
        let started = Instant::now();

        let result = rx.recv_timeout(Duration::from_millis(15));

        assert_eq!(result, Err(RecvError::Timeout(Duration::from_millis(15))));
        assert!(started.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn recv_wakes_on_send_from_other_task() {
        let (tx, rx) = channel::<u32, 1>();

        let producer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            tx.try_send(7).unwrap();
        });

        assert_eq!(rx.recv_timeout(Duration::from_secs(2)), Ok(7));
        producer.join().unwrap();
    }

    #[test]
    fn capacity_matches_const_parameter() {
        let (tx, rx) = channel::<(), 3>();
        assert_eq!(tx.capacity(), 3);
        assert_eq!(rx.capacity(), 3);
    }
}
