//! Field id allocation.
//!
//! A background thread keeps a one-slot queue full of the next id and
//! refills it after every handoff. Consumers block on the queue, so every id
//! reaches exactly one caller, in increasing order, without any lock. One
//! allocator lives for the whole run and is passed by reference to every
//! extraction pass, so two passes in one run never reuse an id.

use async_channel::{Receiver, Sender};
use root2pb_common::{Result, Root2pbError};
use std::thread::{self, JoinHandle};
use tracing::trace;

/// Process-wide source of unique, increasing field ids starting at 1.
#[derive(Debug)]
pub struct IdAllocator {
    rx: Receiver<u32>,
    producer: Option<JoinHandle<()>>,
}

impl IdAllocator {
    /// Start the refill thread.
    pub fn start() -> Result<Self> {
        let (tx, rx) = async_channel::bounded(1);
        let producer = thread::Builder::new()
            .name("root2pb-ids".to_string())
            .spawn(move || refill(tx))?;

        Ok(Self {
            rx,
            producer: Some(producer),
        })
    }

    /// Take the next id, blocking until the refill thread has produced it.
    pub fn next_id(&self) -> Result<u32> {
        self.rx
            .recv_blocking()
            .map_err(|_| Root2pbError::config("field id space exhausted"))
    }
}

impl Drop for IdAllocator {
    fn drop(&mut self) {
        // Closing the queue wakes the producer blocked on a full slot.
        self.rx.close();
        if let Some(producer) = self.producer.take() {
            let _ = producer.join();
        }
    }
}

fn refill(tx: Sender<u32>) {
    let mut next: u32 = 1;
    while tx.send_blocking(next).is_ok() {
        trace!(id = next, "Handed off field id");
        // Protobuf field numbers stop at 2^29 - 1.
        if next == (1 << 29) - 1 {
            break;
        }
        next += 1;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    #[test]
    fn test_sequential_ids_have_no_gaps() {
        let ids = IdAllocator::start().unwrap();
        let got: Vec<u32> = (0..100).map(|_| ids.next_id().unwrap()).collect();
        let expected: Vec<u32> = (1..=100).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_concurrent_callers_get_each_id_once() {
        let ids = Arc::new(IdAllocator::start().unwrap());
        let workers: Vec<_> = (0..8)
            .map(|_| {
                let ids = Arc::clone(&ids);
                thread::spawn(move || {
                    let mut mine = Vec::new();
                    for _ in 0..250 {
                        mine.push(ids.next_id().unwrap());
                    }
                    mine
                })
            })
            .collect();

        let mut all = Vec::new();
        for worker in workers {
            let mine = worker.join().unwrap();
            // Each caller observes increasing ids.
            assert!(mine.windows(2).all(|w| w[0] < w[1]));
            all.extend(mine);
        }

        let unique: BTreeSet<u32> = all.iter().copied().collect();
        assert_eq!(all.len(), 2000);
        assert_eq!(unique, (1..=2000).collect::<BTreeSet<u32>>());
    }

    #[test]
    fn test_drop_stops_producer() {
        let ids = IdAllocator::start().unwrap();
        assert_eq!(ids.next_id().unwrap(), 1);
        drop(ids);
    }
}
