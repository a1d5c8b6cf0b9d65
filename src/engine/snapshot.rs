use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::stream::Stream;

/*
Display Boundary
================

Oscilloscopes, meters, and spectrum views run on their own thread and must
only ever see fully-computed blocks. The server publishes an immutable copy
of the relevant streams after each tick through an atomically swapped Arc:
readers grab the latest snapshot without locks, writers never wait, and a
block mid-computation is unreachable by construction.

For sample-continuous consumers (a scrolling scope trace), the `rtrb`
feature adds ring-buffer taps: the audio path pushes each completed block
and simply drops samples when the consumer lags, so the tick never blocks
on a slow display.
*/

/// Immutable copy of one node's (or the output bus's) last completed block.
#[derive(Debug, Clone)]
pub struct BlockSnapshot {
    /// Absolute sample index of the block's first frame.
    pub start: u64,
    /// One Vec per stream, `block_size` samples each.
    pub streams: Vec<Vec<f32>>,
}

impl BlockSnapshot {
    pub(crate) fn empty() -> Self {
        Self {
            start: 0,
            streams: Vec::new(),
        }
    }

    pub(crate) fn capture(start: u64, bank: &[Stream]) -> Self {
        Self {
            start,
            streams: bank.iter().map(|s| s.samples().to_vec()).collect(),
        }
    }
}

/// Read side of a snapshot publication. Clone it onto any thread;
/// `latest()` never blocks and never observes a torn block.
#[derive(Clone)]
pub struct Monitor {
    shared: Arc<ArcSwap<BlockSnapshot>>,
}

impl Monitor {
    pub fn latest(&self) -> Arc<BlockSnapshot> {
        self.shared.load_full()
    }
}

/// Write side, held by the server.
pub(crate) struct Publisher {
    shared: Arc<ArcSwap<BlockSnapshot>>,
}

impl Publisher {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(ArcSwap::from_pointee(BlockSnapshot::empty())),
        }
    }

    pub fn monitor(&self) -> Monitor {
        Monitor {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Whether any [`Monitor`] is still alive. The server skips capture
    /// entirely when nobody is reading, keeping the tick path free of
    /// allocation while unobserved.
    pub fn has_readers(&self) -> bool {
        Arc::strong_count(&self.shared) > 1
    }

    pub fn publish(&self, start: u64, bank: &[Stream]) {
        self.shared.store(Arc::new(BlockSnapshot::capture(start, bank)));
    }
}

/// Ring-buffer tap feeding one stream of one node to a consumer thread.
#[cfg(feature = "rtrb")]
pub(crate) struct ScopeFeed {
    pub node: super::graph::NodeId,
    pub stream: usize,
    producer: rtrb::Producer<f32>,
}

#[cfg(feature = "rtrb")]
impl ScopeFeed {
    pub fn new(node: super::graph::NodeId, stream: usize, capacity: usize) -> (Self, rtrb::Consumer<f32>) {
        let (producer, consumer) = rtrb::RingBuffer::new(capacity);
        (
            Self {
                node,
                stream,
                producer,
            },
            consumer,
        )
    }

    /// Push a completed block, dropping what the consumer has no room for.
    pub fn push_block(&mut self, samples: &[f32]) {
        for &sample in samples {
            if self.producer.push(sample).is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monitor_sees_the_latest_published_block() {
        let publisher = Publisher::new();
        let monitor = publisher.monitor();
        assert!(monitor.latest().streams.is_empty());

        let mut bank = vec![Stream::new(4)];
        bank[0].samples_mut().copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        publisher.publish(128, &bank);

        let snap = monitor.latest();
        assert_eq!(snap.start, 128);
        assert_eq!(snap.streams, vec![vec![1.0, 2.0, 3.0, 4.0]]);
    }

    #[test]
    fn reader_tracking_follows_monitor_lifetimes() {
        let publisher = Publisher::new();
        assert!(!publisher.has_readers());

        let monitor = publisher.monitor();
        let clone = monitor.clone();
        assert!(publisher.has_readers());

        // A snapshot held by a reader is its own Arc and keeps nothing
        // registered once the monitors are gone.
        let held = monitor.latest();
        drop(monitor);
        drop(clone);
        assert!(!publisher.has_readers());
        assert_eq!(held.start, 0);
    }

    #[test]
    fn old_snapshots_stay_valid_after_a_new_publish() {
        let publisher = Publisher::new();
        let monitor = publisher.monitor();

        let bank = vec![Stream::new(2)];
        publisher.publish(0, &bank);
        let held = monitor.latest();

        publisher.publish(2, &bank);
        // The reader's copy is immutable; publishing again must not
        // disturb it.
        assert_eq!(held.start, 0);
        assert_eq!(monitor.latest().start, 2);
    }

    #[cfg(feature = "rtrb")]
    #[test]
    fn scope_feed_drops_when_full_without_blocking() {
        use super::super::graph::NodeId;

        let (mut feed, mut consumer) = ScopeFeed::new(NodeId::for_tests(0), 0, 4);
        feed.push_block(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let mut drained = Vec::new();
        while let Ok(sample) = consumer.pop() {
            drained.push(sample);
        }
        assert_eq!(drained, vec![1.0, 2.0, 3.0, 4.0]);
    }
}
