use std::collections::BTreeMap;

use tracing::trace;

use crate::{metrics::METRICS, seq_nr::SeqNr};

/// Remembers which window was in effect when each outstanding datagram was sent.
///
/// Entries go away when acked. If the send loop never acks some datagrams (they
/// were lost), the oldest entries are evicted once `max_entries` is exceeded.
#[derive(Debug, Clone)]
pub struct SequenceWindowMap {
    windows: BTreeMap<SeqNr, u32>,
    max_entries: usize,
}

impl SequenceWindowMap {
    pub fn new(max_entries: usize) -> Self {
        Self {
            windows: BTreeMap::new(),
            max_entries,
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn insert(&mut self, seq: SeqNr, window: u32) {
        self.windows.insert(seq, window);
        while self.windows.len() > self.max_entries {
            if let Some((evicted, _)) = self.windows.pop_first() {
                trace!(?evicted, "evicting oldest tracked sequence number");
                METRICS.tracked_sequences_evicted.increment(1);
            }
        }
    }

    #[cfg(test)]
    pub fn get(&self, seq: SeqNr) -> Option<u32> {
        self.windows.get(&seq).copied()
    }

    /// Window the datagram was sent with, or None if it was never recorded,
    /// already acked, or evicted.
    pub fn take(&mut self, seq: SeqNr) -> Option<u32> {
        self.windows.remove(&seq)
    }
}

#[cfg(test)]
mod tests {
    use super::SequenceWindowMap;
    use crate::seq_nr::SeqNr;

    #[test]
    fn test_take_removes() {
        let mut m = SequenceWindowMap::new(16);
        m.insert(SeqNr(1), 10);
        m.insert(SeqNr(2), 11);
        assert_eq!(m.get(SeqNr(1)), Some(10));
        assert_eq!(m.take(SeqNr(1)), Some(10));
        assert_eq!(m.take(SeqNr(1)), None);
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn test_untracked() {
        let mut m = SequenceWindowMap::new(16);
        assert!(m.is_empty());
        assert_eq!(m.take(SeqNr(100)), None);
    }

    #[test]
    fn test_resend_overwrites() {
        let mut m = SequenceWindowMap::new(16);
        m.insert(SeqNr(1), 10);
        m.insert(SeqNr(1), 5);
        assert_eq!(m.take(SeqNr(1)), Some(5));
    }

    #[test]
    fn test_evicts_oldest() {
        let mut m = SequenceWindowMap::new(3);
        for seq in 0..5u64 {
            m.insert(SeqNr(seq), seq as u32);
        }
        assert_eq!(m.len(), 3);
        assert_eq!(m.get(SeqNr(0)), None);
        assert_eq!(m.get(SeqNr(1)), None);
        assert_eq!(m.get(SeqNr(2)), Some(2));
        assert_eq!(m.get(SeqNr(4)), Some(4));
    }
}
