//! Reorder buffer that releases results in source order.

use std::collections::BTreeMap;
use std::fmt;

/// Buffers out-of-order results keyed by `source_index`.
#[derive(Debug)]
pub struct OrderedSequencer<T> {
    pending: BTreeMap<u64, T>,
    next_expected: u64,
}

/// Ordering violations detected by the sequencer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequencerError {
    /// An index arrived twice, or after it was already released.
    Duplicate(u64),
    /// Results were still buffered at shutdown because `next_expected` never arrived.
    Gap {
        /// Index the sequencer was waiting for.
        next_expected: u64,
        /// Number of results stuck behind it.
        buffered: usize,
    },
}

impl fmt::Display for SequencerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate(index) => write!(f, "result {index} delivered twice"),
            Self::Gap {
                next_expected,
                buffered,
            } => write!(
                f,
                "result {next_expected} never arrived ({buffered} result(s) left buffered)"
            ),
        }
    }
}

impl std::error::Error for SequencerError {}

impl<T> Default for OrderedSequencer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OrderedSequencer<T> {
    /// Creates a sequencer expecting index 0 first.
    pub fn new() -> Self {
        Self {
            pending: BTreeMap::new(),
            next_expected: 0,
        }
    }

    /// Buffers a completed result.
    pub fn insert(&mut self, index: u64, item: T) -> Result<(), SequencerError> {
        if index < self.next_expected || self.pending.contains_key(&index) {
            return Err(SequencerError::Duplicate(index));
        }
        self.pending.insert(index, item);
        Ok(())
    }

    /// Releases the next result if it has arrived.
    pub fn pop_ready(&mut self) -> Option<(u64, T)> {
        let item = self.pending.remove(&self.next_expected)?;
        let index = self.next_expected;
        self.next_expected += 1;
        Some((index, item))
    }

    /// Index the sequencer will release next.
    pub fn next_expected(&self) -> u64 {
        self.next_expected
    }

    /// Results waiting on an earlier index.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Consumes the sequencer, failing if anything is still buffered.
    pub fn finish(self) -> Result<(), SequencerError> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            Err(SequencerError::Gap {
                next_expected: self.next_expected,
                buffered: self.pending.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn drain(sequencer: &mut OrderedSequencer<&'static str>) -> Vec<(u64, &'static str)> {
        std::iter::from_fn(|| sequencer.pop_ready()).collect()
    }

    #[test]
    fn releases_in_ascending_order() {
        let mut sequencer = OrderedSequencer::new();
        sequencer.insert(2, "c").unwrap();
        sequencer.insert(1, "b").unwrap();
        assert!(drain(&mut sequencer).is_empty());
        assert_eq!(sequencer.pending(), 2);

        sequencer.insert(0, "a").unwrap();
        assert_eq!(drain(&mut sequencer), vec![(0, "a"), (1, "b"), (2, "c")]);
        assert_eq!(sequencer.next_expected(), 3);
        assert_eq!(sequencer.finish(), Ok(()));
    }

    #[test]
    fn rejects_duplicates() {
        let mut sequencer = OrderedSequencer::new();
        sequencer.insert(0, "a").unwrap();
        sequencer.insert(1, "b").unwrap();
        assert_eq!(sequencer.insert(1, "x"), Err(SequencerError::Duplicate(1)));

        drain(&mut sequencer);
        assert_eq!(sequencer.insert(0, "x"), Err(SequencerError::Duplicate(0)));
    }

    #[test]
    fn reports_gap_at_shutdown() {
        let mut sequencer = OrderedSequencer::new();
        sequencer.insert(1, "b").unwrap();
        sequencer.insert(3, "d").unwrap();
        let err = sequencer.finish().unwrap_err();
        assert_eq!(
            err,
            SequencerError::Gap {
                next_expected: 0,
                buffered: 2
            }
        );
        assert_eq!(
            err.to_string(),
            "result 0 never arrived (2 result(s) left buffered)"
        );
    }
}
