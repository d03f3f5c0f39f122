//! Cyclic sequential cursor over a backend store.

use crate::error::{DataError, Result};
use crate::store::{Record, SequentialStore};

/// Wraps a [`SequentialStore`] into an infinite, restartable record source.
///
/// `next` delivers records in the engine's native key order and wraps to the
/// first record after the last, so a dataset of N records yields
/// `0..N-1, 0, 1, …` with no duplicated and no skipped record at the wrap
/// boundary. End of data is never an error here; only native I/O faults
/// propagate.
pub struct SequentialCursor {
    store: Box<dyn SequentialStore>,
}

impl SequentialCursor {
    /// Positions a fresh cursor at the first record.
    ///
    /// # Errors
    ///
    /// Fails if the store holds no records: a training read source with
    /// nothing to deliver is a fatal setup error, not an empty sequence.
    pub fn new(mut store: Box<dyn SequentialStore>) -> Result<Self> {
        if !store.seek_first()? {
            let path = store.path().to_path_buf();
            return Err(DataError::store(path, "dataset contains no records"));
        }
        Ok(Self { store })
    }

    /// Consumes and discards `n` records before the first real read.
    ///
    /// Used to decorrelate parallel readers that open the same dataset; the
    /// skip wraps like any other advance, so any `n` is valid.
    pub fn init_skip(&mut self, n: u64) -> Result<()> {
        for _ in 0..n {
            if !self.store.advance()? {
                self.reseek()?;
            }
        }
        Ok(())
    }

    /// Reads the record under the cursor without advancing.
    pub fn current(&self) -> Result<Record> {
        self.store.read_current()
    }

    /// Returns the current record and moves forward, wrapping past the end.
    pub fn next(&mut self) -> Result<Record> {
        let record = self.store.read_current()?;
        if !self.store.advance()? {
            // Reached the end; the next call resumes from the first record.
            self.reseek()?;
        }
        Ok(record)
    }

    /// Releases the underlying store.
    pub fn close(self) -> Result<()> {
        self.store.close()
    }

    fn reseek(&mut self) -> Result<()> {
        tracing::debug!("restarting sequential read from first record");
        if !self.store.seek_first()? {
            let path = self.store.path().to_path_buf();
            return Err(DataError::store(path, "dataset became empty during read"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    /// In-memory stand-in for an engine store.
    struct MemStore {
        records: Vec<Record>,
        pos: Option<usize>,
        path: PathBuf,
    }

    impl MemStore {
        fn new(count: usize) -> Self {
            let records = (0..count)
                .map(|i| Record::new(format!("{i:08}").into_bytes(), vec![i as u8]))
                .collect();
            Self {
                records,
                pos: None,
                path: PathBuf::from("<mem>"),
            }
        }
    }

    impl SequentialStore for MemStore {
        fn seek_first(&mut self) -> Result<bool> {
            if self.records.is_empty() {
                self.pos = None;
                Ok(false)
            } else {
                self.pos = Some(0);
                Ok(true)
            }
        }

        fn read_current(&self) -> Result<Record> {
            self.pos
                .map(|i| self.records[i].clone())
                .ok_or_else(|| DataError::store(&self.path, "not positioned"))
        }

        fn advance(&mut self) -> Result<bool> {
            let pos = self
                .pos
                .ok_or_else(|| DataError::store(&self.path, "not positioned"))?;
            if pos + 1 < self.records.len() {
                self.pos = Some(pos + 1);
                Ok(true)
            } else {
                Ok(false)
            }
        }

        fn close(self: Box<Self>) -> Result<()> {
            Ok(())
        }

        fn path(&self) -> &Path {
            &self.path
        }
    }

    #[test]
    fn test_empty_store_is_fatal() {
        let result = SequentialCursor::new(Box::new(MemStore::new(0)));
        assert!(result.is_err());
    }

    #[test]
    fn test_wraparound_sequence_is_pinned() {
        let mut cursor = SequentialCursor::new(Box::new(MemStore::new(3))).unwrap();

        // Two full passes: each record exactly once per pass, the seam
        // neither duplicates nor skips a record.
        let keys: Vec<Vec<u8>> = (0..6).map(|_| cursor.next().unwrap().key).collect();
        let expected: Vec<Vec<u8>> = [0, 1, 2, 0, 1, 2]
            .iter()
            .map(|i| format!("{i:08}").into_bytes())
            .collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn test_init_skip_equivalence() {
        // skip(n) then next() delivers what n+1 plain next() calls would.
        for n in 0..7u64 {
            let mut skipped = SequentialCursor::new(Box::new(MemStore::new(4))).unwrap();
            skipped.init_skip(n).unwrap();
            let via_skip = skipped.next().unwrap();

            let mut plain = SequentialCursor::new(Box::new(MemStore::new(4))).unwrap();
            let mut via_next = plain.next().unwrap();
            for _ in 0..n {
                via_next = plain.next().unwrap();
            }
            assert_eq!(via_skip, via_next, "skip {n}");
        }
    }

    #[test]
    fn test_current_does_not_advance() {
        let mut cursor = SequentialCursor::new(Box::new(MemStore::new(2))).unwrap();
        assert_eq!(cursor.current().unwrap(), cursor.current().unwrap());
        assert_eq!(cursor.current().unwrap(), cursor.next().unwrap());
    }

    #[test]
    fn test_single_record_dataset_repeats() {
        let mut cursor = SequentialCursor::new(Box::new(MemStore::new(1))).unwrap();
        let first = cursor.next().unwrap();
        for _ in 0..3 {
            assert_eq!(cursor.next().unwrap(), first);
        }
    }
}
