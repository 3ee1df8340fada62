//! Durable snapshots of the codebook.
//!
//! The session hands the whole codebook to a [`SnapshotSink`] after every
//! mutation and before the mutating call returns. Implementations must write
//! the complete table or leave the previous snapshot untouched; a failed
//! save is returned to the caller, never retried here.

use std::cell::RefCell;

use anyhow::Result;

use crate::codebook::Codebook;

/// Destination for full-codebook snapshots.
pub trait SnapshotSink {
    /// Persist the entire codebook.
    fn save(&self, codebook: &Codebook) -> Result<()>;
}

/// Discards every snapshot. For sessions that are exported explicitly.
pub struct NoSnapshot;

impl SnapshotSink for NoSnapshot {
    fn save(&self, _codebook: &Codebook) -> Result<()> {
        Ok(())
    }
}

/// Keeps every snapshot in memory. Used by tests and embedders that
/// persist on their own schedule.
#[derive(Default)]
pub struct MemorySnapshot {
    saved: RefCell<Vec<Codebook>>,
}

impl MemorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of snapshots taken so far.
    pub fn count(&self) -> usize {
        self.saved.borrow().len()
    }

    /// The most recent snapshot.
    pub fn latest(&self) -> Option<Codebook> {
        self.saved.borrow().last().cloned()
    }
}

impl SnapshotSink for MemorySnapshot {
    fn save(&self, codebook: &Codebook) -> Result<()> {
        self.saved.borrow_mut().push(codebook.clone());
        Ok(())
    }
}

impl<T: SnapshotSink + ?Sized> SnapshotSink for std::rc::Rc<T> {
    fn save(&self, codebook: &Codebook) -> Result<()> {
        (**self).save(codebook)
    }
}
