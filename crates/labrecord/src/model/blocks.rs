//! Repeatable experiment blocks.
//!
//! The store always holds at least one block. Removing the last remaining
//! block clears its fields instead. Block numbers shown to the user are
//! derived from position, so every structural change renumbers implicitly.

use std::fmt;

use tracing::trace;

use super::{ExperimentField, ExperimentRecord};
use crate::error::{Error, Result};

/// Stable identity of a block, independent of its visual position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(u64);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block-{}", self.0)
    }
}

/// What `remove` actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The block was deleted.
    Removed,
    /// The block was the last one and was cleared in place.
    Cleared,
}

/// Change notification passed to the store observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    /// A block was inserted.
    Added(BlockId),
    /// A block was deleted.
    Removed(BlockId),
    /// The only block was emptied.
    Cleared(BlockId),
    /// One field of a block changed.
    Edited(BlockId, ExperimentField),
    /// The whole sequence was replaced.
    Replaced,
}

type Observer = Box<dyn FnMut(&StoreChange) + Send>;

#[derive(Debug, Clone)]
struct Block {
    id: BlockId,
    record: ExperimentRecord,
}

/// Ordered collection of experiment blocks with a single change observer.
pub struct ExperimentBlockStore {
    blocks: Vec<Block>,
    next_id: u64,
    observer: Option<Observer>,
}

impl fmt::Debug for ExperimentBlockStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExperimentBlockStore")
            .field("blocks", &self.blocks)
            .field("next_id", &self.next_id)
            .field("has_observer", &self.observer.is_some())
            .finish()
    }
}

impl Default for ExperimentBlockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ExperimentBlockStore {
    /// Create a store holding one empty block.
    #[must_use]
    pub fn new() -> Self {
        let mut store = Self {
            blocks: Vec::new(),
            next_id: 0,
            observer: None,
        };
        let block = store.fresh_block();
        store.blocks.push(block);
        store
    }

    /// Register the change observer. A later registration replaces this one.
    pub fn on_change(&mut self, observer: impl FnMut(&StoreChange) + Send + 'static) {
        self.observer = Some(Box::new(observer));
    }

    /// Append an empty block at the end.
    pub fn push(&mut self) -> BlockId {
        let block = self.fresh_block();
        let id = block.id;
        self.blocks.push(block);
        self.notify(&StoreChange::Added(id));
        id
    }

    /// Insert an empty block directly after `after`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if `after` is not in the store.
    pub fn add_after(&mut self, after: BlockId) -> Result<BlockId> {
        let index = self.index_of(after)?;
        let block = self.fresh_block();
        let id = block.id;
        self.blocks.insert(index + 1, block);
        self.notify(&StoreChange::Added(id));
        Ok(id)
    }

    /// Delete a block, or clear it if it is the only one left.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if `id` is not in the store.
    pub fn remove(&mut self, id: BlockId) -> Result<RemoveOutcome> {
        let index = self.index_of(id)?;
        if self.blocks.len() > 1 {
            self.blocks.remove(index);
            self.notify(&StoreChange::Removed(id));
            Ok(RemoveOutcome::Removed)
        } else {
            self.blocks[index].record = ExperimentRecord::default();
            self.notify(&StoreChange::Cleared(id));
            Ok(RemoveOutcome::Cleared)
        }
    }

    /// Set one field of one block.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if `id` is not in the store.
    pub fn edit(
        &mut self,
        id: BlockId,
        field: ExperimentField,
        value: impl Into<String>,
    ) -> Result<()> {
        let index = self.index_of(id)?;
        self.blocks[index].record.set(field, value);
        self.notify(&StoreChange::Edited(id, field));
        Ok(())
    }

    /// Replace every block with `records`, keeping at least one block.
    pub fn replace_all(&mut self, records: Vec<ExperimentRecord>) {
        self.blocks.clear();
        for record in records {
            let mut block = self.fresh_block();
            block.record = record;
            self.blocks.push(block);
        }
        if self.blocks.is_empty() {
            let block = self.fresh_block();
            self.blocks.push(block);
        }
        self.notify(&StoreChange::Replaced);
    }

    /// Current records in visual order, every field trimmed.
    #[must_use]
    pub fn read(&self) -> Vec<ExperimentRecord> {
        self.blocks.iter().map(|b| b.record.trimmed()).collect()
    }

    /// Untrimmed record of one block.
    #[must_use]
    pub fn get(&self, id: BlockId) -> Option<&ExperimentRecord> {
        self.blocks.iter().find(|b| b.id == id).map(|b| &b.record)
    }

    /// Number of blocks (never zero).
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false; kept for API symmetry with collections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Block ids in visual order.
    #[must_use]
    pub fn ids(&self) -> Vec<BlockId> {
        self.blocks.iter().map(|b| b.id).collect()
    }

    /// 1-based visual number of a block.
    #[must_use]
    pub fn number_of(&self, id: BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| b.id == id).map(|i| i + 1)
    }

    /// Block at a 0-based position.
    #[must_use]
    pub fn id_at(&self, index: usize) -> Option<BlockId> {
        self.blocks.get(index).map(|b| b.id)
    }

    /// Badge text such as `"3 experiments"`.
    #[must_use]
    pub fn count_label(&self) -> String {
        match self.blocks.len() {
            1 => "1 experiment".to_string(),
            n => format!("{n} experiments"),
        }
    }

    fn fresh_block(&mut self) -> Block {
        let id = BlockId(self.next_id);
        self.next_id += 1;
        Block {
            id,
            record: ExperimentRecord::default(),
        }
    }

    fn index_of(&self, id: BlockId) -> Result<usize> {
        self.blocks
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| Error::internal(format!("{id} is not in the store")))
    }

    fn notify(&mut self, change: &StoreChange) {
        trace!(?change, blocks = self.blocks.len(), "Experiment blocks changed");
        if let Some(observer) = self.observer.as_mut() {
            observer(change);
        }
    }
}
